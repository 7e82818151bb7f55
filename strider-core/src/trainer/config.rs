//! Configuration of [`Trainer`](super::Trainer).
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Amount of experience each rollout worker collects per iteration.
#[derive(Debug, Deserialize, Serialize, PartialEq, Eq, Clone, Copy)]
pub enum RolloutConfig {
    /// Play this many complete episodes.
    Episodes(usize),

    /// Take this many steps regardless of episode boundaries.
    Steps(usize),
}

/// Configuration of [`Trainer`](super::Trainer).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct TrainerConfig {
    /// The number of learning iterations.
    pub max_iterations: usize,

    /// The number of rollout workers.
    pub n_workers: usize,

    /// Experience collected by each worker per iteration.
    pub rollout: RolloutConfig,

    /// Interval of evaluation in iterations.
    pub eval_interval: usize,

    /// The number of episodes per evaluation.
    pub eval_episodes: usize,

    /// Interval of flushing records in iterations.
    pub record_interval: usize,

    /// Where to save the trained model.
    pub model_dir: Option<String>,

    /// The model is also saved whenever the evaluation return exceeds this.
    pub save_threshold: Option<f32>,

    /// Base seed of the environments and the workers.
    pub seed: i64,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            max_iterations: 0,
            n_workers: 1,
            rollout: RolloutConfig::Episodes(1),
            eval_interval: usize::MAX,
            eval_episodes: 10,
            record_interval: 1,
            model_dir: None,
            save_threshold: None,
            seed: 42,
        }
    }
}

impl TrainerConfig {
    /// Sets the number of learning iterations.
    pub fn max_iterations(mut self, v: usize) -> Self {
        self.max_iterations = v;
        self
    }

    /// Sets the number of rollout workers.
    pub fn n_workers(mut self, v: usize) -> Self {
        self.n_workers = v;
        self
    }

    /// Sets the experience collected by each worker per iteration.
    pub fn rollout(mut self, v: RolloutConfig) -> Self {
        self.rollout = v;
        self
    }

    /// Sets the interval of evaluation in iterations.
    pub fn eval_interval(mut self, v: usize) -> Self {
        self.eval_interval = v;
        self
    }

    /// Sets the number of episodes per evaluation.
    pub fn eval_episodes(mut self, v: usize) -> Self {
        self.eval_episodes = v;
        self
    }

    /// Sets the interval of flushing records in iterations.
    pub fn record_interval(mut self, v: usize) -> Self {
        self.record_interval = v;
        self
    }

    /// Sets the directory where the model is saved.
    pub fn model_dir(mut self, v: impl Into<String>) -> Self {
        self.model_dir = Some(v.into());
        self
    }

    /// Sets the evaluation return above which the model is saved.
    pub fn save_threshold(mut self, v: f32) -> Self {
        self.save_threshold = Some(v);
        self
    }

    /// Sets the base seed.
    pub fn seed(mut self, v: i64) -> Self {
        self.seed = v;
        self
    }

    /// Constructs [`TrainerConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`TrainerConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_serde_trainer_config() -> Result<()> {
        let config = TrainerConfig::default()
            .max_iterations(100)
            .n_workers(4)
            .rollout(RolloutConfig::Steps(64))
            .eval_interval(10)
            .model_dir("some/directory")
            .save_threshold(26.5);

        let dir = TempDir::new("trainer_config")?;
        let path = dir.path().join("trainer_config.yaml");
        config.save(&path)?;
        let config_ = TrainerConfig::load(&path)?;
        assert_eq!(config, config_);
        Ok(())
    }
}
