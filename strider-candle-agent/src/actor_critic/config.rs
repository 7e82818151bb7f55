//! Configurations of actor-critic learners.
use crate::{Device, ModelConfig};
use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`ActorCriticLearner`](super::ActorCriticLearner).
///
/// `U` configures the policy update.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct ActorCriticConfig<U> {
    /// Policy model, with a softmax output over the actions.
    pub policy: Option<ModelConfig>,

    /// State-value model, with a single output.
    pub value: Option<ModelConfig>,

    /// Discount factor.
    pub gamma: f32,

    /// GAE parameter.
    pub lambda: f32,

    /// Device.
    pub device: Device,

    /// Policy update.
    pub update: U,
}

impl<U: Default> Default for ActorCriticConfig<U> {
    fn default() -> Self {
        Self {
            policy: None,
            value: None,
            gamma: 0.99,
            lambda: 0.95,
            device: Device::Cpu,
            update: U::default(),
        }
    }
}

impl<U> ActorCriticConfig<U>
where
    U: Serialize + DeserializeOwned,
{
    /// Sets the policy model.
    pub fn policy(mut self, v: ModelConfig) -> Self {
        self.policy = Some(v);
        self
    }

    /// Sets the state-value model.
    pub fn value(mut self, v: ModelConfig) -> Self {
        self.value = Some(v);
        self
    }

    /// Sets the discount factor.
    pub fn gamma(mut self, v: f32) -> Self {
        self.gamma = v;
        self
    }

    /// Sets the GAE parameter.
    pub fn lambda(mut self, v: f32) -> Self {
        self.lambda = v;
        self
    }

    /// Sets the device.
    pub fn device(mut self, v: Device) -> Self {
        self.device = v;
        self
    }

    /// Sets the policy update.
    pub fn update(mut self, v: U) -> Self {
        self.update = v;
        self
    }

    pub(super) fn models(&self) -> Result<(ModelConfig, ModelConfig)> {
        Ok((
            self.policy.clone().context("policy is not set")?.check_policy()?,
            self.value.clone().context("value is not set")?,
        ))
    }

    /// Loads [`ActorCriticConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`ActorCriticConfig`] as YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

/// Configuration of [`Vanilla`](super::Vanilla).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone, Default)]
pub struct VanillaConfig {}

/// Configuration of [`ClippedSurrogate`](super::ClippedSurrogate).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct ClipConfig {
    /// Clipping epsilon of the importance ratio.
    pub epsilon: f32,

    /// Optimizer steps per learning iteration.
    pub n_updates: usize,
}

impl Default for ClipConfig {
    fn default() -> Self {
        Self {
            epsilon: 0.2,
            n_updates: 4,
        }
    }
}

impl ClipConfig {
    /// Sets the clipping epsilon.
    pub fn epsilon(mut self, v: f32) -> Self {
        self.epsilon = v;
        self
    }

    /// Sets the optimizer steps per learning iteration.
    pub fn n_updates(mut self, v: usize) -> Self {
        self.n_updates = v;
        self
    }
}

/// Configuration of [`AdaptiveKlPenalty`](super::AdaptiveKlPenalty).
///
/// The target divergence has no default and must be set.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct KlPenaltyConfig {
    /// Target of the mean KL divergence per learning iteration.
    pub d_target: Option<f32>,

    /// Initial penalty coefficient.
    pub beta: f32,

    /// Lower bound of the penalty coefficient.
    pub beta_min: f32,

    /// Upper bound of the penalty coefficient.
    pub beta_max: f32,

    /// Optimizer steps per learning iteration.
    pub n_updates: usize,
}

impl Default for KlPenaltyConfig {
    fn default() -> Self {
        Self {
            d_target: None,
            beta: 1.0,
            beta_min: 1e-25,
            beta_max: 0.1,
            n_updates: 4,
        }
    }
}

impl KlPenaltyConfig {
    /// Sets the target divergence.
    pub fn d_target(mut self, v: f32) -> Self {
        self.d_target = Some(v);
        self
    }

    /// Sets the initial penalty coefficient.
    pub fn beta(mut self, v: f32) -> Self {
        self.beta = v;
        self
    }

    /// Sets the bounds of the penalty coefficient.
    pub fn beta_bounds(mut self, min: f32, max: f32) -> Self {
        self.beta_min = min;
        self.beta_max = max;
        self
    }

    /// Sets the optimizer steps per learning iteration.
    pub fn n_updates(mut self, v: usize) -> Self {
        self.n_updates = v;
        self
    }
}
