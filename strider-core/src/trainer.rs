//! Train a [`Learner`].
mod config;
use crate::{
    agent::Agent,
    base::{Env, Objective, Policy},
    error::StriderError,
    evaluator::{DefaultEvaluator, Evaluator},
    learner::Learner,
    record::{
        Record,
        RecordValue::{DateTime, Scalar},
        Recorder,
    },
    replay_buffer::ReplayBuffer,
};
use anyhow::Result;
use chrono::Local;
pub use config::{RolloutConfig, TrainerConfig};
use log::{info, warn};
use std::{path::Path, time::SystemTime};

#[cfg_attr(doc, aquamarine::aquamarine)]
/// Manages the training loop.
///
/// # Training loop
///
/// Each iteration runs two phases separated by a barrier:
///
/// 1. Rollout: every worker, one thread per [`Agent`], steps its own
///    environment with the shared policy and appends transitions to the
///    shared [`ReplayBuffer`], either for a number of episodes or a number of
///    steps ([`RolloutConfig`]). All workers are joined before going on.
/// 2. Learning, on the calling thread:
///     1. Rollout statistics are stored to the recorder.
///     2. [`Learner::step`] updates the models from a snapshot of the buffer.
///     3. [`ReplayBuffer::forget`] drops frozen trajectories and compacts open
///        ones.
///     4. Every `eval_interval` iterations the evaluation policy is run by a
///        [`DefaultEvaluator`]. If the return is the best so far the
///        parameters are saved in `(model_dir)/best`; if it exceeds
///        `save_threshold` they are also saved in `(model_dir)/(iteration)`.
///     5. Every `record_interval` iterations the stored records are flushed.
///
/// ```mermaid
/// graph LR
///     P[Policy] -->|Act| A[Agent x N]
///     A -->|Transition| B[ReplayBuffer]
///     B -->|Snapshot| L[Learner]
///     L -->|parameters| P
/// ```
///
/// The policy and the learner share model parameters. Parameters only change
/// in the learning phase, while no worker is running.
pub struct Trainer<E: Env, J> {
    config: TrainerConfig,
    agents: Vec<Agent<E, J>>,
    evaluator: DefaultEvaluator<E, J>,
    buffer: ReplayBuffer<E::Obs, E::Act>,
}

impl<E, J> Trainer<E, J>
where
    E: Env,
    J: Objective<E::Obs> + Clone,
{
    /// Constructs a trainer, building one environment per worker.
    ///
    /// Worker `i` uses seed `config.seed + i`; the evaluator uses
    /// `config.seed + n_workers`.
    pub fn build(config: TrainerConfig, env_config: &E::Config, objective: J) -> Result<Self> {
        let agents = (0..config.n_workers)
            .map(|id| -> Result<Agent<E, J>> {
                let seed = config.seed + id as i64;
                let env = E::build(env_config, seed)?;
                Ok(Agent::new(id, env, objective.clone(), seed as u64))
            })
            .collect::<Result<Vec<_>>>()?;
        let eval_seed = config.seed + config.n_workers as i64;
        let evaluator =
            DefaultEvaluator::new(env_config, objective, eval_seed, config.eval_episodes)?;

        Ok(Self {
            config,
            agents,
            evaluator,
            buffer: ReplayBuffer::new(),
        })
    }

    /// The shared replay buffer.
    pub fn buffer(&self) -> &ReplayBuffer<E::Obs, E::Act> {
        &self.buffer
    }

    /// Runs every worker in parallel and waits for all of them.
    ///
    /// Returns the number of episodes that ended.
    pub fn rollout<P>(&mut self, policy: &P) -> Result<usize>
    where
        P: Policy<E> + ?Sized,
    {
        let rollout = self.config.rollout;
        let buffer = &self.buffer;

        let results = std::thread::scope(|s| {
            let handles = self
                .agents
                .iter_mut()
                .map(|agent| {
                    s.spawn(move || -> Result<usize> {
                        match rollout {
                            RolloutConfig::Episodes(n) => {
                                for _ in 0..n {
                                    agent.play_one_episode(policy, buffer)?;
                                }
                                Ok(n)
                            }
                            RolloutConfig::Steps(n) => agent.play_steps(n, policy, buffer),
                        }
                    })
                })
                .collect::<Vec<_>>();

            handles
                .into_iter()
                .enumerate()
                .map(|(id, h)| match h.join() {
                    Ok(result) => result,
                    Err(_) => Err(StriderError::WorkerPanicked(id).into()),
                })
                .collect::<Vec<_>>()
        });

        results.into_iter().sum()
    }

    /// Statistics of the experience collected in the last rollout.
    fn rollout_record(&mut self, n_episodes: usize) -> Result<Record> {
        let n_transitions = self.buffer.num_transitions();
        let snapshots = self.buffer.sample_snapshot()?;
        let returns = snapshots
            .iter()
            .filter(|s| s.frozen())
            .map(|s| s.total_reward())
            .collect::<Vec<_>>();

        let mut record = Record::empty();
        record.insert("n_transitions", Scalar(n_transitions as f32));
        record.insert("n_episodes", Scalar(n_episodes as f32));
        if !returns.is_empty() {
            let mean = returns.iter().sum::<f32>() / returns.len() as f32;
            record.insert("rollout_return", Scalar(mean));
        }
        Ok(record)
    }

    fn save_params<L: Learner<E>>(learner: &L, path: &Path) {
        match learner.save_params(path) {
            Ok(()) => info!("Saved the model in {:?}", path),
            Err(e) => warn!("Failed to save the model in {:?}: {}", path, e),
        }
    }

    /// Trains the learner.
    ///
    /// `policy` collects experience, `eval_policy` is evaluated. Both are
    /// expected to read the models updated by `learner`.
    pub fn train<L, P, Q>(
        &mut self,
        learner: &mut L,
        policy: &P,
        eval_policy: &Q,
        recorder: &mut dyn Recorder,
    ) -> Result<()>
    where
        L: Learner<E>,
        P: Policy<E> + ?Sized,
        Q: Policy<E> + ?Sized,
    {
        let mut max_eval_return = f32::MIN;
        let model_dir = self.config.model_dir.clone();

        for iteration in 1..=self.config.max_iterations {
            let timer = SystemTime::now();
            let n_episodes = self.rollout(policy)?;
            let mut record = self.rollout_record(n_episodes)?;

            record.merge_inplace(learner.step(&mut self.buffer)?);
            self.buffer.forget()?;
            record.insert("iteration_secs", Scalar(timer.elapsed()?.as_secs_f32()));
            record.insert("datetime", DateTime(Local::now()));

            if self.config.eval_interval > 0 && iteration % self.config.eval_interval == 0 {
                info!("Starts evaluation at iteration {}", iteration);
                let eval = self.evaluator.evaluate(eval_policy)?;
                let eval_return = eval.get_scalar("episode_return")?;
                record.insert("eval_return", Scalar(eval_return));

                if let Some(dir) = &model_dir {
                    if eval_return > max_eval_return {
                        max_eval_return = eval_return;
                        Self::save_params(learner, &Path::new(dir).join("best"));
                    }
                    if matches!(self.config.save_threshold, Some(th) if eval_return > th) {
                        Self::save_params(learner, &Path::new(dir).join(iteration.to_string()));
                    }
                }
            }

            recorder.store(record);
            if self.config.record_interval > 0 && iteration % self.config.record_interval == 0 {
                recorder.flush(iteration as i64);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dummy::{Countdown, UnitReward},
        record::{BufferedRecorder, RecordValue},
        RandomPolicy,
    };
    use tempdir::TempDir;
    use test_log::test;

    /// Counts the transitions it was given.
    #[derive(Default)]
    struct Counting {
        seen: Vec<usize>,
        saved: usize,
    }

    impl Learner<Countdown> for Counting {
        fn learn(
            &mut self,
            buffer: &mut ReplayBuffer<crate::dummy::CountdownObs, crate::DiscreteAction>,
        ) -> Result<Record> {
            let n = buffer.sample_snapshot()?.iter().map(|s| s.len()).sum();
            self.seen.push(n);
            Ok(Record::from_scalar("loss", 0.0))
        }

        fn save_params(&self, path: &Path) -> Result<()> {
            std::fs::create_dir_all(path)?;
            Ok(())
        }

        fn load_params(&mut self, _path: &Path) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_train_episodes() -> Result<()> {
        let dir = TempDir::new("trainer")?;
        let config = TrainerConfig::default()
            .max_iterations(3)
            .n_workers(4)
            .rollout(RolloutConfig::Episodes(2))
            .eval_interval(1)
            .eval_episodes(2)
            .model_dir(dir.path().to_string_lossy())
            .save_threshold(0.0);
        let mut trainer = Trainer::<Countdown, _>::build(config, &3, UnitReward)?;
        let mut learner = Counting::default();
        let policy = RandomPolicy::new(1);
        let mut recorder = BufferedRecorder::new();

        trainer.train(&mut learner, &policy, &policy, &mut recorder)?;

        // 4 workers x 2 episodes x 3 steps, forgotten after every iteration.
        assert_eq!(learner.seen, vec![24, 24, 24]);
        assert!(trainer.buffer().is_empty());
        assert_eq!(recorder.len(), 3);
        let record = recorder.iter().next().unwrap();
        assert_eq!(record.get_scalar("n_episodes")?, 8.0);
        assert_eq!(record.get_scalar("rollout_return")?, 3.0);
        assert_eq!(record.get_scalar("eval_return")?, 3.0);
        assert!(matches!(record.get("datetime"), Some(RecordValue::DateTime(_))));
        assert!(dir.path().join("best").is_dir());
        assert!(dir.path().join("1").is_dir());
        Ok(())
    }

    #[test]
    fn test_train_steps_keeps_open_trajectories() -> Result<()> {
        let config = TrainerConfig::default()
            .max_iterations(2)
            .n_workers(2)
            .rollout(RolloutConfig::Steps(4));
        let mut trainer = Trainer::<Countdown, _>::build(config, &3, UnitReward)?;
        let mut learner = Counting::default();
        let policy = RandomPolicy::new(1);

        trainer.train(&mut learner, &policy, &policy, &mut BufferedRecorder::new())?;

        assert_eq!(learner.seen, vec![8, 8]);
        // One open trajectory per worker survives, compacted.
        assert_eq!(trainer.buffer().len(), 2);
        assert_eq!(trainer.buffer().num_transitions(), 0);
        Ok(())
    }
}
