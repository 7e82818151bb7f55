use super::{ActorCriticConfig, PolicyUpdate};
use crate::Model;
use anyhow::Result;
use log::debug;
use std::{fs, path::Path};
use strider_core::{
    advantage::{gae, td_targets},
    error::StriderError,
    record::{Record, RecordValue},
    DiscreteAction, Env, ExperienceBatch, Learner, ReplayBuffer,
};

#[cfg_attr(doc, aquamarine::aquamarine)]
/// Actor-critic learner with generalized advantage estimation.
///
/// A learning iteration goes as follows:
///
/// ```mermaid
/// graph TD
///     S[Snapshot of the buffer] --> B[Batch with one end state per trajectory]
///     B --> V1[Values of all states]
///     V1 --> T["Targets r + gamma * V(next)"]
///     T --> F[Value model fit]
///     F --> V2[Values of all states]
///     V2 --> G[GAE per trajectory]
///     G --> U[Policy update]
/// ```
///
/// The value beyond the end state of a frozen trajectory is zero, since the
/// episode ended there. For a trajectory still open, the value model's own
/// estimate of its end state is used as bootstrap.
pub struct ActorCriticLearner<U> {
    gamma: f32,
    lambda: f32,
    policy: Model,
    value: Model,
    update: U,
}

impl<U: PolicyUpdate> ActorCriticLearner<U> {
    /// Constructs the learner.
    pub fn build(config: ActorCriticConfig<U::Config>) -> Result<Self> {
        let (policy, value) = config.models()?;
        Ok(Self {
            gamma: config.gamma,
            lambda: config.lambda,
            policy: Model::build(policy, config.device)?,
            value: Model::build(value, config.device)?,
            update: U::build(config.update)?,
        })
    }

    /// The policy model.
    pub fn policy_model(&self) -> &Model {
        &self.policy
    }

    /// The state-value model.
    pub fn value_model(&self) -> &Model {
        &self.value
    }

    /// The policy update.
    pub fn update(&self) -> &U {
        &self.update
    }

    /// Values of the value states of the batch, with the value after every
    /// frozen trajectory set to zero.
    fn values<A>(&self, batch: &ExperienceBatch<A>) -> Result<Vec<f32>> {
        let states = batch.value_states.as_deref().unwrap_or_default();
        let mut values = self.value.forward_vec(states)?;
        if values.len() != batch.n_value_states() {
            return Err(StriderError::ShapeMismatch {
                what: "state values",
                expected: batch.n_value_states(),
                actual: values.len(),
            }
            .into());
        }
        for seg in batch.segments.iter().filter(|seg| seg.frozen) {
            values[seg.value_start + seg.len] = 0.0;
        }
        Ok(values)
    }

    /// Fits the value model and returns the advantages with the value loss.
    fn estimate<A>(&mut self, batch: &ExperienceBatch<A>) -> Result<(Vec<f32>, f32)> {
        let values = self.values(batch)?;
        let mut targets = Vec::with_capacity(batch.len());
        for seg in batch.segments.iter() {
            targets.extend(td_targets(
                &batch.rewards[seg.range()],
                &values[seg.value_range()],
                self.gamma,
            )?);
        }
        let loss_value = self.value.regress(&batch.states, &targets)?;

        let values = self.values(batch)?;
        let mut advantages = Vec::with_capacity(batch.len());
        for seg in batch.segments.iter() {
            advantages.extend(gae(
                &batch.rewards[seg.range()],
                &values[seg.value_range()],
                self.gamma,
                self.lambda,
            )?);
        }
        Ok((advantages, loss_value))
    }
}

impl<E, U> Learner<E> for ActorCriticLearner<U>
where
    E: Env<Act = DiscreteAction>,
    U: PolicyUpdate,
{
    fn learn(&mut self, buffer: &mut ReplayBuffer<E::Obs, E::Act>) -> Result<Record> {
        let batch = {
            let snapshots = buffer.sample_snapshot()?;
            ExperienceBatch::from_snapshots(&snapshots, true)?
        };
        let (advantages, loss_value) = self.estimate(&batch)?;
        let mean_advantage = advantages.iter().sum::<f32>() / advantages.len() as f32;
        debug!(
            "Actor-critic on {} transitions, value loss {}",
            batch.len(),
            loss_value
        );

        let mut record = self.update.optimize(&mut self.policy, &batch, &advantages)?;
        record.insert("loss_value", RecordValue::Scalar(loss_value));
        record.insert("advantage", RecordValue::Scalar(mean_advantage));
        Ok(record)
    }

    fn save_params(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path)?;
        self.policy.save(path.join("policy.safetensors"))?;
        self.value.save(path.join("value.safetensors"))
    }

    fn load_params(&mut self, path: &Path) -> Result<()> {
        self.policy.load(path.join("policy.safetensors"))?;
        self.value.load(path.join("value.safetensors"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        actor_critic::{Vanilla, VanillaConfig},
        mlp::MlpConfig,
        opt::OptimizerConfig,
        ModelConfig, OutputActivation,
    };
    use strider_core::replay_buffer::Segment;

    const GAMMA: f32 = 0.9;
    const LAMBDA: f32 = 0.8;

    /// Value model `V(s) = s + 1`, left unchanged by fitting.
    fn learner() -> Result<ActorCriticLearner<Vanilla>> {
        let config = ActorCriticConfig::<VanillaConfig>::default()
            .policy(ModelConfig::new(
                MlpConfig::new(1, vec![], 2),
                OutputActivation::Softmax,
            ))
            .value(
                ModelConfig::new(MlpConfig::new(1, vec![], 1), OutputActivation::Identity)
                    .opt(OptimizerConfig::Sgd { lr: 0.0 }),
            )
            .gamma(GAMMA)
            .lambda(LAMBDA);
        let learner = ActorCriticLearner::<Vanilla>::build(config)?;
        learner.value_model().set_parameters(&[1.0, 1.0])?;
        Ok(learner)
    }

    /// A frozen trajectory over states 1, 2 ending in 3, then an open one
    /// over state 4 ending in 5.
    fn batch() -> ExperienceBatch<usize> {
        ExperienceBatch {
            obs_dim: 1,
            states: vec![1.0, 2.0, 4.0],
            actions: vec![0, 1, 0],
            rewards: vec![1.0, 0.5, 2.0],
            segments: vec![
                Segment {
                    start: 0,
                    len: 2,
                    value_start: 0,
                    frozen: true,
                },
                Segment {
                    start: 2,
                    len: 1,
                    value_start: 3,
                    frozen: false,
                },
            ],
            value_states: Some(vec![1.0, 2.0, 3.0, 4.0, 5.0]),
        }
    }

    #[test]
    fn test_bootstrap_value_only_behind_open_trajectory() -> Result<()> {
        let learner = learner()?;
        let values = learner.values(&batch())?;
        assert_eq!(values, vec![2.0, 3.0, 0.0, 5.0, 6.0]);
        Ok(())
    }

    #[test]
    fn test_advantages_stay_within_trajectory() -> Result<()> {
        let mut learner = learner()?;
        let (advantages, loss_value) = learner.estimate(&batch())?;

        let mut expected = gae(&[1.0, 0.5], &[2.0, 3.0, 0.0], GAMMA, LAMBDA)?;
        expected.extend(gae(&[2.0], &[5.0, 6.0], GAMMA, LAMBDA)?);
        assert_eq!(advantages, expected);

        // The last step of the frozen trajectory sees no value beyond it,
        // the open one bootstraps from its end state.
        assert!((advantages[1] - (0.5 - 3.0)).abs() < 1e-6);
        assert!((advantages[2] - (2.0 + GAMMA * 6.0 - 5.0)).abs() < 1e-6);
        assert!(loss_value.is_finite());
        Ok(())
    }

    #[test]
    fn test_build_rejects_non_softmax_policy() {
        let config = ActorCriticConfig::<VanillaConfig>::default()
            .policy(ModelConfig::new(
                MlpConfig::new(1, vec![], 2),
                OutputActivation::Identity,
            ))
            .value(ModelConfig::new(
                MlpConfig::new(1, vec![], 1),
                OutputActivation::Identity,
            ));
        assert!(ActorCriticLearner::<Vanilla>::build(config).is_err());
    }
}
