use super::PgConfig;
use crate::{Model, OutputGrad};
use anyhow::Result;
use log::debug;
use std::{fs, path::Path};
use strider_core::{
    advantage::rewards_to_go,
    error::StriderError,
    record::{Record, RecordValue},
    DiscreteAction, Env, ExperienceBatch, Learner, ReplayBuffer,
};

/// REINFORCE with the mean episode return as baseline.
///
/// Advantages are the rewards-to-go of each transition minus the mean, over
/// the trajectories of the batch, of the rewards-to-go at their first
/// transition. One optimizer step is taken per learning iteration.
pub struct PolicyGradient {
    gamma: f32,
    policy: Model,
}

impl PolicyGradient {
    /// Constructs the learner.
    ///
    /// Fails if the policy model has no softmax output.
    pub fn build(config: PgConfig) -> Result<Self> {
        let policy = Model::build(config.policy_config()?.check_policy()?, config.device)?;
        Ok(Self {
            gamma: config.gamma,
            policy,
        })
    }

    /// The policy model.
    pub fn policy_model(&self) -> &Model {
        &self.policy
    }

    /// Advantages of every transition of the batch, with the baseline.
    pub(crate) fn advantages<A>(batch: &ExperienceBatch<A>, gamma: f32) -> (Vec<f32>, f32) {
        let returns = batch
            .segments
            .iter()
            .map(|seg| rewards_to_go(&batch.rewards[seg.range()], gamma))
            .collect::<Vec<_>>();
        let baseline = returns.iter().map(|g| g[0]).sum::<f32>() / returns.len() as f32;
        let advantages = returns
            .into_iter()
            .flatten()
            .map(|g| g - baseline)
            .collect();
        (advantages, baseline)
    }
}

/// Loss-gradient rows of `-A log p(a)` with respect to the logits.
///
/// Returns the rows and the loss averaged over transitions.
pub(crate) fn reinforce_rows(
    actions: &[DiscreteAction],
    advantages: &[f32],
    probs: &[f32],
) -> Result<(Vec<f32>, f32)> {
    check_advantages(actions, advantages)?;
    let k = probs.len() / actions.len().max(1);
    let mut rows = vec![0f32; probs.len()];
    let mut loss = 0f32;
    for (i, (action, &adv)) in actions.iter().zip(advantages).enumerate() {
        let p = &probs[i * k..(i + 1) * k];
        action.softmax_gradient_log(p, &mut rows[i * k..(i + 1) * k], adv)?;
        loss -= adv * p[action.choice()].max(f32::MIN_POSITIVE).ln();
    }
    Ok((rows, loss / actions.len().max(1) as f32))
}

/// One advantage is required per action.
pub(crate) fn check_advantages(actions: &[DiscreteAction], advantages: &[f32]) -> Result<()> {
    if actions.len() != advantages.len() {
        return Err(StriderError::ShapeMismatch {
            what: "advantages",
            expected: actions.len(),
            actual: advantages.len(),
        }
        .into());
    }
    Ok(())
}

impl<E> Learner<E> for PolicyGradient
where
    E: Env<Act = DiscreteAction>,
{
    fn learn(&mut self, buffer: &mut ReplayBuffer<E::Obs, E::Act>) -> Result<Record> {
        let batch = {
            let snapshots = buffer.sample_snapshot()?;
            ExperienceBatch::from_snapshots(&snapshots, false)?
        };
        let (advantages, baseline) = Self::advantages(&batch, self.gamma);
        debug!(
            "Policy gradient on {} transitions, baseline {}",
            batch.len(),
            baseline
        );

        let mut loss = 0f32;
        self.policy.step(&batch.states, OutputGrad::Logits, |probs| {
            let (rows, l) = reinforce_rows(&batch.actions, &advantages, probs)?;
            loss = l;
            Ok(rows)
        })?;

        Ok(Record::from_slice(&[
            ("loss_policy", RecordValue::Scalar(loss)),
            ("baseline", RecordValue::Scalar(baseline)),
        ]))
    }

    fn save_params(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path)?;
        self.policy.save(path.join("policy.safetensors"))
    }

    fn load_params(&mut self, path: &Path) -> Result<()> {
        self.policy.load(path.join("policy.safetensors"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{mlp::MlpConfig, ModelConfig, OutputActivation};
    use strider_core::replay_buffer::Segment;

    #[test]
    fn test_advantages_subtract_mean_return() {
        let batch = ExperienceBatch::<usize> {
            obs_dim: 1,
            states: vec![0.0; 5],
            actions: vec![0; 5],
            rewards: vec![1.0, 1.0, 1.0, 1.0, 1.0],
            segments: vec![
                Segment {
                    start: 0,
                    len: 3,
                    value_start: 0,
                    frozen: true,
                },
                Segment {
                    start: 3,
                    len: 2,
                    value_start: 4,
                    frozen: true,
                },
            ],
            value_states: None,
        };
        let (advantages, baseline) = PolicyGradient::advantages(&batch, 0.5);
        // Returns [1.75, 1.5, 1.0] and [1.5, 1.0].
        assert_eq!(baseline, 1.625);
        assert_eq!(advantages, vec![0.125, -0.125, -0.625, -0.125, -0.625]);
    }

    #[test]
    fn test_reinforce_rows() -> Result<()> {
        let actions = vec![
            DiscreteAction::new(0, 2)?,
            DiscreteAction::new(1, 2)?,
        ];
        let (rows, loss) = reinforce_rows(&actions, &[1.0, -2.0], &[0.5, 0.5, 0.25, 0.75])?;
        assert_eq!(rows, vec![-0.5, 0.5, -0.5, 0.5]);
        let expected = -(0.5f32.ln() - 2.0 * 0.75f32.ln()) / 2.0;
        assert!((loss - expected).abs() < 1e-6);
        Ok(())
    }

    #[test]
    fn test_reinforce_rows_need_one_advantage_per_action() -> Result<()> {
        let actions = vec![DiscreteAction::new(0, 2)?, DiscreteAction::new(1, 2)?];
        let err = reinforce_rows(&actions, &[1.0], &[0.5; 4]).unwrap_err();
        assert_eq!(
            err.downcast_ref::<StriderError>(),
            Some(&StriderError::ShapeMismatch {
                what: "advantages",
                expected: 2,
                actual: 1
            })
        );
        Ok(())
    }

    #[test]
    fn test_build_rejects_non_softmax_policy() {
        let mlp = MlpConfig::new(4, vec![8], 2);
        let identity = ModelConfig::new(mlp.clone(), OutputActivation::Identity);
        assert!(PolicyGradient::build(PgConfig::default().policy(identity)).is_err());

        let config = PgConfig::default().policy(ModelConfig::new(mlp, OutputActivation::Softmax));
        assert!(PolicyGradient::build(config).is_ok());
    }
}
