//! Policy updates of actor-critic learners.
use super::config::{ClipConfig, KlPenaltyConfig, VanillaConfig};
use crate::{
    pg::{check_advantages, reinforce_rows},
    Model, OutputGrad,
};
use anyhow::{anyhow, Context, Result};
use log::debug;
use serde::{de::DeserializeOwned, Serialize};
use strider_core::{
    advantage::kl_divergence,
    error::StriderError,
    record::{Record, RecordValue},
    DiscreteAction, ExperienceBatch,
};

/// Updates the policy model from a batch and its advantages.
pub trait PolicyUpdate {
    /// Configuration.
    type Config: Clone + Default + Serialize + DeserializeOwned;

    /// Constructs the update.
    fn build(config: Self::Config) -> Result<Self>
    where
        Self: Sized;

    /// Runs the optimizer steps of one learning iteration.
    fn optimize(
        &mut self,
        model: &mut Model,
        batch: &ExperienceBatch<DiscreteAction>,
        advantages: &[f32],
    ) -> Result<Record>;
}

fn rows_of(probs: &[f32], n: usize) -> usize {
    probs.len() / n.max(1)
}

/// One policy-gradient step with the given advantages.
pub struct Vanilla;

impl PolicyUpdate for Vanilla {
    type Config = VanillaConfig;

    fn build(_config: VanillaConfig) -> Result<Self> {
        Ok(Self)
    }

    fn optimize(
        &mut self,
        model: &mut Model,
        batch: &ExperienceBatch<DiscreteAction>,
        advantages: &[f32],
    ) -> Result<Record> {
        let mut loss = 0f32;
        model.step(&batch.states, OutputGrad::Logits, |probs| {
            let (rows, l) = reinforce_rows(&batch.actions, advantages, probs)?;
            loss = l;
            Ok(rows)
        })?;
        Ok(Record::from_scalar("loss_policy", loss))
    }
}

/// Several steps on the clipped surrogate objective.
///
/// The importance ratio compares the current probability of each action with
/// the probability it was sampled with, so the same batch can be reused for
/// every step.
pub struct ClippedSurrogate {
    epsilon: f32,
    n_updates: usize,
}

impl ClippedSurrogate {
    /// Loss-gradient rows with respect to the action probabilities.
    ///
    /// Returns the rows, the mean clipped objective and the fraction of
    /// transitions whose gradient is clipped away.
    fn rows(
        &self,
        actions: &[DiscreteAction],
        advantages: &[f32],
        probs: &[f32],
    ) -> Result<(Vec<f32>, f32, f32)> {
        check_advantages(actions, advantages)?;
        let k = rows_of(probs, actions.len());
        let mut rows = vec![0f32; probs.len()];
        let mut loss = 0f32;
        let mut n_clipped = 0;
        for (i, (action, &adv)) in actions.iter().zip(advantages).enumerate() {
            let p = &probs[i * k..(i + 1) * k];
            let row = &mut rows[i * k..(i + 1) * k];
            action.clipped_gradient(p, row, adv, self.epsilon)?;
            loss += action.clipped_objective(p, adv, self.epsilon)?;
            if adv != 0.0 && row[action.choice()] == 0.0 {
                n_clipped += 1;
            }
        }
        let n = actions.len().max(1) as f32;
        Ok((rows, loss / n, n_clipped as f32 / n))
    }
}

impl PolicyUpdate for ClippedSurrogate {
    type Config = ClipConfig;

    fn build(config: ClipConfig) -> Result<Self> {
        Ok(Self {
            epsilon: config.epsilon,
            n_updates: config.n_updates,
        })
    }

    fn optimize(
        &mut self,
        model: &mut Model,
        batch: &ExperienceBatch<DiscreteAction>,
        advantages: &[f32],
    ) -> Result<Record> {
        let mut loss = 0f32;
        let mut clip_fraction = 0f32;
        for _ in 0..self.n_updates {
            model.step(&batch.states, OutputGrad::Output, |probs| {
                let (rows, l, c) = self.rows(&batch.actions, advantages, probs)?;
                loss = l;
                clip_fraction = c;
                Ok(rows)
            })?;
        }
        Ok(Record::from_slice(&[
            ("loss_policy", RecordValue::Scalar(loss)),
            ("clip_fraction", RecordValue::Scalar(clip_fraction)),
        ]))
    }
}

/// Several policy-gradient steps with a penalty pulling the action
/// probabilities toward those the actions were sampled with.
///
/// After the steps the mean divergence `D_KL(current || sampled)` over the
/// batch is compared with the target, and the penalty coefficient `beta` is
/// adapted for the next learning iteration.
pub struct AdaptiveKlPenalty {
    beta: f32,
    beta_min: f32,
    beta_max: f32,
    d_target: f32,
    n_updates: usize,
}

impl AdaptiveKlPenalty {
    /// The current penalty coefficient.
    pub fn beta(&self) -> f32 {
        self.beta
    }

    /// The target divergence.
    pub fn d_target(&self) -> f32 {
        self.d_target
    }

    /// Halves `beta` if `|mean_kl|` is below `d_target / 1.5`, doubles it if
    /// above `d_target * 1.5`, then clamps it to its bounds. Returns the new
    /// value.
    pub fn adapt(&mut self, mean_kl: f32) -> f32 {
        let d = mean_kl.abs();
        if d < self.d_target / 1.5 {
            self.beta /= 2.0;
        } else if d > self.d_target * 1.5 {
            self.beta *= 2.0;
        }
        self.beta = self.beta.clamp(self.beta_min, self.beta_max);
        self.beta
    }

    /// Loss-gradient rows with respect to the logits.
    fn rows(
        &self,
        actions: &[DiscreteAction],
        advantages: &[f32],
        probs: &[f32],
    ) -> Result<(Vec<f32>, f32)> {
        let (mut rows, loss) = reinforce_rows(actions, advantages, probs)?;
        let k = rows_of(probs, actions.len());
        for (i, action) in actions.iter().enumerate() {
            let sampled = action
                .distribution()
                .ok_or(StriderError::MissingDistribution)?;
            let p = &probs[i * k..(i + 1) * k];
            for ((r, &pj), &qj) in rows[i * k..(i + 1) * k].iter_mut().zip(p).zip(sampled) {
                *r += self.beta * (pj - qj);
            }
        }
        Ok((rows, loss))
    }

    /// Mean `D_KL(current || sampled)` over the batch.
    fn mean_kl(&self, actions: &[DiscreteAction], probs: &[f32]) -> Result<f32> {
        let k = rows_of(probs, actions.len());
        let mut total = 0f32;
        for (i, action) in actions.iter().enumerate() {
            let sampled = action
                .distribution()
                .ok_or(StriderError::MissingDistribution)?;
            total += kl_divergence(&probs[i * k..(i + 1) * k], sampled)?;
        }
        Ok(total / actions.len().max(1) as f32)
    }
}

impl PolicyUpdate for AdaptiveKlPenalty {
    type Config = KlPenaltyConfig;

    /// Fails if `d_target` is unset or the bounds of `beta` are reversed.
    /// The initial `beta` is clamped to its bounds.
    fn build(config: KlPenaltyConfig) -> Result<Self> {
        if config.beta_min > config.beta_max {
            return Err(anyhow!(
                "beta_min {} exceeds beta_max {}",
                config.beta_min,
                config.beta_max
            ));
        }
        Ok(Self {
            beta: config.beta.clamp(config.beta_min, config.beta_max),
            beta_min: config.beta_min,
            beta_max: config.beta_max,
            d_target: config.d_target.context("d_target is not set")?,
            n_updates: config.n_updates,
        })
    }

    fn optimize(
        &mut self,
        model: &mut Model,
        batch: &ExperienceBatch<DiscreteAction>,
        advantages: &[f32],
    ) -> Result<Record> {
        let mut loss = 0f32;
        for _ in 0..self.n_updates {
            model.step(&batch.states, OutputGrad::Logits, |probs| {
                let (rows, l) = self.rows(&batch.actions, advantages, probs)?;
                loss = l;
                Ok(rows)
            })?;
        }

        let probs = model.forward_vec(&batch.states)?;
        let kl = self.mean_kl(&batch.actions, &probs)?;
        let beta = self.adapt(kl);
        debug!("Mean KL divergence {}, beta {}", kl, beta);

        Ok(Record::from_slice(&[
            ("loss_policy", RecordValue::Scalar(loss)),
            ("kl", RecordValue::Scalar(kl)),
            ("beta", RecordValue::Scalar(beta)),
        ]))
    }
}
