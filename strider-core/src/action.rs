//! Discrete actions and their loss gradients.
//!
//! A [`DiscreteAction`] remembers the distribution it was sampled from. The
//! learners compare the current model's distribution over the same state with
//! this cached one, which cannot be recovered once the model parameters have
//! moved on.
//!
//! The gradient methods each fill one row of a loss-gradient matrix. The row
//! is the derivative of the per-transition loss with respect to either the
//! action probabilities or the pre-softmax logits of the policy model, as noted
//! on each method.
use crate::{base::Act, error::StriderError};
use anyhow::Result;
use rand::{distributions::WeightedIndex, prelude::Distribution, Rng};

/// A discrete choice over a fixed number of actions.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscreteAction {
    choice: usize,
    cardinality: usize,
    distrib: Option<Vec<f32>>,
}

impl Act for DiscreteAction {}

impl DiscreteAction {
    /// Constructs an action without a sampling distribution.
    pub fn new(choice: usize, cardinality: usize) -> Result<Self> {
        if choice >= cardinality {
            return Err(StriderError::InvalidAction {
                choice,
                cardinality,
            }
            .into());
        }
        Ok(Self {
            choice,
            cardinality,
            distrib: None,
        })
    }

    /// Constructs an action together with the distribution it was drawn from.
    pub fn with_distribution(choice: usize, distrib: Vec<f32>) -> Result<Self> {
        let cardinality = distrib.len();
        let mut action = Self::new(choice, cardinality)?;
        action.distrib = Some(distrib);
        Ok(action)
    }

    /// Samples an action from `probs` and caches `probs` as its distribution.
    pub fn from_vector<R: Rng + ?Sized>(probs: &[f32], rng: &mut R) -> Result<Self> {
        let dist = WeightedIndex::new(probs)
            .map_err(|e| StriderError::InvalidDistribution(e.to_string()))?;
        let choice = dist.sample(rng);
        Self::with_distribution(choice, probs.to_vec())
    }

    /// Takes the highest scoring action. No distribution is cached.
    ///
    /// Ties resolve to the lowest index.
    pub fn from_vector_deterministic(scores: &[f32]) -> Result<Self> {
        let choice = scores
            .iter()
            .enumerate()
            .fold(None, |best: Option<(usize, f32)>, (i, &s)| match best {
                Some((_, b)) if b >= s => best,
                _ => Some((i, s)),
            })
            .map(|(i, _)| i)
            .ok_or_else(|| StriderError::InvalidDistribution("empty score vector".into()))?;
        Self::new(choice, scores.len())
    }

    /// The chosen index.
    pub fn choice(&self) -> usize {
        self.choice
    }

    /// The number of available actions.
    pub fn cardinality(&self) -> usize {
        self.cardinality
    }

    /// The distribution active when the action was sampled, if any.
    pub fn distribution(&self) -> Option<&[f32]> {
        self.distrib.as_deref()
    }

    fn sampled(&self) -> Result<&[f32]> {
        Ok(self
            .distrib
            .as_deref()
            .ok_or(StriderError::MissingDistribution)?)
    }

    fn check_row(&self, probs: &[f32], out: &[f32]) -> Result<()> {
        for (what, len) in [("action probabilities", probs.len()), ("gradient row", out.len())] {
            if len != self.cardinality {
                return Err(StriderError::ShapeMismatch {
                    what,
                    expected: self.cardinality,
                    actual: len,
                }
                .into());
            }
        }
        Ok(())
    }

    /// Importance ratio `P_current(a|s) / P_sampled(a|s)`.
    pub fn importance_ratio(&self, probs: &[f32]) -> Result<f32> {
        let sampled = self.sampled()?;
        if probs.len() != sampled.len() {
            return Err(StriderError::ShapeMismatch {
                what: "action probabilities",
                expected: sampled.len(),
                actual: probs.len(),
            }
            .into());
        }
        Ok(probs[self.choice] / sampled[self.choice])
    }

    /// Gradient of `-advantage * log p[choice]` with respect to the logits.
    ///
    /// With `p = softmax(logits)` this is `advantage * (p - onehot(choice))`.
    pub fn softmax_gradient_log(&self, probs: &[f32], out: &mut [f32], advantage: f32) -> Result<()> {
        self.check_row(probs, out)?;
        for (o, &p) in out.iter_mut().zip(probs) {
            *o = p * advantage;
        }
        out[self.choice] -= advantage;
        Ok(())
    }

    /// Gradient of the importance-weighted objective `-advantage * ratio`
    /// with respect to the action probabilities.
    ///
    /// Only the chosen slot is non-zero: `-advantage / P_sampled(choice)`.
    pub fn gradient_log(&self, probs: &[f32], out: &mut [f32], advantage: f32) -> Result<()> {
        self.check_row(probs, out)?;
        let sampled = self.sampled()?;
        let log_grad = 1.0 / probs[self.choice];
        let weighted = -log_grad * advantage;
        out.fill(0.0);
        out[self.choice] = probs[self.choice] / sampled[self.choice] * weighted;
        Ok(())
    }

    /// Clipped surrogate loss `-min(clip(ratio, 1-eps, 1+eps) * A, ratio * A)`.
    pub fn clipped_objective(&self, probs: &[f32], advantage: f32, epsilon: f32) -> Result<f32> {
        let ratio = self.importance_ratio(probs)?;
        let clipped = ratio.clamp(1.0 - epsilon, 1.0 + epsilon);
        Ok(-(clipped * advantage).min(ratio * advantage))
    }

    /// Gradient of [`DiscreteAction::clipped_objective`] with respect to the
    /// action probabilities.
    ///
    /// While the unclipped term is the minimum, including the clip boundary
    /// itself, the chosen slot gets `-advantage / P_sampled(choice)`. Once the
    /// clipped term is strictly smaller the objective is flat in the ratio and
    /// the row is zero.
    pub fn clipped_gradient(
        &self,
        probs: &[f32],
        out: &mut [f32],
        advantage: f32,
        epsilon: f32,
    ) -> Result<()> {
        self.check_row(probs, out)?;
        let sampled = self.sampled()?[self.choice];
        let ratio = self.importance_ratio(probs)?;
        let clipped = ratio.clamp(1.0 - epsilon, 1.0 + epsilon);
        out.fill(0.0);
        if ratio * advantage <= clipped * advantage {
            out[self.choice] = -advantage / sampled;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::SmallRng, SeedableRng};

    const EPS: f32 = 0.2;

    #[test]
    fn test_from_vector_caches_distribution() -> Result<()> {
        let mut rng = SmallRng::seed_from_u64(42);
        let probs = [0.0, 1.0, 0.0];
        let a = DiscreteAction::from_vector(&probs, &mut rng)?;
        assert_eq!(a.choice(), 1);
        assert_eq!(a.cardinality(), 3);
        assert_eq!(a.distribution(), Some(&probs[..]));
        Ok(())
    }

    #[test]
    fn test_from_vector_rejects_invalid_weights() {
        let mut rng = SmallRng::seed_from_u64(0);
        assert!(DiscreteAction::from_vector(&[0.0, 0.0], &mut rng).is_err());
        assert!(DiscreteAction::from_vector(&[-1.0, 2.0], &mut rng).is_err());
    }

    #[test]
    fn test_deterministic_takes_first_argmax() -> Result<()> {
        let a = DiscreteAction::from_vector_deterministic(&[-1.0, 0.5, 0.5, 0.2])?;
        assert_eq!(a.choice(), 1);
        assert_eq!(a.distribution(), None);
        assert!(DiscreteAction::from_vector_deterministic(&[]).is_err());
        Ok(())
    }

    #[test]
    fn test_softmax_gradient_log() -> Result<()> {
        let a = DiscreteAction::new(2, 3)?;
        let mut row = [0.0; 3];
        a.softmax_gradient_log(&[0.2, 0.3, 0.5], &mut row, 2.0)?;
        assert_eq!(row, [0.4, 0.6, -1.0]);
        Ok(())
    }

    #[test]
    fn test_gradient_log_is_importance_weighted() -> Result<()> {
        let a = DiscreteAction::with_distribution(0, vec![0.5, 0.5])?;
        let mut row = [1.0; 2];
        a.gradient_log(&[0.25, 0.75], &mut row, 1.0)?;
        assert!((row[0] + 2.0).abs() < 1e-6);
        assert_eq!(row[1], 0.0);
        Ok(())
    }

    #[test]
    fn test_gradient_shape_mismatch() -> Result<()> {
        let a = DiscreteAction::with_distribution(0, vec![0.5, 0.5])?;
        let mut row = [0.0; 3];
        let err = a.softmax_gradient_log(&[0.5, 0.5], &mut row, 1.0).unwrap_err();
        assert_eq!(
            err.downcast_ref::<StriderError>(),
            Some(&StriderError::ShapeMismatch {
                what: "gradient row",
                expected: 2,
                actual: 3
            })
        );
        Ok(())
    }

    #[test]
    fn test_clipped_gradient_requires_distribution() -> Result<()> {
        let a = DiscreteAction::new(0, 2)?;
        let mut row = [0.0; 2];
        let err = a.clipped_gradient(&[0.5, 0.5], &mut row, 1.0, EPS).unwrap_err();
        assert_eq!(
            err.downcast_ref::<StriderError>(),
            Some(&StriderError::MissingDistribution)
        );
        Ok(())
    }

    #[test]
    fn test_clip_boundary_uses_unclipped_branch() -> Result<()> {
        let sampled = 0.5f32;
        let a = DiscreteAction::with_distribution(0, vec![sampled, 1.0 - sampled])?;
        let current = sampled * (1.0 + EPS);
        let probs = [current, 1.0 - current];
        assert_eq!(a.importance_ratio(&probs)?, 1.0 + EPS);

        let advantage = 1.5;
        let mut row = [0.0; 2];
        a.clipped_gradient(&probs, &mut row, advantage, EPS)?;
        assert_eq!(row[0], -advantage / sampled);
        assert_eq!(row[1], 0.0);

        // The objective is continuous at the boundary.
        let objective = a.clipped_objective(&probs, advantage, EPS)?;
        let ratio = a.importance_ratio(&probs)?;
        assert_eq!(objective, -ratio * advantage);
        Ok(())
    }

    #[test]
    fn test_clip_flat_beyond_boundary() -> Result<()> {
        let a = DiscreteAction::with_distribution(0, vec![0.4, 0.6])?;
        let advantage = 2.0;
        let at_1_3 = a.clipped_objective(&[0.52, 0.48], advantage, EPS)?;
        let at_1_5 = a.clipped_objective(&[0.6, 0.4], advantage, EPS)?;
        let at_2_0 = a.clipped_objective(&[0.8, 0.2], advantage, EPS)?;
        assert_eq!(at_1_3, at_1_5);
        assert_eq!(at_1_5, at_2_0);
        assert!((at_1_3 + (1.0 + EPS) * advantage).abs() < 1e-6);

        let mut row = [1.0; 2];
        a.clipped_gradient(&[0.6, 0.4], &mut row, advantage, EPS)?;
        assert_eq!(row, [0.0, 0.0]);
        Ok(())
    }

    #[test]
    fn test_clip_negative_advantage() -> Result<()> {
        let a = DiscreteAction::with_distribution(1, vec![0.5, 0.5])?;
        let advantage = -1.0;
        // Ratio 0.6 is below 1 - eps, the clipped term is active and flat.
        let mut row = [0.0; 2];
        a.clipped_gradient(&[0.7, 0.3], &mut row, advantage, EPS)?;
        assert_eq!(row, [0.0, 0.0]);
        // Ratio 1.4 with negative advantage keeps the unclipped term.
        a.clipped_gradient(&[0.3, 0.7], &mut row, advantage, EPS)?;
        assert_eq!(row, [0.0, 2.0]);
        Ok(())
    }
}
