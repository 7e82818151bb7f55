//! Policy.
use super::Env;
use crate::DiscreteAction;
use anyhow::Result;
use rand::RngCore;

/// A policy on an environment.
///
/// Policy is a mapping from an observation to an action.
/// The mapping can be either of deterministic or stochastic.
///
/// A single policy is evaluated concurrently by every rollout worker, so
/// `react` takes `&self` and draws randomness only from the generator owned by
/// the calling worker.
pub trait Policy<E: Env>: Sync {
    /// Takes an action given an observation.
    fn react(&self, obs: &E::Obs, rng: &mut dyn RngCore) -> Result<E::Act>;
}

/// Uniformly random policy over a fixed number of discrete actions.
///
/// Actions carry the uniform distribution they were sampled from, so they can
/// be consumed by learners like any other sampled action.
#[derive(Debug, Clone)]
pub struct RandomPolicy {
    n_actions: usize,
}

impl RandomPolicy {
    /// Constructs a random policy over `n_actions` choices.
    pub fn new(n_actions: usize) -> Self {
        Self { n_actions }
    }
}

impl<E> Policy<E> for RandomPolicy
where
    E: Env<Act = DiscreteAction>,
{
    fn react(&self, _obs: &E::Obs, rng: &mut dyn RngCore) -> Result<DiscreteAction> {
        let probs = vec![1.0 / self.n_actions as f32; self.n_actions];
        DiscreteAction::from_vector(&probs, rng)
    }
}
