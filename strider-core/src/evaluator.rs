//! Evaluation of a policy.
use crate::{base::Env, record::Record, Policy};
use anyhow::Result;
mod default_evaluator;
pub use default_evaluator::DefaultEvaluator;

/// Evaluates a [`Policy`].
pub trait Evaluator<E: Env> {
    /// Runs the policy and returns its performance.
    ///
    /// The returned record has an `episode_return` entry.
    fn evaluate<P: Policy<E> + ?Sized>(&mut self, policy: &P) -> Result<Record>;
}
