//! Reward and termination of a task.

/// Reward function and termination predicate over observations.
///
/// These are kept apart from [`Env`](super::Env) so that the same
/// environment can be trained toward different goals.
pub trait Objective<O>: Send {
    /// Reward for moving from `prev` to `curr`.
    fn reward(&self, prev: &O, curr: &O) -> f32;

    /// Returns `true` if `obs` ends an episode.
    fn is_terminal(&self, obs: &O) -> bool;
}
