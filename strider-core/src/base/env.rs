//! Environment.
use super::{Act, Obs};
use anyhow::Result;

/// Represents an environment, typically an MDP.
///
/// An environment instance is owned by a single rollout worker. `id` is the
/// identifier of that worker and is passed through every call so that an
/// implementation may multiplex several independent states.
pub trait Env: Send {
    /// Configurations.
    type Config: Clone + Send;

    /// Observation of the environment.
    type Obs: Obs;

    /// Action of the environment.
    type Act: Act;

    /// Builds an environment with a given random seed.
    fn build(config: &Self::Config, seed: i64) -> Result<Self>
    where
        Self: Sized;

    /// Applies an action to the state of `id`.
    ///
    /// Invalid or overflowing moves are not errors here; they are observed
    /// through the subsequent [`Env::view`].
    fn apply(&mut self, act: &Self::Act, id: usize) -> Result<()>;

    /// Returns the current observation of `id`.
    fn view(&self, id: usize) -> Self::Obs;

    /// Reinitializes the state of `id`.
    fn reset(&mut self, id: usize) -> Result<()>;
}
