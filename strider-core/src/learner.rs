//! Learner.
use crate::{base::Env, record::Record, replay_buffer::ReplayBuffer};
use anyhow::Result;
use std::path::Path;

/// Updates models from the experience stored in a [`ReplayBuffer`].
///
/// A learner runs on the controlling thread after every rollout worker has
/// been joined. It reads the buffer through
/// [`ReplayBuffer::sample_snapshot`] and leaves pruning to the caller.
pub trait Learner<E: Env> {
    /// Samples a snapshot of the buffer and updates the models.
    ///
    /// Fails if the buffer holds no transition.
    fn learn(&mut self, buffer: &mut ReplayBuffer<E::Obs, E::Act>) -> Result<Record>;

    /// Performs one learning iteration.
    fn step(&mut self, buffer: &mut ReplayBuffer<E::Obs, E::Act>) -> Result<Record> {
        self.learn(buffer)
    }

    /// Saves the parameters of the models in a directory.
    fn save_params(&self, path: &Path) -> Result<()>;

    /// Loads the parameters of the models from a directory.
    fn load_params(&mut self, path: &Path) -> Result<()>;
}
