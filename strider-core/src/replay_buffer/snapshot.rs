use crate::{
    error::StriderError,
    trajectory::{StepView, Trajectory},
};
use anyhow::Result;
use std::sync::MutexGuard;

/// Read-only view of one trajectory of a [`ReplayBuffer`](super::ReplayBuffer).
///
/// The trajectory stays locked for the lifetime of the snapshot.
pub struct Snapshot<'a, O, A> {
    guard: MutexGuard<'a, Trajectory<O, A>>,
}

impl<'a, O, A> Snapshot<'a, O, A> {
    pub(super) fn new(guard: MutexGuard<'a, Trajectory<O, A>>) -> Self {
        Self { guard }
    }

    /// Returns `true` if the trajectory has ended.
    pub fn frozen(&self) -> bool {
        self.guard.is_frozen()
    }

    /// The number of transitions.
    pub fn len(&self) -> usize {
        self.guard.len()
    }

    /// Returns `true` if the trajectory has no transition.
    pub fn is_empty(&self) -> bool {
        self.guard.is_empty()
    }

    /// Iterates over transitions with their start states.
    pub fn iter(&self) -> impl Iterator<Item = StepView<'_, O, A>> + '_ {
        self.guard.iter()
    }

    /// Returns the transition at `ix`.
    pub fn get(&self, ix: usize) -> Option<StepView<'_, O, A>> {
        self.guard.get(ix)
    }

    /// The first transition.
    pub fn front(&self) -> Result<StepView<'_, O, A>> {
        Ok(self.guard.get(0).ok_or(StriderError::EmptyTrajectory)?)
    }

    /// The last transition.
    pub fn back(&self) -> Result<StepView<'_, O, A>> {
        let ix = self
            .guard
            .len()
            .checked_sub(1)
            .ok_or(StriderError::EmptyTrajectory)?;
        Ok(self.guard.get(ix).ok_or(StriderError::EmptyTrajectory)?)
    }

    /// The opening state.
    pub fn opening(&self) -> &O {
        self.guard.opening()
    }

    /// The end state of the last transition, or the opening state.
    pub fn end_state(&self) -> &O {
        self.guard.last_state()
    }

    /// Sum of rewards over the transitions.
    pub fn total_reward(&self) -> f32 {
        self.guard.total_reward()
    }

    /// The underlying trajectory.
    pub fn trajectory(&self) -> &Trajectory<O, A> {
        &self.guard
    }
}

impl<O: std::fmt::Debug, A: std::fmt::Debug> std::fmt::Debug for Snapshot<'_, O, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Snapshot")
            .field("trajectory", &*self.guard)
            .finish()
    }
}
