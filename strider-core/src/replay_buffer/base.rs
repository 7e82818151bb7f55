use super::Snapshot;
use crate::{error::StriderError, trajectory::Trajectory};
use anyhow::Result;
use log::trace;
use rand::Rng;
use std::sync::{Arc, Mutex, PoisonError};

/// Shared handle to a trajectory stored in a [`ReplayBuffer`].
///
/// The handle is held by the single agent that writes the trajectory.
pub type TrajectoryHandle<O, A> = Arc<Mutex<Trajectory<O, A>>>;

/// An owned copy of a transition with its start state.
#[derive(Debug, Clone, PartialEq)]
pub struct SampledStep<O, A> {
    /// Observation before the action.
    pub start_state: O,

    /// Action taken.
    pub action: A,

    /// Reward received for the action.
    pub reward: f32,

    /// Observation after the action.
    pub end_state: O,
}

/// Growable collection of open and frozen trajectories.
#[derive(Debug)]
pub struct ReplayBuffer<O, A> {
    trajectories: Mutex<Vec<TrajectoryHandle<O, A>>>,
}

impl<O, A> Default for ReplayBuffer<O, A> {
    fn default() -> Self {
        Self {
            trajectories: Mutex::new(Vec::new()),
        }
    }
}

impl<O, A> ReplayBuffer<O, A> {
    /// Constructs an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a new open trajectory starting at `opening`.
    ///
    /// Creation is mutually exclusive across callers.
    pub fn emplace_trajectory(&self, opening: O) -> Result<TrajectoryHandle<O, A>> {
        let mut trajectories = self
            .trajectories
            .lock()
            .map_err(|_| StriderError::LockPoisoned("replay buffer"))?;
        let handle = Arc::new(Mutex::new(Trajectory::new(opening)));
        trajectories.push(handle.clone());
        trace!("Emplaced trajectory #{}", trajectories.len() - 1);
        Ok(handle)
    }

    /// Locks every stored trajectory and returns a read-only view of each.
    ///
    /// The views reflect a consistent cut of the buffer: nothing can be
    /// created or appended while any of them is alive.
    pub fn sample_snapshot(&mut self) -> Result<Vec<Snapshot<'_, O, A>>> {
        let trajectories = self
            .trajectories
            .get_mut()
            .map_err(|_| StriderError::LockPoisoned("replay buffer"))?;
        let mut snapshots = Vec::with_capacity(trajectories.len());
        for t in trajectories.iter() {
            let guard = t
                .lock()
                .map_err(|_| StriderError::LockPoisoned("trajectory"))?;
            snapshots.push(Snapshot::new(guard));
        }
        Ok(snapshots)
    }

    /// Removes frozen trajectories and compacts open ones.
    ///
    /// An open trajectory loses its transitions and is reopened at the end
    /// state of its last transition.
    pub fn forget(&mut self) -> Result<()> {
        let trajectories = self
            .trajectories
            .get_mut()
            .map_err(|_| StriderError::LockPoisoned("replay buffer"))?;
        let mut kept = Vec::with_capacity(trajectories.len());

        for handle in trajectories.drain(..) {
            let mut t = handle
                .lock()
                .map_err(|_| StriderError::LockPoisoned("trajectory"))?;
            if !t.is_frozen() {
                t.compact();
                drop(t);
                kept.push(handle);
            }
        }

        trace!("Kept {} open trajectories", kept.len());
        *trajectories = kept;
        Ok(())
    }

    /// The number of stored trajectories.
    pub fn len(&self) -> usize {
        self.trajectories
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if no trajectory is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The number of transitions over all stored trajectories.
    pub fn num_transitions(&self) -> usize {
        self.trajectories
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|t| t.lock().unwrap_or_else(PoisonError::into_inner).len())
            .sum()
    }

    /// Sum of rewards of each trajectory in a snapshot.
    pub fn total_rewards(snapshots: &[Snapshot<'_, O, A>]) -> Vec<f32> {
        snapshots.iter().map(|s| s.total_reward()).collect()
    }
}

impl<O: Clone, A: Clone> ReplayBuffer<O, A> {
    /// Draws `n` transitions uniformly, with replacement, over all stored
    /// transitions.
    pub fn sample_transitions<R: Rng + ?Sized>(
        &mut self,
        n: usize,
        rng: &mut R,
    ) -> Result<Vec<SampledStep<O, A>>> {
        let snapshots = self.sample_snapshot()?;
        if snapshots.is_empty() {
            return Err(StriderError::EmptySnapshot.into());
        }
        let total = snapshots.iter().map(|s| s.len()).sum::<usize>();
        if total == 0 {
            return Err(StriderError::EmptyTrajectory.into());
        }

        (0..n)
            .map(|_| -> Result<SampledStep<O, A>> {
                let mut ix = rng.gen_range(0..total);
                for s in snapshots.iter() {
                    if ix < s.len() {
                        let step = s.get(ix).ok_or(StriderError::EmptyTrajectory)?;
                        return Ok(SampledStep {
                            start_state: step.start_state.clone(),
                            action: step.action.clone(),
                            reward: step.reward,
                            end_state: step.end_state.clone(),
                        });
                    }
                    ix -= s.len();
                }
                Err(StriderError::EmptyTrajectory.into())
            })
            .collect()
    }
}
