use super::Snapshot;
use crate::{base::Obs, error::StriderError};
use anyhow::Result;
use std::ops::Range;

/// Location of one trajectory inside an [`ExperienceBatch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    /// Index of the first transition row.
    pub start: usize,

    /// The number of transitions.
    pub len: usize,

    /// Index of the first row in the value-state matrix.
    pub value_start: usize,

    /// Whether the trajectory has ended.
    pub frozen: bool,
}

impl Segment {
    /// Transition rows of the trajectory.
    pub fn range(&self) -> Range<usize> {
        self.start..self.start + self.len
    }

    /// Value-state rows of the trajectory, one more than its transitions.
    pub fn value_range(&self) -> Range<usize> {
        self.value_start..self.value_start + self.len + 1
    }
}

/// Snapshot contents flattened into row-major matrices.
///
/// Row `i` of `states` is the start state of transition `i`; `actions[i]` and
/// `rewards[i]` belong to the same transition. Trajectories occupy contiguous
/// rows in the order of the snapshot, as described by `segments`.
///
/// `value_states`, when built, lists for every trajectory the start states of
/// its transitions followed by its end state, so that every transition has a
/// state to bootstrap its next value from.
#[derive(Debug, Clone)]
pub struct ExperienceBatch<A> {
    /// Length of a flattened observation.
    pub obs_dim: usize,

    /// Start states, `len() * obs_dim` values.
    pub states: Vec<f32>,

    /// Actions.
    pub actions: Vec<A>,

    /// Rewards.
    pub rewards: Vec<f32>,

    /// One entry per non-empty trajectory.
    pub segments: Vec<Segment>,

    /// States for value estimation, `(len() + segments.len()) * obs_dim`
    /// values.
    pub value_states: Option<Vec<f32>>,
}

impl<A: Clone> ExperienceBatch<A> {
    /// Flattens snapshots of a replay buffer.
    ///
    /// Trajectories without transitions are skipped. Fails if `snapshots` is
    /// empty, if no trajectory has a transition, or if observations disagree
    /// in length.
    pub fn from_snapshots<O: Obs>(
        snapshots: &[Snapshot<'_, O, A>],
        with_value_states: bool,
    ) -> Result<Self> {
        if snapshots.is_empty() {
            return Err(StriderError::EmptySnapshot.into());
        }
        let first = snapshots
            .iter()
            .find(|s| !s.is_empty())
            .ok_or(StriderError::EmptyTrajectory)?;
        let obs_dim = first.opening().dim();
        let n = snapshots.iter().map(|s| s.len()).sum::<usize>();

        let mut states = vec![0f32; n * obs_dim];
        let mut actions = Vec::with_capacity(n);
        let mut rewards = Vec::with_capacity(n);
        let mut segments = Vec::with_capacity(snapshots.len());
        let mut value_states = Vec::new();

        let write = |obs: &O, out: &mut [f32]| -> Result<()> {
            if obs.dim() != obs_dim {
                return Err(StriderError::ShapeMismatch {
                    what: "observation",
                    expected: obs_dim,
                    actual: obs.dim(),
                }
                .into());
            }
            obs.to_vector(out);
            Ok(())
        };

        let mut row = 0;
        for snapshot in snapshots.iter().filter(|s| !s.is_empty()) {
            segments.push(Segment {
                start: row,
                len: snapshot.len(),
                value_start: row + segments.len(),
                frozen: snapshot.frozen(),
            });
            for step in snapshot.iter() {
                write(step.start_state, &mut states[row * obs_dim..(row + 1) * obs_dim])?;
                actions.push(step.action.clone());
                rewards.push(step.reward);
                row += 1;
            }
            if with_value_states {
                let seg = segments[segments.len() - 1];
                value_states.extend_from_slice(&states[seg.start * obs_dim..row * obs_dim]);
                let mut end = vec![0f32; obs_dim];
                write(snapshot.end_state(), &mut end)?;
                value_states.extend(end);
            }
        }

        Ok(Self {
            obs_dim,
            states,
            actions,
            rewards,
            segments,
            value_states: with_value_states.then_some(value_states),
        })
    }
}

impl<A> ExperienceBatch<A> {
    /// The number of transitions.
    pub fn len(&self) -> usize {
        self.rewards.len()
    }

    /// Returns `true` if the batch has no transition.
    pub fn is_empty(&self) -> bool {
        self.rewards.is_empty()
    }

    /// The number of rows of the value-state matrix.
    pub fn n_value_states(&self) -> usize {
        self.len() + self.segments.len()
    }

    /// Index of every transition row in the value-state matrix.
    pub fn transition_value_rows(&self) -> Vec<usize> {
        self.segments
            .iter()
            .flat_map(|seg| seg.value_start..seg.value_start + seg.len)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ReplayBuffer;

    #[derive(Debug, Clone)]
    struct Pair(f32, f32);

    impl Obs for Pair {
        fn dim(&self) -> usize {
            2
        }

        fn to_vector(&self, out: &mut [f32]) {
            out[0] = self.0;
            out[1] = self.1;
        }
    }

    fn buffer() -> Result<ReplayBuffer<Pair, usize>> {
        let buffer = ReplayBuffer::new();
        let t = buffer.emplace_trajectory(Pair(0.0, 0.0))?;
        {
            let mut t = t.lock().unwrap();
            t.add_transition(0, 1.0, Pair(1.0, 1.0))?;
            t.add_transition(1, 2.0, Pair(2.0, 2.0))?;
            t.freeze();
        }
        // Compacted open trajectory without transitions.
        buffer.emplace_trajectory(Pair(9.0, 9.0))?;
        let t = buffer.emplace_trajectory(Pair(5.0, 5.0))?;
        t.lock().unwrap().add_transition(2, 3.0, Pair(6.0, 6.0))?;
        Ok(buffer)
    }

    #[test]
    fn test_from_snapshots() -> Result<()> {
        let mut buffer = buffer()?;
        let snapshots = buffer.sample_snapshot()?;
        let batch = ExperienceBatch::from_snapshots(&snapshots, true)?;

        assert_eq!(batch.len(), 3);
        assert_eq!(batch.states, vec![0.0, 0.0, 1.0, 1.0, 5.0, 5.0]);
        assert_eq!(batch.actions, vec![0, 1, 2]);
        assert_eq!(batch.rewards, vec![1.0, 2.0, 3.0]);
        assert_eq!(batch.segments.len(), 2);
        assert!(batch.segments[0].frozen);
        assert!(!batch.segments[1].frozen);
        assert_eq!(batch.segments[1].range(), 2..3);
        assert_eq!(batch.segments[1].value_range(), 3..5);
        assert_eq!(
            batch.value_states.as_deref(),
            Some(&[0.0, 0.0, 1.0, 1.0, 2.0, 2.0, 5.0, 5.0, 6.0, 6.0][..])
        );
        assert_eq!(batch.n_value_states(), 5);
        assert_eq!(batch.transition_value_rows(), vec![0, 1, 3]);
        Ok(())
    }

    #[test]
    fn test_empty_inputs_are_rejected() -> Result<()> {
        let mut buffer = ReplayBuffer::<Pair, usize>::new();
        let snapshots = buffer.sample_snapshot()?;
        let err = ExperienceBatch::from_snapshots(&snapshots, false).unwrap_err();
        assert_eq!(
            err.downcast_ref::<StriderError>(),
            Some(&StriderError::EmptySnapshot)
        );
        drop(snapshots);

        buffer.emplace_trajectory(Pair(0.0, 0.0))?;
        let snapshots = buffer.sample_snapshot()?;
        let err = ExperienceBatch::from_snapshots(&snapshots, false).unwrap_err();
        assert_eq!(
            err.downcast_ref::<StriderError>(),
            Some(&StriderError::EmptyTrajectory)
        );
        Ok(())
    }
}
