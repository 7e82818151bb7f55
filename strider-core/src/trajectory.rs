//! Transitions and trajectories.
//!
//! Transitions are stored in an append-only vector. The start state of the
//! transition at index `i` is the end state of the transition at `i - 1`, or
//! the opening state of the trajectory for `i == 0`. Start states are resolved
//! by index on access, so no back-references need to be maintained.
use crate::error::StriderError;
use anyhow::Result;

/// One step of a rollout, without its start state.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition<O, A> {
    /// Action taken.
    pub action: A,

    /// Reward received for the action.
    pub reward: f32,

    /// Observation after the action.
    pub end_state: O,
}

/// A transition together with the state it started from.
#[derive(Debug)]
pub struct StepView<'a, O, A> {
    /// Observation before the action.
    pub start_state: &'a O,

    /// Action taken.
    pub action: &'a A,

    /// Reward received for the action.
    pub reward: f32,

    /// Observation after the action.
    pub end_state: &'a O,
}

impl<O, A> Clone for StepView<'_, O, A> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<O, A> Copy for StepView<'_, O, A> {}

/// Ordered record of one episode, or of a segment of a continuing rollout.
#[derive(Debug, Clone)]
pub struct Trajectory<O, A> {
    opening: O,
    transitions: Vec<Transition<O, A>>,
    frozen: bool,
}

impl<O, A> Trajectory<O, A> {
    /// Opens a trajectory at the given state.
    pub fn new(opening: O) -> Self {
        Self {
            opening,
            transitions: Vec::new(),
            frozen: false,
        }
    }

    /// Appends a transition starting from [`Trajectory::last_state`].
    pub fn add_transition(&mut self, action: A, reward: f32, end_state: O) -> Result<()> {
        if self.frozen {
            return Err(StriderError::FrozenTrajectory.into());
        }
        self.transitions.push(Transition {
            action,
            reward,
            end_state,
        });
        Ok(())
    }

    /// The state the next transition will start from.
    pub fn last_state(&self) -> &O {
        match self.transitions.last() {
            Some(t) => &t.end_state,
            None => &self.opening,
        }
    }

    /// The opening state.
    pub fn opening(&self) -> &O {
        &self.opening
    }

    /// The number of transitions.
    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    /// Returns `true` if the trajectory has no transition.
    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    /// Marks the trajectory as ended. It is read-only afterwards.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    /// Returns `true` if the trajectory has ended.
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Transitions in temporal order.
    pub fn transitions(&self) -> &[Transition<O, A>] {
        &self.transitions
    }

    /// The state transition `ix` started from.
    pub fn start_state(&self, ix: usize) -> Option<&O> {
        match ix {
            0 => Some(&self.opening),
            _ if ix <= self.transitions.len() => Some(&self.transitions[ix - 1].end_state),
            _ => None,
        }
    }

    /// Returns the transition at `ix` with its start state.
    pub fn get(&self, ix: usize) -> Option<StepView<'_, O, A>> {
        let t = self.transitions.get(ix)?;
        Some(StepView {
            start_state: self.start_state(ix)?,
            action: &t.action,
            reward: t.reward,
            end_state: &t.end_state,
        })
    }

    /// Iterates over transitions with their start states.
    pub fn iter(&self) -> impl Iterator<Item = StepView<'_, O, A>> + '_ {
        let starts = std::iter::once(&self.opening).chain(self.transitions.iter().map(|t| &t.end_state));
        starts.zip(self.transitions.iter()).map(|(start_state, t)| StepView {
            start_state,
            action: &t.action,
            reward: t.reward,
            end_state: &t.end_state,
        })
    }

    /// Sum of rewards over the transitions.
    pub fn total_reward(&self) -> f32 {
        self.transitions.iter().map(|t| t.reward).sum()
    }

    /// Drops every transition and reopens at the last end state.
    ///
    /// Does nothing if the trajectory is empty.
    pub(crate) fn compact(&mut self) {
        if let Some(last) = self.transitions.pop() {
            self.opening = last.end_state;
            self.transitions.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trajectory(n: usize) -> Trajectory<i32, usize> {
        let mut t = Trajectory::new(0);
        for i in 0..n {
            t.add_transition(i, 1.0, (i + 1) as i32 * 10).unwrap();
        }
        t
    }

    #[test]
    fn test_start_states_follow_previous_end_states() {
        let t = trajectory(3);
        let starts = t.iter().map(|s| *s.start_state).collect::<Vec<_>>();
        let ends = t.iter().map(|s| *s.end_state).collect::<Vec<_>>();
        assert_eq!(starts, vec![0, 10, 20]);
        assert_eq!(ends, vec![10, 20, 30]);
        assert_eq!(t.start_state(3), Some(&30));
        assert_eq!(t.start_state(4), None);
        assert_eq!(*t.get(1).unwrap().start_state, 10);
        assert!(t.get(3).is_none());
    }

    #[test]
    fn test_last_state() {
        let mut t = trajectory(0);
        assert_eq!(*t.last_state(), 0);
        t.add_transition(0, 0.0, 7).unwrap();
        assert_eq!(*t.last_state(), 7);
    }

    #[test]
    fn test_frozen_rejects_append() {
        let mut t = trajectory(2);
        t.freeze();
        let err = t.add_transition(0, 0.0, 1).unwrap_err();
        assert_eq!(
            err.downcast_ref::<StriderError>(),
            Some(&StriderError::FrozenTrajectory)
        );
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn test_compact_keeps_last_end_state() {
        let mut t = trajectory(3);
        t.compact();
        assert!(t.is_empty());
        assert_eq!(*t.opening(), 30);

        let mut empty = trajectory(0);
        empty.compact();
        assert_eq!(*empty.opening(), 0);
    }
}
