//! Rollout worker.
use crate::{
    base::{Env, Objective, Policy},
    error::StriderError,
    replay_buffer::{ReplayBuffer, TrajectoryHandle},
};
use anyhow::Result;
use log::trace;
use rand::{rngs::SmallRng, SeedableRng};

/// Outcome of [`Agent::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    /// The episode goes on.
    Continue,

    /// The step reached a terminal state. The trajectory was frozen and the
    /// environment reset.
    EpisodeEnded,
}

#[cfg_attr(doc, aquamarine::aquamarine)]
/// Drives one environment instance and writes its experience into a
/// [`ReplayBuffer`].
///
/// ```mermaid
/// stateDiagram-v2
///     Idle --> Stepping: step() opens a trajectory
///     Stepping --> Stepping: step() on a non-terminal state
///     Stepping --> Idle: step() on a terminal state
/// ```
///
/// The agent owns its environment, its objective and its random number
/// generator. The policy and the buffer are shared with other agents and are
/// passed to every call.
pub struct Agent<E: Env, J> {
    id: usize,
    env: E,
    objective: J,
    rng: SmallRng,
    current: Option<TrajectoryHandle<E::Obs, E::Act>>,
}

impl<E, J> Agent<E, J>
where
    E: Env,
    J: Objective<E::Obs>,
{
    /// Constructs an agent.
    ///
    /// `seed` initializes the generator passed to the policy.
    pub fn new(id: usize, env: E, objective: J, seed: u64) -> Self {
        Self {
            id,
            env,
            objective,
            rng: SmallRng::seed_from_u64(seed),
            current: None,
        }
    }

    /// Identifier of the agent, used as the environment id.
    pub fn id(&self) -> usize {
        self.id
    }

    /// The environment.
    pub fn env(&self) -> &E {
        &self.env
    }

    /// Returns `true` if the agent writes an open trajectory.
    pub fn is_stepping(&self) -> bool {
        self.current.is_some()
    }

    /// Takes one step in the environment and appends the transition to the
    /// open trajectory, opening one first if needed.
    pub fn step<P>(
        &mut self,
        policy: &P,
        buffer: &ReplayBuffer<E::Obs, E::Act>,
    ) -> Result<StepStatus>
    where
        P: Policy<E> + ?Sized,
    {
        let handle = match &self.current {
            Some(handle) => handle.clone(),
            None => {
                let handle = buffer.emplace_trajectory(self.env.view(self.id))?;
                trace!("Agent {} opened a trajectory", self.id);
                self.current = Some(handle.clone());
                handle
            }
        };

        let prev = handle
            .lock()
            .map_err(|_| StriderError::LockPoisoned("trajectory"))?
            .last_state()
            .clone();
        let act = policy.react(&prev, &mut self.rng)?;
        self.env.apply(&act, self.id)?;
        let curr = self.env.view(self.id);
        let reward = self.objective.reward(&prev, &curr);
        let terminal = self.objective.is_terminal(&curr);

        {
            let mut trajectory = handle
                .lock()
                .map_err(|_| StriderError::LockPoisoned("trajectory"))?;
            trajectory.add_transition(act, reward, curr)?;
            if terminal {
                trajectory.freeze();
            }
        }

        if terminal {
            self.env.reset(self.id)?;
            self.current = None;
            Ok(StepStatus::EpisodeEnded)
        } else {
            Ok(StepStatus::Continue)
        }
    }

    /// Steps until an episode ends. Returns the number of steps taken.
    pub fn play_one_episode<P>(
        &mut self,
        policy: &P,
        buffer: &ReplayBuffer<E::Obs, E::Act>,
    ) -> Result<usize>
    where
        P: Policy<E> + ?Sized,
    {
        let mut n_steps = 1;
        while self.step(policy, buffer)? == StepStatus::Continue {
            n_steps += 1;
        }
        trace!("Agent {} ended an episode in {} steps", self.id, n_steps);
        Ok(n_steps)
    }

    /// Steps exactly `n` times regardless of episode boundaries. Returns the
    /// number of episodes that ended.
    ///
    /// The trajectory open at the end stays open and is continued by the next
    /// call.
    pub fn play_steps<P>(
        &mut self,
        n: usize,
        policy: &P,
        buffer: &ReplayBuffer<E::Obs, E::Act>,
    ) -> Result<usize>
    where
        P: Policy<E> + ?Sized,
    {
        let mut n_episodes = 0;
        for _ in 0..n {
            if self.step(policy, buffer)? == StepStatus::EpisodeEnded {
                n_episodes += 1;
            }
        }
        Ok(n_episodes)
    }

    /// Abandons the open trajectory and resets the environment.
    ///
    /// The abandoned trajectory is frozen so that the next
    /// [`ReplayBuffer::forget`] removes it.
    pub fn reset(&mut self) -> Result<()> {
        if let Some(handle) = self.current.take() {
            handle
                .lock()
                .map_err(|_| StriderError::LockPoisoned("trajectory"))?
                .freeze();
        }
        self.env.reset(self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dummy::{Countdown, CountdownObs, UnitReward},
        RandomPolicy,
    };

    fn agent(length: i32) -> Agent<Countdown, UnitReward> {
        let env = Countdown::build(&length, 0).unwrap();
        Agent::new(0, env, UnitReward, 42)
    }

    /// Always takes action 0.
    struct Stay;

    impl Policy<Countdown> for Stay {
        fn react(
            &self,
            _obs: &CountdownObs,
            _rng: &mut dyn rand::RngCore,
        ) -> Result<crate::DiscreteAction> {
            crate::DiscreteAction::with_distribution(0, vec![1.0, 0.0])
        }
    }

    #[test]
    fn test_step_opens_and_freezes() -> Result<()> {
        let mut buffer = ReplayBuffer::new();
        let mut agent = agent(2);
        assert!(!agent.is_stepping());
        assert_eq!(agent.step(&Stay, &buffer)?, StepStatus::Continue);
        assert!(agent.is_stepping());
        assert_eq!(agent.step(&Stay, &buffer)?, StepStatus::EpisodeEnded);
        assert!(!agent.is_stepping());
        assert_eq!(agent.env().view(0), CountdownObs(2));

        let snapshots = buffer.sample_snapshot()?;
        assert_eq!(snapshots.len(), 1);
        assert!(snapshots[0].frozen());
        let states = snapshots[0]
            .iter()
            .map(|s| (s.start_state.0, s.end_state.0))
            .collect::<Vec<_>>();
        assert_eq!(states, vec![(2, 1), (1, 0)]);
        Ok(())
    }

    #[test]
    fn test_play_one_episode() -> Result<()> {
        let mut buffer = ReplayBuffer::new();
        let mut agent = agent(3);
        for _ in 0..5 {
            assert_eq!(agent.play_one_episode(&Stay, &buffer)?, 3);
        }
        assert_eq!(buffer.len(), 5);
        assert_eq!(buffer.num_transitions(), 15);
        let snapshots = buffer.sample_snapshot()?;
        assert!(snapshots.iter().all(|s| s.frozen()));
        Ok(())
    }

    #[test]
    fn test_play_steps_keeps_trajectory_open() -> Result<()> {
        let mut buffer = ReplayBuffer::new();
        let mut agent = agent(4);
        assert_eq!(agent.play_steps(6, &Stay, &buffer)?, 1);
        assert!(agent.is_stepping());

        buffer.forget()?;
        assert_eq!(buffer.len(), 1);
        assert_eq!(agent.play_steps(2, &Stay, &buffer)?, 1);
        let snapshots = buffer.sample_snapshot()?;
        assert_eq!(snapshots.len(), 1);
        assert_eq!(*snapshots[0].opening(), CountdownObs(2));
        assert_eq!(snapshots[0].len(), 2);
        Ok(())
    }

    #[test]
    fn test_reset_freezes_open_trajectory() -> Result<()> {
        let mut buffer = ReplayBuffer::new();
        let mut agent = agent(10);
        let policy = RandomPolicy::new(2);
        agent.play_steps(2, &policy, &buffer)?;
        agent.reset()?;
        assert!(!agent.is_stepping());
        assert_eq!(agent.env().view(0), CountdownObs(10));
        buffer.forget()?;
        assert!(buffer.is_empty());
        Ok(())
    }
}
