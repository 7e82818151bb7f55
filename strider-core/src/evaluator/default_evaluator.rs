//! Evaluation by average episode return.
use super::Evaluator;
use crate::{
    agent::Agent,
    base::{Env, Objective, Policy},
    record::{Record, RecordValue},
    replay_buffer::ReplayBuffer,
};
use anyhow::Result;
use log::info;

/// Runs a fixed number of episodes in its own environment and reports the
/// average return.
///
/// Episodes are written to a private buffer, so evaluation never touches the
/// experience used for training.
pub struct DefaultEvaluator<E: Env, J> {
    n_episodes: usize,
    agent: Agent<E, J>,
    buffer: ReplayBuffer<E::Obs, E::Act>,
}

impl<E, J> DefaultEvaluator<E, J>
where
    E: Env,
    J: Objective<E::Obs>,
{
    /// Constructs an evaluator.
    pub fn new(config: &E::Config, objective: J, seed: i64, n_episodes: usize) -> Result<Self> {
        let env = E::build(config, seed)?;
        Ok(Self {
            n_episodes,
            agent: Agent::new(0, env, objective, seed as u64),
            buffer: ReplayBuffer::new(),
        })
    }
}

impl<E, J> Evaluator<E> for DefaultEvaluator<E, J>
where
    E: Env,
    J: Objective<E::Obs>,
{
    fn evaluate<P: Policy<E> + ?Sized>(&mut self, policy: &P) -> Result<Record> {
        self.agent.reset()?;
        self.buffer.forget()?;

        let mut n_steps = 0;
        for _ in 0..self.n_episodes {
            n_steps += self.agent.play_one_episode(policy, &self.buffer)?;
        }

        let returns = ReplayBuffer::total_rewards(&self.buffer.sample_snapshot()?);
        self.buffer.forget()?;

        let n = self.n_episodes.max(1) as f32;
        let episode_return = returns.iter().sum::<f32>() / n;
        info!(
            "Evaluated {} episodes, average return {}",
            self.n_episodes, episode_return
        );

        Ok(Record::from_slice(&[
            ("episode_return", RecordValue::Scalar(episode_return)),
            ("episode_length", RecordValue::Scalar(n_steps as f32 / n)),
        ]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dummy::{Countdown, UnitReward};
    use crate::RandomPolicy;

    #[test]
    fn test_average_return() -> Result<()> {
        let mut evaluator = DefaultEvaluator::<Countdown, _>::new(&4, UnitReward, 0, 3)?;
        let record = evaluator.evaluate(&RandomPolicy::new(1))?;
        assert_eq!(record.get_scalar("episode_return")?, 4.0);
        assert_eq!(record.get_scalar("episode_length")?, 4.0);

        // The private buffer is emptied between evaluations.
        let record = evaluator.evaluate(&RandomPolicy::new(1))?;
        assert_eq!(record.get_scalar("episode_return")?, 4.0);
        Ok(())
    }
}
