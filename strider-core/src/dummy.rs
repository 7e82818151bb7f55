//! Environment used in tests.
use crate::{Env, Objective, Obs};
use crate::action::DiscreteAction;
use anyhow::Result;

/// Remaining steps of a countdown.
#[derive(Debug, Clone, PartialEq)]
pub struct CountdownObs(pub i32);

impl Obs for CountdownObs {
    fn dim(&self) -> usize {
        1
    }

    fn to_vector(&self, out: &mut [f32]) {
        out[0] = self.0 as f32;
    }
}

/// Ends after a fixed number of steps. Action 1 skips one extra step.
pub struct Countdown {
    length: i32,
    remaining: i32,
}

impl Env for Countdown {
    type Config = i32;
    type Obs = CountdownObs;
    type Act = DiscreteAction;

    fn build(config: &i32, _seed: i64) -> Result<Self> {
        Ok(Self {
            length: *config,
            remaining: *config,
        })
    }

    fn apply(&mut self, act: &DiscreteAction, _id: usize) -> Result<()> {
        self.remaining -= 1 + act.choice() as i32;
        Ok(())
    }

    fn view(&self, _id: usize) -> CountdownObs {
        CountdownObs(self.remaining)
    }

    fn reset(&mut self, _id: usize) -> Result<()> {
        self.remaining = self.length;
        Ok(())
    }
}

/// One unit of reward per step, terminal at zero.
#[derive(Clone)]
pub struct UnitReward;

impl Objective<CountdownObs> for UnitReward {
    fn reward(&self, _prev: &CountdownObs, _curr: &CountdownObs) -> f32 {
        1.0
    }

    fn is_terminal(&self, obs: &CountdownObs) -> bool {
        obs.0 <= 0
    }
}
