//! Bin-packing environment.
use crate::{BinPackingConfig, BinPackingObs};
use anyhow::{anyhow, Result};
use log::trace;
use rand::{
    distributions::{Bernoulli, Distribution},
    rngs::SmallRng,
    SeedableRng,
};
use strider_core::{DiscreteAction, Env, StriderError};

/// Bin-packing environment.
///
/// Each instance holds a single state; the worker id passed by the agent is
/// ignored. Items are drawn from a generator seeded at construction.
pub struct BinPacking {
    config: BinPackingConfig,
    state: BinPackingObs,
    large: Bernoulli,
    rng: SmallRng,
}

impl BinPacking {
    fn draw_item(&mut self) {
        self.state.item = if self.large.sample(&mut self.rng) {
            self.config.large_item
        } else {
            self.config.small_item
        };
    }
}

impl Env for BinPacking {
    type Config = BinPackingConfig;
    type Obs = BinPackingObs;
    type Act = DiscreteAction;

    fn build(config: &BinPackingConfig, seed: i64) -> Result<Self> {
        let large = Bernoulli::new(config.large_item_prob)
            .map_err(|e| anyhow!("large_item_prob {}: {}", config.large_item_prob, e))?;
        let mut env = Self {
            config: config.clone(),
            state: BinPackingObs::new(config.num_bins, config.capacity),
            large,
            rng: SmallRng::seed_from_u64(seed as u64),
        };
        env.draw_item();
        Ok(env)
    }

    /// Puts the current item into the chosen bin.
    ///
    /// A new item is drawn only if the bin did not overflow.
    fn apply(&mut self, act: &DiscreteAction, _id: usize) -> Result<()> {
        let ix = act.choice();
        let item = self.state.item;
        let bin = self
            .state
            .bins
            .get_mut(ix)
            .ok_or(StriderError::InvalidAction {
                choice: ix,
                cardinality: self.config.num_bins,
            })?;
        bin.0 -= item.0;
        bin.1 -= item.1;
        trace!("Placed {:?} into bin {}, remaining {:?}", item, ix, bin);

        if bin.0 < 0 || bin.1 < 0 {
            return Ok(());
        }
        self.draw_item();
        Ok(())
    }

    fn view(&self, _id: usize) -> BinPackingObs {
        self.state.clone()
    }

    fn reset(&mut self, _id: usize) -> Result<()> {
        self.state = BinPackingObs::new(self.config.num_bins, self.config.capacity);
        self.draw_item();
        Ok(())
    }
}
