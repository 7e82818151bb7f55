//! Hand-coded baseline policies.
//!
//! Both policies score every bin and take the highest score, ties going to the
//! lowest index. Bins the item does not fit in score `-1`, so an overflowing
//! move is only taken when no bin can hold the item.
use crate::{BinPacking, BinPackingObs};
use anyhow::Result;
use rand::RngCore;
use strider_core::{DiscreteAction, Policy};

/// Puts the item into the bin it fills the most.
///
/// The score of a bin is the sum over both dimensions of the item size relative
/// to the remaining space.
#[derive(Debug, Clone, Copy, Default)]
pub struct BestFitPolicy;

impl BestFitPolicy {
    fn scores(obs: &BinPackingObs) -> Vec<f32> {
        let (iw, ih) = (obs.item.0 as f32, obs.item.1 as f32);
        (0..obs.bins.len())
            .map(|i| {
                if !obs.fits(i) {
                    return -1.0;
                }
                let (bw, bh) = obs.bins[i];
                iw / bw as f32 + ih / bh as f32
            })
            .collect()
    }
}

impl Policy<BinPacking> for BestFitPolicy {
    fn react(&self, obs: &BinPackingObs, _rng: &mut dyn RngCore) -> Result<DiscreteAction> {
        DiscreteAction::from_vector_deterministic(&Self::scores(obs))
    }
}

/// Avoids leaving a bin with a residual no item can use.
///
/// A bin scores `0` if placing the item would leave exactly half the capacity
/// in one dimension and nothing in the other, `1` otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct MinWastePolicy;

impl MinWastePolicy {
    fn scores(obs: &BinPackingObs) -> Vec<f32> {
        let half = (obs.capacity.0 / 2, obs.capacity.1 / 2);
        (0..obs.bins.len())
            .map(|i| {
                if !obs.fits(i) {
                    return -1.0;
                }
                let bin = obs.bins[i];
                let residual = (bin.0 - obs.item.0, bin.1 - obs.item.1);
                if residual == (half.0, 0) || residual == (0, half.1) {
                    0.0
                } else {
                    1.0
                }
            })
            .collect()
    }
}

impl Policy<BinPacking> for MinWastePolicy {
    fn react(&self, obs: &BinPackingObs, _rng: &mut dyn RngCore) -> Result<DiscreteAction> {
        DiscreteAction::from_vector_deterministic(&Self::scores(obs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::SmallRng, SeedableRng};

    fn obs(bins: Vec<(i32, i32)>, item: (i32, i32)) -> BinPackingObs {
        BinPackingObs {
            bins,
            item,
            capacity: (8, 8),
        }
    }

    #[test]
    fn test_best_fit_prefers_fullest_bin() -> Result<()> {
        let mut rng = SmallRng::seed_from_u64(0);
        let o = obs(vec![(8, 8), (4, 4), (3, 8), (4, 2)], (4, 2));
        assert_eq!(BestFitPolicy::scores(&o), vec![0.75, 1.5, -1.0, 2.0]);

        let a = <BestFitPolicy as Policy<BinPacking>>::react(&BestFitPolicy, &o, &mut rng)?;
        assert_eq!(a.choice(), 3);
        assert_eq!(a.distribution(), None);
        Ok(())
    }

    #[test]
    fn test_min_waste_avoids_half_residual() -> Result<()> {
        let mut rng = SmallRng::seed_from_u64(0);
        // Bin 0 would be left with (4, 0) and bin 1 with (0, 4).
        let o = obs(vec![(8, 2), (4, 6), (8, 8), (2, 2)], (4, 2));
        assert_eq!(MinWastePolicy::scores(&o), vec![0.0, 0.0, 1.0, -1.0]);

        let a = <MinWastePolicy as Policy<BinPacking>>::react(&MinWastePolicy, &o, &mut rng)?;
        assert_eq!(a.choice(), 2);
        Ok(())
    }

    #[test]
    fn test_nothing_fits_takes_first_bin() -> Result<()> {
        let mut rng = SmallRng::seed_from_u64(0);
        let o = obs(vec![(1, 1), (2, 1)], (4, 2));
        let a = <MinWastePolicy as Policy<BinPacking>>::react(&MinWastePolicy, &o, &mut rng)?;
        assert_eq!(a.choice(), 0);
        let a = <BestFitPolicy as Policy<BinPacking>>::react(&BestFitPolicy, &o, &mut rng)?;
        assert_eq!(a.choice(), 0);
        Ok(())
    }
}
