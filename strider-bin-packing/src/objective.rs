//! Reward and termination of bin packing.
use crate::BinPackingObs;
use strider_core::Objective;

/// One unit of reward for every item placed without overflow.
///
/// An episode ends as soon as any bin has a negative dimension, and the
/// overflowing step earns nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct BinPackingObjective;

impl Objective<BinPackingObs> for BinPackingObjective {
    fn reward(&self, _prev: &BinPackingObs, curr: &BinPackingObs) -> f32 {
        if self.is_terminal(curr) {
            0.0
        } else {
            1.0
        }
    }

    fn is_terminal(&self, obs: &BinPackingObs) -> bool {
        obs.overflowed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reward_and_termination() {
        let prev = BinPackingObs::new(2, (8, 8));
        let mut curr = prev.clone();
        curr.bins[0] = (4, 6);
        assert!(!BinPackingObjective.is_terminal(&curr));
        assert_eq!(BinPackingObjective.reward(&prev, &curr), 1.0);

        curr.bins[1] = (8, -2);
        assert!(BinPackingObjective.is_terminal(&curr));
        assert_eq!(BinPackingObjective.reward(&prev, &curr), 0.0);
    }
}
