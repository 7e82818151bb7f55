//! Observation of [`BinPacking`](crate::BinPacking).
use strider_core::Obs;

/// Remaining space of every bin and the item to be placed.
///
/// A bin with a negative dimension has overflowed.
#[derive(Debug, Clone, PartialEq)]
pub struct BinPackingObs {
    /// Remaining `(width, height)` of each bin.
    pub bins: Vec<(i32, i32)>,

    /// Shape of the item to be placed.
    pub item: (i32, i32),

    /// Capacity of an empty bin.
    pub capacity: (i32, i32),
}

impl BinPackingObs {
    /// Empty bins with no item.
    pub fn new(num_bins: usize, capacity: (i32, i32)) -> Self {
        Self {
            bins: vec![capacity; num_bins],
            item: (0, 0),
            capacity,
        }
    }

    /// Returns `true` if the item fits in bin `ix`.
    pub fn fits(&self, ix: usize) -> bool {
        let bin = self.bins[ix];
        self.item.0 <= bin.0 && self.item.1 <= bin.1
    }

    /// Returns `true` if any bin has overflowed.
    pub fn overflowed(&self) -> bool {
        self.bins.iter().any(|b| b.0 < 0 || b.1 < 0)
    }
}

impl Obs for BinPackingObs {
    fn dim(&self) -> usize {
        4 * self.bins.len()
    }

    /// One row of four values per bin: the remaining bin shape and the item
    /// shape, both relative to the capacity.
    fn to_vector(&self, out: &mut [f32]) {
        let (cw, ch) = (self.capacity.0 as f32, self.capacity.1 as f32);
        for (row, bin) in out.chunks_exact_mut(4).zip(&self.bins) {
            row[0] = bin.0 as f32 / cw;
            row[1] = bin.1 as f32 / ch;
            row[2] = self.item.0 as f32 / cw;
            row[3] = self.item.1 as f32 / ch;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_vector() {
        let mut obs = BinPackingObs::new(2, (8, 4));
        obs.bins[1] = (2, 0);
        obs.item = (4, 2);

        let mut v = vec![0.0; obs.dim()];
        obs.to_vector(&mut v);
        assert_eq!(v, vec![1.0, 1.0, 0.5, 0.5, 0.25, 0.0, 0.5, 0.5]);
    }

    #[test]
    fn test_fits_and_overflow() {
        let mut obs = BinPackingObs::new(2, (8, 8));
        obs.item = (4, 2);
        obs.bins[0] = (3, 8);
        assert!(!obs.fits(0));
        assert!(obs.fits(1));
        assert!(!obs.overflowed());
        obs.bins[0] = (-1, 6);
        assert!(obs.overflowed());
    }
}
