//! Configuration of [`BinPacking`](crate::BinPacking).
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`BinPacking`](crate::BinPacking).
///
/// Shapes are `(width, height)` pairs in integer units.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct BinPackingConfig {
    /// Number of bins, which is also the number of actions.
    pub num_bins: usize,

    /// Capacity of every bin.
    pub capacity: (i32, i32),

    /// Shape of a large item.
    pub large_item: (i32, i32),

    /// Shape of a small item.
    pub small_item: (i32, i32),

    /// Probability that the next item is large.
    pub large_item_prob: f64,
}

impl Default for BinPackingConfig {
    fn default() -> Self {
        Self {
            num_bins: 8,
            capacity: (8, 8),
            large_item: (4, 2),
            small_item: (1, 2),
            large_item_prob: 0.4,
        }
    }
}

impl BinPackingConfig {
    /// Sets the number of bins.
    pub fn num_bins(mut self, v: usize) -> Self {
        self.num_bins = v;
        self
    }

    /// Sets the bin capacity.
    pub fn capacity(mut self, v: (i32, i32)) -> Self {
        self.capacity = v;
        self
    }

    /// Sets the shape of a large item.
    pub fn large_item(mut self, v: (i32, i32)) -> Self {
        self.large_item = v;
        self
    }

    /// Sets the shape of a small item.
    pub fn small_item(mut self, v: (i32, i32)) -> Self {
        self.small_item = v;
        self
    }

    /// Sets the probability of drawing a large item.
    pub fn large_item_prob(mut self, v: f64) -> Self {
        self.large_item_prob = v;
        self
    }

    /// Length of a flattened observation.
    pub fn obs_dim(&self) -> usize {
        4 * self.num_bins
    }

    /// Loads [`BinPackingConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`BinPackingConfig`] as YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_serde_bin_packing_config() -> Result<()> {
        let config = BinPackingConfig::default().num_bins(4).capacity((6, 4));

        let dir = TempDir::new("bin_packing_config")?;
        let path = dir.path().join("bin_packing_config.yaml");
        config.save(&path)?;
        let config_ = BinPackingConfig::load(&path)?;
        assert_eq!(config, config_);
        assert_eq!(config_.obs_dim(), 16);
        Ok(())
    }
}
