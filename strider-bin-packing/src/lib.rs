#![warn(missing_docs)]
//! Two-dimensional bin packing for [`strider`](https://crates.io/crates/strider).
//!
//! An episode starts with a row of empty bins of equal capacity. At every step
//! one item is drawn, either large or small, and the agent chooses the bin to
//! put it in. The episode ends as soon as a bin overflows in either
//! dimension, so the return of an episode is the number of items placed.
//!
//! ```no_run
//! use anyhow::Result;
//! use strider_bin_packing::{BestFitPolicy, BinPacking, BinPackingConfig, BinPackingObjective};
//! use strider_core::{DefaultEvaluator, Evaluator as _};
//!
//! fn main() -> Result<()> {
//!     let config = BinPackingConfig::default();
//!     let mut evaluator =
//!         DefaultEvaluator::<BinPacking, _>::new(&config, BinPackingObjective, 42, 100)?;
//!     let record = evaluator.evaluate(&BestFitPolicy)?;
//!     println!("{:?}", record.get_scalar("episode_return")?);
//!     Ok(())
//! }
//! ```
mod config;
mod env;
mod objective;
mod obs;
mod policy;

pub use config::BinPackingConfig;
pub use env::BinPacking;
pub use objective::BinPackingObjective;
pub use obs::BinPackingObs;
pub use policy::{BestFitPolicy, MinWastePolicy};
