//! Models, policies and learners implemented with
//! [candle](https://crates.io/crates/candle-core).
//!
//! A learner owns its [`Model`]s. Policies used for rollouts are built from a
//! model and share its parameters, so they act with the latest parameters
//! once the learner has updated them.
pub mod actor_critic;
pub mod mlp;
pub mod model;
pub mod opt;
pub mod pg;
pub mod policy;
use anyhow::Result;
use serde::{Deserialize, Serialize};
pub use model::{Model, ModelConfig, OutputActivation, OutputGrad};

#[derive(Clone, Debug, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
/// Device for using candle.
///
/// This enum is added because [`candle_core::Device`] does not support serialization.
pub enum Device {
    /// The main CPU device.
    #[default]
    Cpu,

    /// The main GPU device.
    Cuda(usize),
}

impl Device {
    /// Creates the candle device.
    pub fn to_candle(self) -> Result<candle_core::Device> {
        match self {
            Self::Cpu => Ok(candle_core::Device::Cpu),
            Self::Cuda(n) => Ok(candle_core::Device::new_cuda(n)?),
        }
    }
}
