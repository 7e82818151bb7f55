//! Policy-gradient reinforcement learning in Rust.
//!
//! Strider consists of the following crates:
//!
//! * [strider-core](strider_core) provides the environment and policy traits,
//!   the trajectory data model, the shared replay buffer, rollout agents,
//!   credit-assignment functions and the synchronous trainer.
//! * [strider-candle-agent](strider_candle_agent) implements models on
//!   [candle](https://crates.io/crates/candle-core) and the learners: vanilla
//!   policy gradient, actor-critic with generalized advantage estimation,
//!   PPO with a clipped surrogate and PPO with an adaptive KL penalty.
//! * [strider-bin-packing](strider_bin_packing) is a two-dimensional
//!   bin-packing environment with hand-coded baseline policies.
//! * [strider-tensorboard](strider_tensorboard) has `TensorboardRecorder`
//!   to write records which can be shown in Tensorboard.
//! * [strider](crate) is a collection of examples, with helpers shared
//!   between them in [`util`].
pub mod util;
