#![warn(missing_docs)]
//! Experience collection and replay core for policy-gradient training.
//!
//! Rollout workers ([`Agent`]) step their own environments with a shared
//! [`Policy`] and append transitions into a shared [`ReplayBuffer`]. After all
//! workers are joined, a [`Learner`] takes a [`Snapshot`] of the buffer,
//! computes advantages and updates its models, and the buffer is compacted
//! with [`ReplayBuffer::forget`] before the next rollout phase.
pub mod action;
pub mod advantage;
pub mod error;
pub mod record;
pub mod replay_buffer;
pub mod trajectory;

mod agent;
mod base;
#[cfg(test)]
mod dummy;
mod evaluator;
mod learner;
mod trainer;

pub use action::DiscreteAction;
pub use agent::{Agent, StepStatus};
pub use base::{Act, Env, Objective, Obs, Policy, RandomPolicy};
pub use error::StriderError;
pub use evaluator::{DefaultEvaluator, Evaluator};
pub use learner::Learner;
pub use replay_buffer::{ExperienceBatch, ReplayBuffer, Snapshot, TrajectoryHandle};
pub use trainer::{RolloutConfig, Trainer, TrainerConfig};
pub use trajectory::{StepView, Trajectory, Transition};
