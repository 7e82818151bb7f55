//! Replay buffer shared by rollout workers and the learner.
//!
//! Rollout workers only create trajectories, through
//! [`ReplayBuffer::emplace_trajectory`], and then append to the trajectory
//! they got back. The learner reads the buffer with
//! [`ReplayBuffer::sample_snapshot`] and prunes it with
//! [`ReplayBuffer::forget`]. Both take `&mut self`, and snapshots keep every
//! trajectory locked while they are alive, so reading and pruning can never
//! overlap with creation or appends.
mod base;
mod batch;
mod snapshot;
pub use base::{ReplayBuffer, SampledStep, TrajectoryHandle};
pub use batch::{ExperienceBatch, Segment};
pub use snapshot::Snapshot;
