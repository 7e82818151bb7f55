//! Errors in the library.
use thiserror::Error;

/// Errors in the library.
///
/// Shape and contract violations indicate a programming defect. They abort the
/// current call and are never retried.
#[derive(Error, Debug, PartialEq)]
pub enum StriderError {
    /// Two collections that must agree in length do not.
    #[error("Shape mismatch in {what}: expected {expected}, got {actual}")]
    ShapeMismatch {
        /// What was being compared.
        what: &'static str,
        /// Expected length.
        expected: usize,
        /// Actual length.
        actual: usize,
    },

    /// A learner was given a snapshot without any trajectory.
    #[error("Snapshot of the replay buffer contains no trajectory")]
    EmptySnapshot,

    /// A trajectory without transitions was read where one is required.
    #[error("Trajectory contains no transition")]
    EmptyTrajectory,

    /// A transition was appended to a frozen trajectory.
    #[error("Trajectory is frozen and read-only")]
    FrozenTrajectory,

    /// The action carries no cached sampling distribution.
    #[error("Action was not sampled from a distribution")]
    MissingDistribution,

    /// The given vector is not a valid probability distribution.
    #[error("Invalid distribution: {0}")]
    InvalidDistribution(String),

    /// The action index is out of range.
    #[error("Invalid action {choice} for cardinality {cardinality}")]
    InvalidAction {
        /// Chosen index.
        choice: usize,
        /// Number of available actions.
        cardinality: usize,
    },

    /// A lock was poisoned by a panicking thread.
    #[error("Lock poisoned: {0}")]
    LockPoisoned(&'static str),

    /// A rollout worker thread panicked.
    #[error("Rollout worker {0} panicked")]
    WorkerPanicked(usize),

    /// Record key error.
    #[error("Record key error: {0}")]
    RecordKeyError(String),

    /// Record value type error.
    #[error("Record value type error: {0}")]
    RecordValueTypeError(String),
}
