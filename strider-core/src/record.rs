//! Types and traits for recording training metrics.
//!
//! Learner steps, rollout phases and evaluation runs all return a [`Record`].
//! The [`Trainer`](crate::Trainer) hands records to a [`Recorder`], which
//! either writes them immediately or stores them and writes an aggregate
//! every few iterations.
//!
//! ```rust
//! use strider_core::record::{Record, RecordValue};
//!
//! let mut record = Record::from_scalar("loss_policy", 0.25);
//! record.insert("advantages", RecordValue::Array1(vec![0.5, -0.5]));
//! assert_eq!(record.get_scalar("loss_policy").unwrap(), 0.25);
//! ```
mod base;
mod buffered_recorder;
mod null_recorder;
mod recorder;
mod storage;

pub use base::{Record, RecordValue};
pub use buffered_recorder::BufferedRecorder;
pub use null_recorder::NullRecorder;
pub use recorder::Recorder;
pub use storage::RecordStorage;
