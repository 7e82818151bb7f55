//! Core functionalities.
mod env;
mod objective;
mod policy;
pub use env::Env;
pub use objective::Objective;
pub use policy::{Policy, RandomPolicy};
use std::fmt::Debug;

/// An observation of an environment.
///
/// Observations are marshalled into flat `f32` rows when a learner builds the
/// state matrix of a batch.
pub trait Obs: Clone + Debug + Send + 'static {
    /// Returns the length of the flattened observation.
    fn dim(&self) -> usize;

    /// Writes the flattened observation into `out`.
    ///
    /// `out.len()` is equal to [`Obs::dim`].
    fn to_vector(&self, out: &mut [f32]);
}

/// An action applied to an environment.
pub trait Act: Clone + Debug + Send + 'static {}
