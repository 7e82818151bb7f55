//! Actor-critic learners with generalized advantage estimation.
//!
//! [`ActorCriticLearner`] fits a state-value model and estimates advantages
//! with GAE. The policy update is pluggable through [`PolicyUpdate`]:
//!
//! * [`ActorCritic`] takes one vanilla policy-gradient step.
//! * [`Ppo`] takes several steps on the clipped surrogate objective.
//! * [`KlPpo`] takes several steps with an adaptive KL penalty.
mod base;
mod config;
mod update;
pub use base::ActorCriticLearner;
pub use config::{ActorCriticConfig, ClipConfig, KlPenaltyConfig, VanillaConfig};
pub use update::{AdaptiveKlPenalty, ClippedSurrogate, PolicyUpdate, Vanilla};

/// Actor-critic with a vanilla policy-gradient step.
pub type ActorCritic = ActorCriticLearner<Vanilla>;

/// Proximal policy optimization with a clipped surrogate objective.
pub type Ppo = ActorCriticLearner<ClippedSurrogate>;

/// Proximal policy optimization with an adaptive KL penalty.
pub type KlPpo = ActorCriticLearner<AdaptiveKlPenalty>;
