//! Vanilla policy gradient.
mod base;
mod config;
pub use base::PolicyGradient;
pub(crate) use base::{check_advantages, reinforce_rows};
pub use config::PgConfig;
