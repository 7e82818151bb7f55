//! Configuration of [`PolicyGradient`](super::PolicyGradient).
use crate::{Device, ModelConfig};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`PolicyGradient`](super::PolicyGradient).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct PgConfig {
    /// Policy model, with a softmax output over the actions.
    pub policy: Option<ModelConfig>,

    /// Discount factor.
    pub gamma: f32,

    /// Device.
    pub device: Device,
}

impl Default for PgConfig {
    fn default() -> Self {
        Self {
            policy: None,
            gamma: 1.0,
            device: Device::Cpu,
        }
    }
}

impl PgConfig {
    /// Sets the policy model.
    pub fn policy(mut self, v: ModelConfig) -> Self {
        self.policy = Some(v);
        self
    }

    /// Sets the discount factor.
    pub fn gamma(mut self, v: f32) -> Self {
        self.gamma = v;
        self
    }

    /// Sets the device.
    pub fn device(mut self, v: Device) -> Self {
        self.device = v;
        self
    }

    pub(crate) fn policy_config(&self) -> Result<ModelConfig> {
        self.policy.clone().context("policy is not set")
    }

    /// Loads [`PgConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`PgConfig`] as YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
