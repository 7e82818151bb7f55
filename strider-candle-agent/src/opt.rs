//! Optimizers.
use anyhow::Result;
use candle_core::{Tensor, Var};
use candle_nn::{Optimizer as _, SGD};
use candle_optimisers::adam::{Adam, ParamsAdam};
use serde::{Deserialize, Serialize};

/// Configuration of the optimizer of a [`Model`](crate::Model).
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub enum OptimizerConfig {
    /// Adam with the default moment decay rates.
    Adam {
        /// Learning rate.
        lr: f64,
    },

    /// Plain gradient descent.
    Sgd {
        /// Learning rate.
        lr: f64,
    },
}

impl OptimizerConfig {
    /// Constructs an optimizer over `vars`.
    pub fn build(&self, vars: Vec<Var>) -> Result<Optimizer> {
        match *self {
            Self::Adam { lr } => {
                let params = ParamsAdam {
                    lr,
                    ..ParamsAdam::default()
                };
                Ok(Optimizer::Adam(Adam::new(vars, params)?))
            }
            Self::Sgd { lr } => Ok(Optimizer::Sgd(SGD::new(vars, lr)?)),
        }
    }
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self::Adam { lr: 0.001 }
    }
}

/// An optimizer of candle, stepping on the variables it was built over.
pub enum Optimizer {
    Adam(Adam),
    Sgd(SGD),
}

impl Optimizer {
    /// Computes the gradients of `loss` and updates the variables.
    pub fn backward_step(&mut self, loss: &Tensor) -> Result<()> {
        match self {
            Self::Adam(opt) => opt.backward_step(loss)?,
            Self::Sgd(opt) => opt.backward_step(loss)?,
        }
        Ok(())
    }
}
