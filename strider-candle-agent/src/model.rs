//! Neural network model with its own variables and optimizer.
use crate::{
    mlp::{Mlp, MlpConfig},
    opt::{Optimizer, OptimizerConfig},
    Device,
};
use anyhow::{anyhow, Result};
use candle_core::{DType, Tensor, D};
use candle_nn::{VarBuilder, VarMap};
use log::{info, trace};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};
use strider_core::StriderError;

/// Activation applied to the output of the network.
#[derive(Debug, Deserialize, Serialize, PartialEq, Eq, Clone, Copy, Default)]
pub enum OutputActivation {
    /// Raw outputs, e.g. for a state-value model.
    #[default]
    Identity,

    /// Softmax over the last dimension, e.g. for a policy over discrete
    /// actions.
    Softmax,
}

impl OutputActivation {
    fn apply(&self, xs: &Tensor) -> Result<Tensor> {
        match self {
            Self::Identity => Ok(xs.clone()),
            Self::Softmax => Ok(candle_nn::ops::softmax(xs, D::Minus1)?),
        }
    }
}

/// Which output the loss-gradient rows given to [`Model::step`] refer to.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum OutputGrad {
    /// The outputs after the activation.
    Output,

    /// The outputs of the last layer before the activation.
    Logits,
}

/// Configuration of [`Model`].
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct ModelConfig {
    /// Network.
    pub mlp: MlpConfig,

    /// Optimizer.
    pub opt: OptimizerConfig,

    /// Activation on the output.
    pub output: OutputActivation,
}

impl ModelConfig {
    /// Configuration of a model with the default optimizer.
    pub fn new(mlp: MlpConfig, output: OutputActivation) -> Self {
        Self {
            mlp,
            opt: OptimizerConfig::default(),
            output,
        }
    }

    /// Sets the optimizer.
    pub fn opt(mut self, v: OptimizerConfig) -> Self {
        self.opt = v;
        self
    }

    /// Returns the configuration if the model outputs a distribution over
    /// actions, which the learners differentiate through.
    pub(crate) fn check_policy(self) -> Result<Self> {
        if self.output != OutputActivation::Softmax {
            return Err(anyhow!(
                "Policy model needs a softmax output, got {:?}",
                self.output
            ));
        }
        Ok(self)
    }

    /// Loads [`ModelConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`ModelConfig`] as YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

/// A network together with its variables and optimizer.
pub struct Model {
    device: candle_core::Device,
    varmap: VarMap,
    network: Mlp,
    opt: Optimizer,
    config: ModelConfig,
}

impl Model {
    /// Constructs a model with freshly initialized parameters.
    pub fn build(config: ModelConfig, device: Device) -> Result<Self> {
        let device = device.to_candle()?;
        let varmap = VarMap::new();
        let network = {
            let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
            Mlp::build(vb, config.mlp.clone())?
        };
        let opt = config.opt.build(varmap.all_vars())?;

        Ok(Self {
            device,
            varmap,
            network,
            opt,
            config,
        })
    }

    /// Configuration.
    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// The network, sharing its parameters with the model.
    pub fn network(&self) -> Mlp {
        self.network.clone()
    }

    /// The candle device of the model.
    pub fn device(&self) -> &candle_core::Device {
        &self.device
    }

    /// Makes a `(batch_size, in_dim)` tensor from row-major values.
    pub fn input(&self, states: &[f32]) -> Result<Tensor> {
        let in_dim = self.config.mlp.in_dim();
        if in_dim == 0 || states.len() % in_dim != 0 {
            return Err(StriderError::ShapeMismatch {
                what: "model input",
                expected: in_dim,
                actual: states.len(),
            }
            .into());
        }
        Ok(Tensor::from_slice(
            states,
            (states.len() / in_dim, in_dim),
            &self.device,
        )?)
    }

    /// Forward pass including the output activation.
    pub fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        self.config.output.apply(&self.network.forward(xs)?)
    }

    /// Forward pass on row-major states, returning row-major outputs.
    pub fn forward_vec(&self, states: &[f32]) -> Result<Vec<f32>> {
        let xs = self.input(states)?;
        Ok(self.forward(&xs)?.flatten_all()?.to_vec1::<f32>()?)
    }

    /// Performs one optimizer step from per-row loss gradients.
    ///
    /// `loss_grad` receives the activated outputs on `states`, row-major, and
    /// returns the gradient of the loss with respect to the outputs selected
    /// by `wrt`, in the same layout. The parameters move along the gradient
    /// of `sum(outputs * loss_grad)`.
    pub fn step<F>(&mut self, states: &[f32], wrt: OutputGrad, loss_grad: F) -> Result<()>
    where
        F: FnOnce(&[f32]) -> Result<Vec<f32>>,
    {
        let xs = self.input(states)?;
        let logits = self.network.forward(&xs)?;
        let output = self.config.output.apply(&logits)?;
        let values = output.flatten_all()?.to_vec1::<f32>()?;
        let grad = loss_grad(&values)?;
        if grad.len() != values.len() {
            return Err(StriderError::ShapeMismatch {
                what: "loss gradient",
                expected: values.len(),
                actual: grad.len(),
            }
            .into());
        }

        let grad = Tensor::from_vec(grad, output.dims(), &self.device)?;
        let target = match wrt {
            OutputGrad::Output => &output,
            OutputGrad::Logits => &logits,
        };
        let surrogate = target.mul(&grad)?.sum_all()?;
        trace!("Surrogate loss {}", surrogate.to_scalar::<f32>()?);
        self.backward_step(&surrogate)
    }

    /// Regresses the outputs on `states` toward `targets` with mean squared
    /// error. Returns the loss before the update.
    pub fn regress(&mut self, states: &[f32], targets: &[f32]) -> Result<f32> {
        let xs = self.input(states)?;
        let pred = self.forward(&xs)?;
        let targets = Tensor::from_slice(targets, pred.dims(), &self.device)?;
        let loss = candle_nn::loss::mse(&pred, &targets)?;
        let value = loss.to_scalar::<f32>()?;
        self.backward_step(&loss)?;
        Ok(value)
    }

    /// Computes the gradients of `loss` and updates the parameters.
    pub fn backward_step(&mut self, loss: &Tensor) -> Result<()> {
        self.opt.backward_step(loss)
    }

    /// All parameters as a flat vector, variables ordered by name.
    pub fn parameters(&self) -> Result<Vec<f32>> {
        let data = self
            .varmap
            .data()
            .lock()
            .map_err(|_| StriderError::LockPoisoned("model variables"))?;
        let mut names = data.keys().collect::<Vec<_>>();
        names.sort();

        let mut params = Vec::new();
        for name in names {
            let var = &data[name];
            params.extend(var.as_tensor().flatten_all()?.to_vec1::<f32>()?);
        }
        Ok(params)
    }

    /// Overwrites all parameters from a flat vector laid out as in
    /// [`Model::parameters`].
    pub fn set_parameters(&self, params: &[f32]) -> Result<()> {
        let data = self
            .varmap
            .data()
            .lock()
            .map_err(|_| StriderError::LockPoisoned("model variables"))?;
        let mut names = data.keys().collect::<Vec<_>>();
        names.sort();

        let total = data.values().map(|v| v.elem_count()).sum::<usize>();
        if params.len() != total {
            return Err(StriderError::ShapeMismatch {
                what: "parameter vector",
                expected: total,
                actual: params.len(),
            }
            .into());
        }

        let mut offset = 0;
        for name in names {
            let var = &data[name];
            let n = var.elem_count();
            let t = Tensor::from_slice(&params[offset..offset + n], var.dims(), &self.device)?;
            var.set(&t)?;
            offset += n;
        }
        Ok(())
    }

    /// Saves the parameters in safetensors format.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        self.varmap.save(path.as_ref())?;
        info!("Saved model parameters to {:?}", path.as_ref());
        Ok(())
    }

    /// Loads the parameters saved with [`Model::save`].
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.varmap.load(path.as_ref())?;
        info!("Loaded model parameters from {:?}", path.as_ref());
        Ok(())
    }
}
