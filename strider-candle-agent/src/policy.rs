//! Policies backed by a [`Model`](crate::Model).
use crate::mlp::Mlp;
use anyhow::Result;
use candle_core::{Tensor, D};
use rand::RngCore;
use strider_core::{DiscreteAction, Env, Obs, Policy};

fn logits(network: &Mlp, device: &candle_core::Device, obs: &impl Obs) -> Result<Tensor> {
    let mut x = vec![0f32; obs.dim()];
    obs.to_vector(&mut x);
    let xs = Tensor::from_vec(x, (1, obs.dim()), device)?;
    Ok(network.forward(&xs)?)
}

/// Samples actions from the softmax of the network outputs.
///
/// Actions carry the distribution they were sampled from.
#[derive(Clone, Debug)]
pub struct StochasticModelPolicy {
    network: Mlp,
    device: candle_core::Device,
}

impl StochasticModelPolicy {
    /// Constructs a policy sharing the parameters of `model`.
    pub fn new(model: &crate::Model) -> Self {
        Self {
            network: model.network(),
            device: model.device().clone(),
        }
    }

    /// Action probabilities on an observation.
    pub fn probs(&self, obs: &impl Obs) -> Result<Vec<f32>> {
        let logits = logits(&self.network, &self.device, obs)?;
        let probs = candle_nn::ops::softmax(&logits, D::Minus1)?;
        Ok(probs.flatten_all()?.to_vec1::<f32>()?)
    }
}

impl<E> Policy<E> for StochasticModelPolicy
where
    E: Env<Act = DiscreteAction>,
{
    fn react(&self, obs: &E::Obs, rng: &mut dyn RngCore) -> Result<DiscreteAction> {
        let probs = self.probs(obs)?;
        DiscreteAction::from_vector(&probs, rng)
    }
}

/// Takes the action with the highest network output.
#[derive(Clone, Debug)]
pub struct DeterministicModelPolicy {
    network: Mlp,
    device: candle_core::Device,
}

impl DeterministicModelPolicy {
    /// Constructs a policy sharing the parameters of `model`.
    pub fn new(model: &crate::Model) -> Self {
        Self {
            network: model.network(),
            device: model.device().clone(),
        }
    }
}

impl<E> Policy<E> for DeterministicModelPolicy
where
    E: Env<Act = DiscreteAction>,
{
    fn react(&self, obs: &E::Obs, _rng: &mut dyn RngCore) -> Result<DiscreteAction> {
        let scores = logits(&self.network, &self.device, obs)?
            .flatten_all()?
            .to_vec1::<f32>()?;
        DiscreteAction::from_vector_deterministic(&scores)
    }
}
