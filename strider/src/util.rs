//! Helpers shared by the bin-packing examples.
use log::info;
use strider_bin_packing::BinPackingConfig;
use strider_candle_agent::{
    mlp::MlpConfig, opt::OptimizerConfig, ModelConfig, OutputActivation,
};
use strider_core::record::{NullRecorder, Recorder};
use strider_tensorboard::TensorboardRecorder;

/// Policy model over the bins of `env`: an MLP with a softmax output.
pub fn policy_model_config(env: &BinPackingConfig, units: Vec<usize>, lr: f64) -> ModelConfig {
    let mlp = MlpConfig::new(env.obs_dim(), units, env.num_bins);
    ModelConfig::new(mlp, OutputActivation::Softmax).opt(OptimizerConfig::Adam { lr })
}

/// State-value model for `env`: an MLP with a single linear output.
pub fn value_model_config(env: &BinPackingConfig, units: Vec<usize>, lr: f64) -> ModelConfig {
    let mlp = MlpConfig::new(env.obs_dim(), units, 1);
    ModelConfig::new(mlp, OutputActivation::Identity).opt(OptimizerConfig::Adam { lr })
}

/// Writes to Tensorboard under `logdir` if given, discards records otherwise.
pub fn create_recorder(logdir: Option<&str>) -> Box<dyn Recorder> {
    match logdir {
        Some(dir) => {
            info!("Records are written in {}", dir);
            Box::new(TensorboardRecorder::new(dir))
        }
        None => Box::new(NullRecorder::new()),
    }
}
