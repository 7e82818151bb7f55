use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::path::Path;
use strider::util::{create_recorder, policy_model_config, value_model_config};
use strider_bin_packing::{BinPacking, BinPackingConfig, BinPackingObjective};
use strider_candle_agent::{
    actor_critic::{
        ActorCritic, ActorCriticConfig, AdaptiveKlPenalty, ClipConfig, ClippedSurrogate,
        KlPenaltyConfig, KlPpo, PolicyUpdate, Ppo, Vanilla, VanillaConfig,
    },
    pg::{PgConfig, PolicyGradient},
    policy::{DeterministicModelPolicy, StochasticModelPolicy},
    Model,
};
use strider_core::{Learner, RolloutConfig, Trainer, TrainerConfig};

const UNITS: [usize; 2] = [64, 64];
const LR_POLICY: f64 = 0.001;
const LR_VALUE: f64 = 0.001;
const GAMMA: f32 = 0.99;
const KL_TARGET: f32 = 0.01;
const EPISODES_PER_WORKER: usize = 16;
const EVAL_INTERVAL: usize = 10;
const EVAL_EPISODES: usize = 100;
const MODEL_DIR: &str = "./strider/examples/model/bin_packing";

/// Learning algorithm.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Algo {
    /// Vanilla policy gradient.
    Pg,
    /// Actor-critic with generalized advantage estimation.
    Ac,
    /// PPO with a clipped surrogate objective.
    Ppo,
    /// PPO with an adaptive KL penalty.
    KlPpo,
}

impl Algo {
    fn name(&self) -> &'static str {
        match self {
            Self::Pg => "pg",
            Self::Ac => "ac",
            Self::Ppo => "ppo",
            Self::KlPpo => "kl_ppo",
        }
    }
}

/// Train a policy on the bin-packing environment
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Learning algorithm
    #[arg(short, long, value_enum, default_value_t = Algo::Pg)]
    algo: Algo,

    /// Number of learning iterations
    #[arg(long, default_value_t = 500)]
    max_iterations: usize,

    /// Number of rollout workers
    #[arg(short, long, default_value_t = 4)]
    n_workers: usize,

    /// Base random seed
    #[arg(long, default_value_t = 42)]
    seed: i64,

    /// Directory where the models and the configurations are saved
    #[arg(long)]
    model_dir: Option<String>,

    /// Write records for Tensorboard in the model directory
    #[arg(long, default_value_t = false)]
    tensorboard: bool,
}

impl Args {
    fn model_dir(&self) -> String {
        match &self.model_dir {
            Some(dir) => dir.clone(),
            None => format!("{}_{}", MODEL_DIR, self.algo.name()),
        }
    }
}

mod config {
    use super::*;

    pub fn trainer_config(args: &Args) -> TrainerConfig {
        TrainerConfig::default()
            .max_iterations(args.max_iterations)
            .n_workers(args.n_workers)
            .rollout(RolloutConfig::Episodes(EPISODES_PER_WORKER))
            .eval_interval(EVAL_INTERVAL)
            .eval_episodes(EVAL_EPISODES)
            .record_interval(1)
            .model_dir(args.model_dir())
            .seed(args.seed)
    }

    pub fn pg_config(env: &BinPackingConfig) -> PgConfig {
        PgConfig::default()
            .policy(policy_model_config(env, UNITS.to_vec(), LR_POLICY))
            .gamma(GAMMA)
    }

    pub fn ac_config<U: PolicyUpdate>(
        env: &BinPackingConfig,
        update: U::Config,
    ) -> ActorCriticConfig<U::Config> {
        ActorCriticConfig::default()
            .policy(policy_model_config(env, UNITS.to_vec(), LR_POLICY))
            .value(value_model_config(env, UNITS.to_vec(), LR_VALUE))
            .gamma(GAMMA)
            .update(update)
    }

    pub fn kl_penalty_config() -> KlPenaltyConfig {
        KlPenaltyConfig::default().d_target(KL_TARGET)
    }
}

/// Runs the trainer with policies reading the model of `learner`.
fn run<L>(
    args: &Args,
    env_config: &BinPackingConfig,
    mut learner: L,
    policy_model: fn(&L) -> &Model,
) -> Result<()>
where
    L: Learner<BinPacking>,
{
    let policy = StochasticModelPolicy::new(policy_model(&learner));
    let eval_policy = DeterministicModelPolicy::new(policy_model(&learner));
    let model_dir = args.model_dir();
    let mut recorder = create_recorder(args.tensorboard.then_some(model_dir.as_str()));
    let mut trainer = Trainer::<BinPacking, _>::build(
        config::trainer_config(args),
        env_config,
        BinPackingObjective,
    )?;

    trainer.train(&mut learner, &policy, &eval_policy, recorder.as_mut())?;
    learner.save_params(&Path::new(&model_dir).join("last"))?;
    Ok(())
}

fn train(args: &Args) -> Result<()> {
    let env_config = BinPackingConfig::default();
    let model_dir = args.model_dir();
    std::fs::create_dir_all(&model_dir)?;
    env_config.save(Path::new(&model_dir).join("env.yaml"))?;
    config::trainer_config(args).save(Path::new(&model_dir).join("trainer.yaml"))?;

    match args.algo {
        Algo::Pg => {
            let config = config::pg_config(&env_config);
            config.save(Path::new(&model_dir).join("agent.yaml"))?;
            let learner = PolicyGradient::build(config)?;
            run(args, &env_config, learner, PolicyGradient::policy_model)
        }
        Algo::Ac => {
            let config = config::ac_config::<Vanilla>(&env_config, VanillaConfig::default());
            config.save(Path::new(&model_dir).join("agent.yaml"))?;
            let learner = ActorCritic::build(config)?;
            run(args, &env_config, learner, ActorCritic::policy_model)
        }
        Algo::Ppo => {
            let config =
                config::ac_config::<ClippedSurrogate>(&env_config, ClipConfig::default());
            config.save(Path::new(&model_dir).join("agent.yaml"))?;
            let learner = Ppo::build(config)?;
            run(args, &env_config, learner, Ppo::policy_model)
        }
        Algo::KlPpo => {
            let config = config::ac_config::<AdaptiveKlPenalty>(
                &env_config,
                config::kl_penalty_config(),
            );
            config.save(Path::new(&model_dir).join("agent.yaml"))?;
            let learner = KlPpo::build(config)?;
            run(args, &env_config, learner, KlPpo::policy_model)
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    train(&args)
}
