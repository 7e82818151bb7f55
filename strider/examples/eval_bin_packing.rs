use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::info;
use std::path::{Path, PathBuf};
use strider_bin_packing::{BinPacking, BinPackingConfig, BinPackingObjective};
use strider_candle_agent::{
    actor_critic::{ActorCritic, ActorCriticConfig, KlPpo, Ppo},
    pg::{PgConfig, PolicyGradient},
    policy::DeterministicModelPolicy,
    Model,
};
use strider_core::{DefaultEvaluator, Evaluator as _, Learner};

/// Learning algorithm the model was trained with.
#[derive(ValueEnum, Clone, Copy, Debug)]
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

/// Evaluate a policy trained with train_bin_packing
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Learning algorithm the model was trained with
    #[arg(short, long, value_enum)]
    algo: Algo,

    /// Directory given to train_bin_packing
    #[arg(long)]
    model_dir: String,

    /// Subdirectory of the parameters, e.g. best or last
    #[arg(long, default_value = "best")]
    params: String,

    /// Number of episodes
    #[arg(long, default_value_t = 1000)]
    n_episodes: usize,

    /// Random seed of the environment
    #[arg(long, default_value_t = 0)]
    seed: i64,
}

fn evaluate<L>(args: &Args, mut learner: L, policy_model: fn(&L) -> &Model) -> Result<()>
where
    L: Learner<BinPacking>,
{
    let params_dir = Path::new(&args.model_dir).join(&args.params);
    learner
        .load_params(&params_dir)
        .with_context(|| format!("Failed to load parameters from {:?}", params_dir))?;

    let env_config = BinPackingConfig::load(path(args, "env.yaml"))?;
    let policy = DeterministicModelPolicy::new(policy_model(&learner));
    let record = DefaultEvaluator::<BinPacking, _>::new(
        &env_config,
        BinPackingObjective,
        args.seed,
        args.n_episodes,
    )?
    .evaluate(&policy)?;

    info!(
        "{:?}: average return {}, average length {}",
        args.algo,
        record.get_scalar("episode_return")?,
        record.get_scalar("episode_length")?
    );
    Ok(())
}

fn path(args: &Args, file: &str) -> PathBuf {
    Path::new(&args.model_dir).join(file)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let agent_yaml = path(&args, "agent.yaml");

    match args.algo {
        Algo::Pg => {
            let learner = PolicyGradient::build(PgConfig::load(agent_yaml)?)?;
            evaluate(&args, learner, PolicyGradient::policy_model)
        }
        Algo::Ac => {
            let config = ActorCriticConfig::load(agent_yaml)?;
            let learner = ActorCritic::build(config)?;
            evaluate(&args, learner, ActorCritic::policy_model)
        }
        Algo::Ppo => {
            let config = ActorCriticConfig::load(agent_yaml)?;
            let learner = Ppo::build(config)?;
            evaluate(&args, learner, Ppo::policy_model)
        }
        Algo::KlPpo => {
            let config = ActorCriticConfig::load(agent_yaml)?;
            let learner = KlPpo::build(config)?;
            evaluate(&args, learner, KlPpo::policy_model)
        }
    }
}
