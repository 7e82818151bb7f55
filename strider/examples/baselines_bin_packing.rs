use anyhow::Result;
use clap::Parser;
use log::info;
use strider_bin_packing::{
    BestFitPolicy, BinPacking, BinPackingConfig, BinPackingObjective, MinWastePolicy,
};
use strider_core::{DefaultEvaluator, Evaluator as _, Policy, RandomPolicy};

/// Evaluate the hand-coded bin-packing policies
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Number of episodes per round
    #[arg(long, default_value_t = 10000)]
    n_episodes: usize,

    /// Number of rounds
    #[arg(long, default_value_t = 10)]
    n_rounds: usize,

    /// Random seed of the environment
    #[arg(long, default_value_t = 0)]
    seed: i64,
}

fn average_return<P>(args: &Args, config: &BinPackingConfig, policy: &P) -> Result<f32>
where
    P: Policy<BinPacking>,
{
    let mut evaluator = DefaultEvaluator::<BinPacking, _>::new(
        config,
        BinPackingObjective,
        args.seed,
        args.n_episodes,
    )?;
    let mut sum = 0.0;
    for round in 0..args.n_rounds {
        let ret = evaluator.evaluate(policy)?.get_scalar("episode_return")?;
        info!("round {} {}", round, ret);
        sum += ret;
    }
    Ok(sum / args.n_rounds.max(1) as f32)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let config = BinPackingConfig::default();

    let random = average_return(&args, &config, &RandomPolicy::new(config.num_bins))?;
    let best_fit = average_return(&args, &config, &BestFitPolicy)?;
    let min_waste = average_return(&args, &config, &MinWastePolicy)?;

    info!("random:    {}", random);
    info!("best-fit:  {}", best_fit);
    info!("min-waste: {}", min_waste);
    Ok(())
}
