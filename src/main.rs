use anyhow::{Context, Result};
use clap::Parser;
use mimetic_core::config::AppConfig;
use mimetic_core::init_logging;
use mimetic_data::BehaviourKind;
use mimetic_lib::app::{App, RunOptions};
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG: &str = "config.toml";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Custom config file path
    #[arg(short, long, default_value = DEFAULT_CONFIG)]
    config: PathBuf,

    /// Behaviour every agent runs (competition, imitation, social_fitness,
    /// fitness_exploitation, meta_competition, pso)
    #[arg(short, long)]
    behaviour: Option<BehaviourKind>,

    /// Maximum number of ticks
    #[arg(short, long)]
    ticks: Option<u64>,

    /// Seed for a reproducible run
    #[arg(short, long)]
    seed: Option<u64>,

    /// Directory for the event history, summary and run archive
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Directory for population checkpoints
    #[arg(long)]
    checkpoint_dir: Option<PathBuf>,
}

fn load_config(path: &Path) -> Result<AppConfig> {
    if path.exists() {
        return AppConfig::load(path);
    }
    anyhow::ensure!(
        path == Path::new(DEFAULT_CONFIG),
        "config file {} does not exist",
        path.display()
    );
    Ok(AppConfig::default())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = load_config(&args.config)?;
    if let Some(behaviour) = args.behaviour {
        config.behaviour = behaviour;
    }
    if let Some(seed) = args.seed {
        config.world.seed = Some(seed);
    }
    config.validate().context("invalid configuration")?;
    init_logging(&config.logging.level);

    let options = RunOptions {
        max_ticks: args.ticks,
        log_dir: args.log_dir,
        checkpoint_dir: args.checkpoint_dir,
    };
    let mut app = App::new(config, options)?;
    let summary = app.run()?;
    print!("{}", summary.render());

    Ok(())
}
