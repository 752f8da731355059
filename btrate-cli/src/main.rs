mod config;
mod input;
mod output;

use anyhow::{Context, Result};
use btrate_core::{
    analyze, analyze_posterior, default_step_size, rating_evolution, threshold_crossings, EstimatorOptions,
    SamplerOptions,
};
use clap::Parser;
use log::info;
use std::path::PathBuf;

use crate::config::BtrateConfig;
use crate::input::{ColumnSpec, DEFAULT_LOSER_COL, DEFAULT_WINNER_COL};

#[derive(Parser)]
#[command(name = "btrate", version, about = "Bayesian Bradley-Terry ratings from pairwise match outcomes")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Show solver progress (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Rate every player in a CSV of match outcomes
    Rate(RateArgs),
    /// Show how ratings settle as matches accumulate
    Evolution(EvolutionArgs),
    /// Sample the posterior and report percentile intervals
    Sample(SampleArgs),
    /// Create a default config file at ~/.config/btrate/config.toml
    Init {
        /// Where to write the config (default: ~/.config/btrate/config.toml)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(clap::Args)]
struct InputArgs {
    /// CSV file with one match per row
    #[arg(long)]
    matches: PathBuf,

    /// Winner column: header name, or zero-based index with --no-header (default: "winner" / 0)
    #[arg(long)]
    winner_col: Option<String>,

    /// Loser column: header name, or zero-based index with --no-header (default: "loser" / 1)
    #[arg(long)]
    loser_col: Option<String>,

    /// The CSV has no header row
    #[arg(long)]
    no_header: bool,

    /// Variance of the Gaussian prior on each rating. Default: 100
    #[arg(long)]
    prior_variance: Option<f64>,

    /// Convergence tolerance for rating and log-posterior changes. Default: 1e-6
    #[arg(long)]
    tolerance: Option<f64>,

    /// Solver iteration cap. Default: 100
    #[arg(long)]
    max_iterations: Option<usize>,

    /// Credible interval coverage, strictly between 0 and 1. Default: 0.95
    #[arg(long)]
    confidence_level: Option<f64>,

    /// Path to config file (default: ~/.config/btrate/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(clap::Args)]
struct RateArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Output JSON instead of table
    #[arg(long)]
    json: bool,

    /// Also show ratings on the Elo scale
    #[arg(long)]
    elo: bool,
}

#[derive(clap::Args)]
struct EvolutionArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Refit every N matches. Default: about twenty points over the whole file
    #[arg(long)]
    step: Option<usize>,
}

#[derive(clap::Args)]
struct SampleArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Number of posterior draws to keep. Default: 10000
    #[arg(long)]
    samples: Option<usize>,

    /// Sweeps discarded before recording. Default: 2000
    #[arg(long)]
    burn_in: Option<usize>,

    /// RNG seed for reproducible draws. Default: 0
    #[arg(long)]
    seed: Option<u64>,

    /// Output JSON instead of table
    #[arg(long)]
    json: bool,
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Rate(args) => run_rate(args),
        Commands::Evolution(args) => run_evolution(args),
        Commands::Sample(args) => run_sample(args),
        Commands::Init { config } => {
            let path = match config {
                Some(path) => path,
                None => config::config_path()?,
            };
            config::create_default_config(&path)?;
            println!("Created config at {}", path.display());
            println!("Edit it to set your default columns and solver options.");
            Ok(())
        }
    }
}

fn run_rate(args: RateArgs) -> Result<()> {
    let (pairs, options) = load_input(&args.input)?;
    let report = analyze(&pairs, &options).context("Rating failed")?;

    if args.json {
        output::print_json(&report, args.elo)
    } else {
        output::print_table(&report, args.elo)
    }
}

fn run_evolution(args: EvolutionArgs) -> Result<()> {
    let (pairs, options) = load_input(&args.input)?;
    let step = args.step.unwrap_or_else(|| default_step_size(pairs.len()));
    info!("refitting every {step} matches");

    let points = rating_evolution(&pairs, step, &options).context("Rating evolution failed")?;
    let crossings = threshold_crossings(&points, &output::EVOLUTION_THRESHOLDS);
    output::print_evolution(&points, &crossings)
}

fn run_sample(args: SampleArgs) -> Result<()> {
    let (pairs, options) = load_input(&args.input)?;
    let sampler = sampler_options(&args);
    let summary = analyze_posterior(&pairs, &options, &sampler).context("Posterior sampling failed")?;
    output::print_posterior(&summary, args.json)
}

fn sampler_options(args: &SampleArgs) -> SamplerOptions {
    let defaults = SamplerOptions::default();
    SamplerOptions {
        samples: args.samples.unwrap_or(defaults.samples),
        burn_in: args.burn_in.unwrap_or(defaults.burn_in),
        seed: args.seed.unwrap_or(defaults.seed),
        ..defaults
    }
}

/// Load config, merge with CLI args (CLI wins), read the match table.
fn load_input(args: &InputArgs) -> Result<(Vec<(String, String)>, EstimatorOptions)> {
    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => config::config_path()?,
    };
    let cfg = config::load_config(&config_path)?;

    let has_headers = !args.no_header;
    let (winner, loser) = column_specs(args, &cfg)?;
    let pairs = input::load_matches(&args.matches, has_headers, &winner, &loser)?;
    info!("loaded {} matches from {}", pairs.len(), args.matches.display());

    Ok((pairs, estimator_options(args, &cfg)))
}

fn column_specs(args: &InputArgs, cfg: &BtrateConfig) -> Result<(ColumnSpec, ColumnSpec)> {
    let has_headers = !args.no_header;
    let (default_winner, default_loser) = if has_headers {
        (DEFAULT_WINNER_COL, DEFAULT_LOSER_COL)
    } else {
        ("0", "1")
    };

    let winner = args.winner_col.as_deref().or(cfg.winner_col.as_deref()).unwrap_or(default_winner);
    let loser = args.loser_col.as_deref().or(cfg.loser_col.as_deref()).unwrap_or(default_loser);

    Ok((
        ColumnSpec::parse(winner, has_headers).context("Invalid --winner-col")?,
        ColumnSpec::parse(loser, has_headers).context("Invalid --loser-col")?,
    ))
}

/// Validation happens in the engine so bad values surface as its errors.
fn estimator_options(args: &InputArgs, cfg: &BtrateConfig) -> EstimatorOptions {
    let defaults = EstimatorOptions::default();
    let tolerance = args.tolerance.or(cfg.tolerance);
    EstimatorOptions {
        prior_variance: args.prior_variance.or(cfg.prior_variance).unwrap_or(defaults.prior_variance),
        tolerance: tolerance.unwrap_or(defaults.tolerance),
        log_posterior_tolerance: tolerance.unwrap_or(defaults.log_posterior_tolerance),
        max_iterations: args.max_iterations.or(cfg.max_iterations).unwrap_or(defaults.max_iterations),
        confidence_level: args.confidence_level.or(cfg.confidence_level).unwrap_or(defaults.confidence_level),
    }
}
