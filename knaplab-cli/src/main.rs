//! knaplab CLI: generate, batch, solve and inspect-config commands.
//!
//! Commands:
//! - `generate`: search one instance from a TOML config and print or save it
//! - `batch`: generate several seeded instances from one config
//! - `solve`: solve and measure a fixed item table at one capacity
//! - `inspect-config`: validate a config and print its hash

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use knaplab_core::metrics::{assess, DEFAULT_ALPHA_PERCENT};
use knaplab_core::rng::Seed;
use knaplab_core::solver::solve;
use knaplab_runner::export::{
    export_batch_json, export_batch_text, export_items_csv, export_json, export_text,
    save_artifacts,
};
use knaplab_runner::{
    parse_items, run_batch, run_search, BatchOptions, InstanceReport, ItemSource, SearchConfig,
    SearchProgress,
};

#[derive(Parser)]
#[command(
    name = "knaplab",
    about = "knaplab: knapsack instances with controllable hardness"
)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Text,
    Csv,
}

#[derive(Subcommand)]
enum Commands {
    /// Search one instance that satisfies the config's constraints.
    Generate {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Override the config seed (integers are numeric seeds).
        #[arg(long)]
        seed: Option<String>,

        /// Use a fixed weight,value table instead of synthesizing items.
        #[arg(long)]
        items: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = Format::Json)]
        format: Format,

        /// Write instance.json, instance.txt and items.csv under this directory.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Generate several instances with derived seeds.
    Batch {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Number of instances.
        #[arg(long)]
        count: usize,

        /// Run instances on the rayon pool.
        #[arg(long, default_value_t = false)]
        parallel: bool,

        #[arg(long, value_enum, default_value_t = Format::Json)]
        format: Format,
    },
    /// Solve a weight,value table at one capacity and report its hardness.
    Solve {
        /// Item table: one `weight,value` row per line.
        #[arg(long)]
        items: PathBuf,

        #[arg(long)]
        capacity: u64,

        /// Truncate or cycle the table to this many items.
        #[arg(long)]
        n_items: Option<usize>,

        /// Near-optimal threshold for bundle counts, in percent of OPT.
        #[arg(long, default_value_t = DEFAULT_ALPHA_PERCENT)]
        alpha: u32,
    },
    /// Validate a config and print its content hash.
    InspectConfig {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Generate {
            config,
            seed,
            items,
            format,
            output_dir,
        } => run_generate(&config, seed, items.as_deref(), format, output_dir.as_deref()),
        Commands::Batch {
            config,
            count,
            parallel,
            format,
        } => run_batch_cmd(&config, count, parallel, format),
        Commands::Solve {
            items,
            capacity,
            n_items,
            alpha,
        } => run_solve(&items, capacity, n_items, alpha),
        Commands::InspectConfig { config } => run_inspect(&config),
    }
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => "warn,knaplab=info",
        1 => "info,knaplab=debug",
        _ => "debug,knaplab=trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_config(path: &Path) -> Result<SearchConfig> {
    SearchConfig::from_file(path).with_context(|| format!("invalid config {}", path.display()))
}

/// Integer text is a numeric seed, anything else a text seed.
fn parse_seed(text: &str) -> Seed {
    text.parse::<i64>()
        .map(Seed::Number)
        .unwrap_or_else(|_| Seed::from(text))
}

fn read_items(path: &Path, n_items: Option<usize>) -> Result<Vec<knaplab_core::Item>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_items(&text, n_items).with_context(|| format!("no items in {}", path.display()))
}

fn log_progress(p: &SearchProgress) {
    info!(
        attempts = p.attempts,
        max_attempts = p.max_attempts,
        near_misses = p.near_misses,
        elapsed_secs = p.elapsed_secs,
        "searching"
    );
}

fn run_generate(
    config_path: &Path,
    seed: Option<String>,
    items: Option<&Path>,
    format: Format,
    output_dir: Option<&Path>,
) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(seed) = seed {
        config.seed = parse_seed(&seed);
    }
    if let Some(path) = items {
        let fixed = read_items(path, None)?;
        config.items = ItemSource::Fixed { fixed };
    }

    let progress: &dyn Fn(&SearchProgress) = &log_progress;
    let outcome = run_search(&config, Some(progress), None)?;
    let report = InstanceReport::new(&config, &outcome);

    if let Some(dir) = output_dir {
        let run_dir = save_artifacts(&report, dir)?;
        println!("{}", run_dir.display());
        return Ok(());
    }
    match format {
        Format::Json => println!("{}", export_json(&report)?),
        Format::Text => print!("{}", export_text(&report)),
        Format::Csv => print!("{}", export_items_csv(&report.items)?),
    }
    Ok(())
}

fn run_batch_cmd(config_path: &Path, count: usize, parallel: bool, format: Format) -> Result<()> {
    let config = load_config(config_path)?;
    let reports = run_batch(
        &config,
        count,
        BatchOptions {
            parallel,
            cancel: None,
        },
    )?;
    match format {
        Format::Json => println!("{}", export_batch_json(&reports)?),
        Format::Text => print!("{}", export_batch_text(&reports)),
        Format::Csv => anyhow::bail!("csv output is only available for single instances"),
    }
    Ok(())
}

fn run_solve(path: &Path, capacity: u64, n_items: Option<usize>, alpha: u32) -> Result<()> {
    let items = read_items(path, n_items)?;
    let solution = solve(&items, capacity);
    let hardness = assess(&items, capacity, &solution, true, alpha);
    let out = serde_json::json!({
        "n_items": items.len(),
        "capacity": capacity,
        "optimal": solution,
        "sahni_k": hardness.sahni_k,
        "greedy_ratio": hardness.greedy_ratio,
        "bundles": hardness.bundles,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn run_inspect(config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    println!("config:   {}", config_path.display());
    println!("label:    {}", config.label);
    println!("seed:     {}", config.seed);
    println!("items:    {}", config.n_items());
    println!("budgets:  {}", config.budgets.len());
    println!("hash:     {}", config.config_hash());
    Ok(())
}
