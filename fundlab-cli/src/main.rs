//! fundlab CLI: collect quotes and financials, then analyze them.
//!
//! Commands:
//! - `run`: quotes, finances, and analysis in order
//! - `quotes`: fetch the quote board only
//! - `finances`: collect entity financials into the store only
//! - `analyze`: run the analysis stages over the cleaned tables
//! - `init-config`: write the default TOML config

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use fundlab_core::{HtmlFinancialsExtractor, HttpFetcher};
use fundlab_runner::{
    collect_finances, collect_quotes, run_all, run_analysis, ArtifactLayout, Collaborators,
    RunConfig, TracingProgress,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "fundlab", about = "fundlab: concurrent financial snapshot collection and analysis")]
struct Cli {
    /// Also write logs to this file.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the quotes, finances, and analysis phases in order.
    Run(RunArgs),
    /// Fetch the quote board and write the raw and cleaned tables.
    Quotes(RunArgs),
    /// Collect financials for every configured entity.
    Finances(RunArgs),
    /// Analyze the cleaned tables and write the final table.
    Analyze(RunArgs),
    /// Write the default configuration to a TOML file.
    InitConfig {
        /// Destination path.
        path: PathBuf,

        /// Overwrite an existing file.
        #[arg(long, default_value_t = false)]
        force: bool,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Path to a TOML config file. Defaults are used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Root directory for the raw/, processed/ and analysis/ trees.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Maximum number of entities collected at once.
    #[arg(long)]
    concurrency: Option<usize>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_deref())?;

    match cli.command {
        Commands::Run(args) => run_all_cmd(&args),
        Commands::Quotes(args) => run_quotes_cmd(&args),
        Commands::Finances(args) => run_finances_cmd(&args),
        Commands::Analyze(args) => run_analyze_cmd(&args),
        Commands::InitConfig { path, force } => run_init_config(&path, force),
    }
}

fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let file_layer = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("cannot create log directory {}", parent.display()))?;
            }
            let file = File::create(path)
                .with_context(|| format!("cannot create log file {}", path.display()))?;
            Some(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();
    Ok(())
}

fn load_config(args: &RunArgs) -> Result<RunConfig> {
    let mut config = match &args.config {
        Some(path) => RunConfig::from_file(path)?,
        None => RunConfig::default(),
    };
    if let Some(dir) = &args.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(k) = args.concurrency {
        config.concurrency = k;
    }
    config.validate()?;
    Ok(config)
}

fn run_all_cmd(args: &RunArgs) -> Result<()> {
    let config = load_config(args)?;
    let layout = ArtifactLayout::for_today(&config.data_dir);
    let quote_fetcher = HttpFetcher::new(config.quote_timeout())?;
    let page_fetcher = HttpFetcher::new(config.fetch_timeout())?;
    let collaborators = Collaborators {
        quote_fetcher: &quote_fetcher,
        page_fetcher: &page_fetcher,
        extractor: &HtmlFinancialsExtractor,
        progress: &TracingProgress,
    };

    let report = run_all(&config, &layout, &collaborators)?;

    let outcome = &report.finances.outcome;
    println!(
        "Collected {}/{} entities ({} failed)",
        outcome.written,
        outcome.total,
        outcome.failed()
    );
    for (entity, err) in &outcome.failures {
        tracing::warn!(ticker = %entity.ticker, kind = err.kind(), "{entity}: {err}");
    }
    if report.quotes.is_none() {
        tracing::warn!("quote board not refreshed; analysis used the previous quote table");
    }
    println!("{}", report.analysis.final_table_path().display());
    Ok(())
}

fn run_quotes_cmd(args: &RunArgs) -> Result<()> {
    let config = load_config(args)?;
    let layout = ArtifactLayout::for_today(&config.data_dir);
    let fetcher = HttpFetcher::new(config.quote_timeout())?;

    let report = collect_quotes(&config, &layout, &fetcher)?;
    println!("{} quote rows → {}", report.rows, report.clean_path.display());
    Ok(())
}

fn run_finances_cmd(args: &RunArgs) -> Result<()> {
    let config = load_config(args)?;
    let layout = ArtifactLayout::for_today(&config.data_dir);
    let fetcher = HttpFetcher::new(config.fetch_timeout())?;

    let report = collect_finances(&config, &layout, &fetcher, &HtmlFinancialsExtractor, &TracingProgress)?;
    let outcome = &report.outcome;
    println!(
        "Collected {}/{} entities ({} failed) → {}",
        outcome.written,
        outcome.total,
        outcome.failed(),
        report.finances_path.display()
    );
    Ok(())
}

fn run_analyze_cmd(args: &RunArgs) -> Result<()> {
    let config = load_config(args)?;
    let layout = ArtifactLayout::for_today(&config.data_dir);

    let report = run_analysis(&layout)?;
    for (label, count) in &report.manifest.recommendations {
        println!("  {label:<5} {count}");
    }
    println!("{}", report.final_table_path().display());
    Ok(())
}

fn run_init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }
    let text = RunConfig::default().to_toml()?;
    std::fs::write(path, text).with_context(|| format!("cannot write {}", path.display()))?;
    println!("Wrote default config to {}", path.display());
    Ok(())
}
