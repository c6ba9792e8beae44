//! Dex crawler main entry point
//!
//! This is the command-line interface for the Dex crawler and indexer.

use clap::Parser;
use dex_crawler::config::{load_config_with_hash, load_seed_list, validate_worker_count, Config};
use dex_crawler::crawler::{run_crawl, CrawlOptions};
use dex_crawler::output::{load_statistics, print_crawl_summary, print_normalization, print_statistics};
use dex_crawler::storage::SqliteStore;
use dex_crawler::IndexEngine;
use parking_lot::Mutex;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Dex: a concurrent web crawler feeding a TF-IDF index
///
/// Dex crawls outward from a seed list with a pool of workers, stores every
/// page it accepts, and scores each term of each page against the corpus.
#[derive(Parser, Debug)]
#[command(name = "dex-crawler")]
#[command(version = "1.0.0")]
#[command(about = "A concurrent web crawler feeding a TF-IDF index", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Number of crawl workers (overrides the config; prompted for when neither is set)
    #[arg(short, long)]
    workers: Option<usize>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Drop all stored pages, index entries, images and saved links first
    #[arg(long)]
    fresh: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with_all = ["stats", "normalize_only"])]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with_all = ["dry_run", "normalize_only"])]
    stats: bool,

    /// Run the normalization pass over stored pages and exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats", "skip_normalize"])]
    normalize_only: bool,

    /// Do not run the normalization pass after crawling
    #[arg(long)]
    skip_normalize: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            cfg
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config)?;
    } else if cli.stats {
        handle_stats(&config)?;
    } else if cli.normalize_only {
        handle_normalize(&config)?;
    } else {
        let workers = resolve_worker_count(cli.workers, &config)?;
        let options = CrawlOptions {
            fresh: cli.fresh,
            skip_normalize: cli.skip_normalize,
        };
        handle_crawl(config, workers, options).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("dex_crawler=info,warn"),
            1 => EnvFilter::new("dex_crawler=debug,info"),
            2 => EnvFilter::new("dex_crawler=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Picks the worker count: command line, then config, then a stdin prompt
fn resolve_worker_count(
    flag: Option<usize>,
    config: &Config,
) -> Result<usize, Box<dyn std::error::Error>> {
    let workers = match flag.or(config.crawler.workers) {
        Some(workers) => workers,
        None => prompt_worker_count()?,
    };
    Ok(validate_worker_count(workers)?)
}

fn prompt_worker_count() -> Result<usize, Box<dyn std::error::Error>> {
    print!("Number of threads: ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let workers = line
        .trim()
        .parse::<usize>()
        .map_err(|e| format!("Invalid thread count '{}': {}", line.trim(), e))?;
    Ok(workers)
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Dex Dry Run ===\n");

    println!("Crawler Configuration:");
    match config.crawler.workers {
        Some(workers) => println!("  Workers: {}", workers),
        None => println!("  Workers: prompted at startup"),
    }
    println!("  Idle poll interval: {}ms", config.crawler.idle_poll_ms);
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);

    println!("\nUser Agent:");
    println!("  Name: {}", config.user_agent.crawler_name);
    println!("  Version: {}", config.user_agent.crawler_version);
    println!("  Contact URL: {}", config.user_agent.contact_url);

    println!("\nIndex:");
    println!("  Denominators: {:?}", config.index.denominators);
    println!("  Title weight: {}", config.index.title_weight);
    println!("  Body weight: {}", config.index.body_weight);

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);

    let seeds = load_seed_list(config)?;
    println!("\nSeeds ({}):", seeds.len());
    for seed in &seeds {
        println!("  - {}", seed);
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would start crawling with {} seed URLs", seeds.len());

    Ok(())
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("Database: {}\n", config.output.database_path);

    let storage = SqliteStore::new(Path::new(&config.output.database_path))?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --normalize-only mode: scores everything not yet indexed
fn handle_normalize(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let storage = SqliteStore::new(Path::new(&config.output.database_path))?;
    let engine = IndexEngine::from_config(Arc::new(Mutex::new(storage)), &config.index);

    tracing::info!("Running normalization pass ({:?} denominators)", engine.mode());
    let report = engine.index_cycle()?;
    print_normalization(&report);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(
    config: Config,
    workers: usize,
    options: CrawlOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    if options.fresh {
        tracing::info!("Starting fresh crawl (dropping previous data)");
    } else {
        tracing::info!("Starting crawl (resuming saved links if any)");
    }

    match run_crawl(config, workers, options).await {
        Ok(summary) => {
            tracing::info!("Crawl completed successfully");
            print_crawl_summary(&summary);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
