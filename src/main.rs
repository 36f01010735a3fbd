//! Provider-Harvester main entry point
//!
//! Command-line interface for the provider-directory crawl engine.

use clap::Parser;
use provider_harvester::config::load_config_with_hash;
use provider_harvester::crawler::run_harvest;
use provider_harvester::inputs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Provider-Harvester: a provider-directory crawl engine
///
/// Crawls a captcha-protected provider search page by page across every
/// geography × plan × specialty partition, persisting raw listing and detail
/// payloads and skipping records already seen in previous runs.
#[derive(Parser, Debug)]
#[command(name = "provider-harvester")]
#[command(version = "1.0.0")]
#[command(about = "A provider-directory crawl engine", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Reinitialize the dedup cache instead of reopening the existing store
    #[arg(long)]
    wipe_cache: bool,

    /// Validate config and show what would be crawled without crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    // Secrets (proxy credentials, captcha API keys) come from the environment
    dotenvy::dotenv().ok();

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, _config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        handle_dry_run(&config)?;
        return Ok(());
    }

    handle_harvest(config, cli.wipe_cache).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("provider_harvester=info,warn"),
            1 => EnvFilter::new("provider_harvester=debug,info"),
            2 => EnvFilter::new("provider_harvester=trace,debug"),
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

/// Handles the --dry-run mode: validates config and shows the crawl plan
fn handle_dry_run(
    config: &provider_harvester::config::Config,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Provider-Harvester Dry Run ===\n");

    println!("Target:");
    println!("  Base URL: {}", config.search.base_url);
    println!("  Page size: {}", config.search.page_size);
    println!("  Distance: {}", config.search.distance);

    println!("\nCrawler:");
    println!("  Batch size: {}", config.crawler.batch_size);
    println!(
        "  Max concurrent partitions: {}",
        config.crawler.max_concurrent_partitions
    );
    println!("  Sequential flow: {}", config.crawler.sequential_flow);
    println!("  Page attempts: {}", config.crawler.page_attempts);

    println!("\nCaptcha:");
    println!("  Provider: {}", config.captcha.provider);
    println!("  Action: {}", config.captcha.action);

    println!("\nOutput:");
    println!("  Artifacts: {}", config.output.output_dir);
    println!("  Dedup cache: {}", config.output.cache_dir);

    let tables = inputs::load_reference_tables(&config.inputs)?;
    let geo = inputs::load_geo_inputs(Path::new(&config.inputs.zips_path))?;

    println!("\nReference tables:");
    println!("  Plans: {}", tables.plans.len());
    println!("  Doctor specialties: {}", tables.doctor_specialties.len());
    println!("  PCP specialties: {}", tables.pcp_specialties.len());
    println!("  Dental specialties: {}", tables.dental_specialties.len());
    println!("  Geography inputs: {}", geo.len());

    let partitions_per_zip = provider_harvester::crawler::Partition::expand(
        &tables,
        "00000",
        &config.search.distance,
    )
    .len();

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would crawl {} partitions ({} per zip × {} zips)",
        partitions_per_zip * geo.len(),
        partitions_per_zip,
        geo.len()
    );

    Ok(())
}

/// Handles the main harvest operation
async fn handle_harvest(
    config: provider_harvester::config::Config,
    wipe_cache: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if wipe_cache {
        tracing::info!("Starting harvest with a fresh dedup cache");
    } else {
        tracing::info!("Starting harvest (reusing existing dedup cache)");
    }

    match run_harvest(config, wipe_cache).await {
        Ok(summary) => {
            tracing::info!(
                "Harvest completed: {} batches, {} inputs ok, {} inputs failed",
                summary.batches,
                summary.inputs_succeeded,
                summary.inputs_failed
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            Err(e.into())
        }
    }
}
