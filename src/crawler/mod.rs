//! Crawl orchestration engine
//!
//! This module contains the core crawl logic, including:
//! - Partition and page-cursor state
//! - Page-by-page listing crawling gated by captcha tokens
//! - Per-record detail fetching behind the dedup cache
//! - Fixed-size-batch scheduling with bounded concurrency

mod detail;
mod listing;
mod partition;
mod scheduler;

pub use detail::DetailFetcher;
pub use listing::{ListingCrawler, PartitionStats};
pub use partition::{PageCursor, Partition, ServiceType};
pub use scheduler::{BatchScheduler, InputRunner, RunSummary};

use crate::artifacts::ArtifactStore;
use crate::cache::{CacheOptions, DedupCache};
use crate::captcha;
use crate::client::RequestExecutor;
use crate::config::Config;
use crate::inputs::{self, GeoInput};
use crate::rpc::AuraSession;
use crate::Result;
use std::path::Path;
use std::sync::Arc;

/// Runs a complete harvest
///
/// Constructs every collaborator once, wires them together explicitly, and
/// drives the batch scheduler over the geography inputs. All shared state
/// (HTTP client, token source, dedup cache, artifact store) lives behind
/// `Arc` handles that are dropped when the run scope ends.
///
/// # Arguments
///
/// * `config` - The validated harvester configuration
/// * `wipe_cache` - Reinitialize the dedup store instead of reopening it
///
/// # Returns
///
/// * `Ok(RunSummary)` - Per-run counters after all batches complete
/// * `Err(HarvestError)` - Startup failure (reference tables, cache, client)
pub async fn run_harvest(config: Config, wipe_cache: bool) -> Result<RunSummary> {
    let tables = Arc::new(inputs::load_reference_tables(&config.inputs)?);
    let geo_inputs: Vec<GeoInput> = inputs::load_geo_inputs(Path::new(&config.inputs.zips_path))?;

    tracing::info!(
        "Loaded {} plans, {} geography inputs",
        tables.plans.len(),
        geo_inputs.len()
    );

    let executor = Arc::new(RequestExecutor::new(
        &config.search.base_url,
        &config.http,
        config.proxy.as_ref(),
    )?);

    let tokens = captcha::token_source_from_config(&config.captcha, config.proxy.as_ref())?;

    let cache = Arc::new(DedupCache::open(
        Path::new(&config.output.cache_dir),
        CacheOptions {
            wipe: wipe_cache,
            max_size_bytes: config.output.cache_max_size_bytes,
            ..Default::default()
        },
    )?);

    let artifacts = Arc::new(ArtifactStore::new(Path::new(&config.output.output_dir))?);

    let session = AuraSession::from_config(&config.search);
    let detail = Arc::new(DetailFetcher::new(
        Arc::clone(&executor),
        Arc::clone(&cache),
        Arc::clone(&artifacts),
        session,
        config.search.clone(),
        &config.crawler,
    ));

    let crawler = Arc::new(ListingCrawler::new(
        executor,
        tokens,
        detail,
        artifacts,
        tables,
        config.search.clone(),
        config.crawler.clone(),
        &config.captcha,
    ));

    let scheduler = BatchScheduler::new(crawler, &config.crawler);
    let summary = scheduler.run(geo_inputs).await;

    tracing::info!(
        "Harvest complete | batches: {}, inputs ok: {}, inputs failed: {}",
        summary.batches,
        summary.inputs_succeeded,
        summary.inputs_failed
    );

    Ok(summary)
}
