//! Per-record detail fetching
//!
//! One provider record maps to one detail request. The durable dedup cache
//! gates the fetch: the atomic insert-if-absent claim is taken before any
//! network traffic, so a record is detail-fetched at most once per cache
//! lifetime even when overlapping partitions surface the same provider
//! concurrently. A claim whose fetch exhausts its attempt budget is released
//! so a later run can retry the record.

use crate::artifacts::ArtifactStore;
use crate::cache::DedupCache;
use crate::client::RequestExecutor;
use crate::config::{CrawlerConfig, SearchConfig};
use crate::crawler::Partition;
use crate::retry::{retry, Backoff, RetryPolicy};
use crate::rpc::{self, AuraSession, ProviderRecord};
use reqwest::Method;
use serde_json::json;
use std::sync::Arc;

/// Fetches and persists one provider's detail payload
pub struct DetailFetcher {
    executor: Arc<RequestExecutor>,
    cache: Arc<DedupCache>,
    artifacts: Arc<ArtifactStore>,
    session: AuraSession,
    search: SearchConfig,
    policy: RetryPolicy,
}

impl DetailFetcher {
    pub fn new(
        executor: Arc<RequestExecutor>,
        cache: Arc<DedupCache>,
        artifacts: Arc<ArtifactStore>,
        session: AuraSession,
        search: SearchConfig,
        crawler: &CrawlerConfig,
    ) -> Self {
        let (min_ms, max_ms) = crawler.retry_delay_ms;
        Self {
            executor,
            cache,
            artifacts,
            session,
            search,
            policy: RetryPolicy::new(crawler.detail_attempts, Backoff::Jittered { min_ms, max_ms }),
        }
    }

    /// Fetches one provider's detail page
    ///
    /// # Returns
    ///
    /// * `true` - The record was already processed, or this call fetched and
    ///   persisted it
    /// * `false` - Every attempt failed; the record is left unclaimed
    pub async fn fetch(&self, record: &ProviderRecord, partition: &Partition) -> bool {
        let key = record.provider_id.as_bytes();
        let marker = chrono::Utc::now().to_rfc3339();

        // Atomic claim: exactly one caller wins a given provider id. A cache
        // outage degrades to treating the record as new.
        match self.cache.insert_if_absent(key, marker.as_bytes()) {
            Ok(false) => {
                tracing::info!(
                    "Provider {} ({}) already processed, skipping",
                    record.display_name,
                    record.provider_id
                );
                return true;
            }
            Ok(true) => {}
            Err(e) => {
                tracing::warn!(
                    "Dedup cache unavailable for provider {}: {}; fetching anyway",
                    record.provider_id,
                    e
                );
            }
        }

        tracing::info!(
            "Processing provider {} ({})",
            record.display_name,
            record.provider_id
        );

        let fetched = retry(&self.policy, |attempt| {
            self.fetch_once(record, partition, attempt)
        })
        .await;

        match fetched {
            Some(()) => true,
            None => {
                // Release the claim so a later run retries this record
                if let Err(e) = self.cache.remove(key) {
                    tracing::warn!(
                        "Failed to release claim for provider {}: {}",
                        record.provider_id,
                        e
                    );
                }
                tracing::error!(
                    "Max retries reached for detail fetch | provider {} | {}",
                    record.provider_id,
                    partition.describe()
                );
                false
            }
        }
    }

    /// One attempt: request, decode, persist
    async fn fetch_once(
        &self,
        record: &ProviderRecord,
        partition: &Partition,
        attempt: u32,
    ) -> Option<()> {
        let path = rpc::detail_request_path();
        let body = rpc::build_detail_body(&self.session, &self.search, &record.provider_id, partition);
        let headers = rpc::aura_headers(&self.search.base_url, &self.search.base_url);

        tracing::debug!(attempt, "Detail request for provider {}", record.provider_id);

        let response = self
            .executor
            .execute(Method::POST, &path, Some(body), &headers)
            .await?;

        match rpc::decode_ip_result(&response.body) {
            Ok(_) => {
                let payload = json!({
                    "status": response.status,
                    "headers": response.headers,
                    "cookies": response.cookies,
                    "body": response.body,
                });
                if let Err(e) = self.artifacts.write_detail(&record.provider_id, &payload) {
                    tracing::error!(
                        "Failed to persist detail for provider {}: {}",
                        record.provider_id,
                        e
                    );
                }
                Some(())
            }
            Err(e) => {
                tracing::warn!(
                    attempt,
                    "Detail decode failed for provider {}: {}",
                    record.provider_id,
                    e
                );
                None
            }
        }
    }
}
