//! Listing crawler
//!
//! Drives the page-by-page search of one partition. Each page attempt
//! acquires a fresh captcha token, jitters before calling, and decodes the
//! double-wrapped Aura payload; the first page's record count fixes the
//! partition's page budget. In sequential flow every record of a page is
//! detail-fetched before the cursor advances, trading throughput for
//! predictable captcha and rate-limit pacing.

use crate::artifacts::ArtifactStore;
use crate::captcha::TokenSource;
use crate::client::RequestExecutor;
use crate::config::{CaptchaConfig, CrawlerConfig, SearchConfig};
use crate::crawler::detail::DetailFetcher;
use crate::crawler::scheduler::InputRunner;
use crate::crawler::{PageCursor, Partition};
use crate::inputs::{GeoInput, ReferenceTables};
use crate::retry::{retry, Backoff, RetryPolicy};
use crate::rpc::{self, AuraSession, ListingPage};
use async_trait::async_trait;
use rand::Rng;
use reqwest::Method;
use std::sync::Arc;
use std::time::Duration;

/// Outcome counters of one partition crawl
#[derive(Debug, Default, Clone)]
pub struct PartitionStats {
    pub pages_fetched: u32,
    pub pages_failed: u32,
    pub records_seen: u64,
    pub details_failed: u64,
}

/// Page-by-page crawler over search partitions
pub struct ListingCrawler {
    executor: Arc<RequestExecutor>,
    tokens: Arc<dyn TokenSource>,
    detail: Arc<DetailFetcher>,
    artifacts: Arc<ArtifactStore>,
    tables: Arc<ReferenceTables>,
    session: AuraSession,
    search: SearchConfig,
    crawler: CrawlerConfig,
    captcha_action: String,
    referer: String,
    page_policy: RetryPolicy,
}

impl ListingCrawler {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        executor: Arc<RequestExecutor>,
        tokens: Arc<dyn TokenSource>,
        detail: Arc<DetailFetcher>,
        artifacts: Arc<ArtifactStore>,
        tables: Arc<ReferenceTables>,
        search: SearchConfig,
        crawler: CrawlerConfig,
        captcha: &CaptchaConfig,
    ) -> Self {
        let (min_ms, max_ms) = crawler.retry_delay_ms;
        let page_policy =
            RetryPolicy::new(crawler.page_attempts, Backoff::Jittered { min_ms, max_ms });
        let session = AuraSession::from_config(&search);

        Self {
            executor,
            tokens,
            detail,
            artifacts,
            tables,
            session,
            search,
            crawler,
            captcha_action: captcha.action.clone(),
            referer: captcha.page_url.clone(),
            page_policy,
        }
    }

    /// Crawls every page of one partition
    ///
    /// The cursor advances past failed pages - a page's data loss never
    /// halts the partition. Terminal once the cursor passes the page budget
    /// fixed by page 1 (or immediately when page 1 reports zero records).
    pub async fn crawl_partition(&self, partition: &Partition) -> PartitionStats {
        tracing::info!("Starting partition {}", partition.describe());

        let mut cursor = PageCursor::new(self.search.page_size);
        let mut stats = PartitionStats::default();

        while !cursor.is_done() {
            tracing::info!(
                "Fetching page {} of {} | {}",
                cursor.page,
                cursor.total_pages(),
                partition.describe()
            );

            match self.fetch_page(partition, &cursor).await {
                Some(page) => {
                    stats.pages_fetched += 1;

                    if let Err(e) =
                        self.artifacts
                            .write_listing_page(partition, cursor.page, &page.raw)
                    {
                        tracing::error!(
                            "Failed to persist page {} of {}: {}",
                            cursor.page,
                            partition.describe(),
                            e
                        );
                    }

                    if cursor.page == 1 {
                        cursor.record_total(page.total_records);
                        if page.total_records == 0 {
                            tracing::info!("No results for {}", partition.describe());
                            break;
                        }
                        tracing::info!(
                            "Total records: {}, total pages: {}",
                            page.total_records,
                            cursor.total_pages()
                        );
                    }

                    stats.records_seen += page.records.len() as u64;

                    if self.crawler.sequential_flow {
                        for record in &page.records {
                            if !self.detail.fetch(record, partition).await {
                                stats.details_failed += 1;
                            }
                        }
                    }
                }
                None => {
                    stats.pages_failed += 1;
                    tracing::error!(
                        "Failed to fetch page {} of {} after {} attempts",
                        cursor.page,
                        partition.describe(),
                        self.crawler.page_attempts
                    );
                }
            }

            cursor.advance();
        }

        tracing::info!(
            "Completed partition {} | pages fetched: {}, failed: {}",
            partition.describe(),
            stats.pages_fetched,
            stats.pages_failed
        );

        stats
    }

    /// Fetches one page within the page attempt budget
    async fn fetch_page(&self, partition: &Partition, cursor: &PageCursor) -> Option<ListingPage> {
        retry(&self.page_policy, |attempt| {
            self.fetch_page_once(partition, cursor, attempt)
        })
        .await
    }

    /// One page attempt: fresh token, jitter, request, decode
    async fn fetch_page_once(
        &self,
        partition: &Partition,
        cursor: &PageCursor,
        attempt: u32,
    ) -> Option<ListingPage> {
        let jitter_ms = {
            let (min_ms, max_ms) = self.crawler.pre_request_jitter_ms;
            if min_ms >= max_ms {
                min_ms
            } else {
                rand::thread_rng().gen_range(min_ms..=max_ms)
            }
        };
        tokio::time::sleep(Duration::from_millis(jitter_ms)).await;

        // Tokens are single-use; a fresh one is acquired per attempt
        let token = self.tokens.solve(&self.captcha_action).await;
        if token.is_empty() {
            tracing::error!(
                attempt,
                "Captcha solve failed for {}; sending without token",
                partition.describe()
            );
        }

        let path = rpc::search_request_path(cursor.page);
        let body = rpc::build_search_body(&self.session, &self.search, partition, cursor, &token);
        let headers = rpc::aura_headers(&self.search.base_url, &self.referer);

        tracing::debug!(
            attempt,
            "Search request | page {} | {}",
            cursor.page,
            partition.describe()
        );

        let response = self
            .executor
            .execute(Method::POST, &path, Some(body), &headers)
            .await?;

        match rpc::decode_ip_result(&response.body) {
            Ok(value) => Some(ListingPage::from_ip_result(value)),
            Err(e) => {
                tracing::warn!(
                    attempt,
                    "Decode failed for page {} of {}: {}",
                    cursor.page,
                    partition.describe(),
                    e
                );
                None
            }
        }
    }
}

#[async_trait]
impl InputRunner for ListingCrawler {
    /// Crawls every partition of one geography row, in order
    async fn run_input(&self, input: &GeoInput) -> crate::Result<()> {
        let partitions = Partition::expand(&self.tables, &input.zip, &self.search.distance);
        tracing::info!(
            "Zip {} expands to {} partitions",
            input.zip,
            partitions.len()
        );

        for partition in &partitions {
            self.crawl_partition(partition).await;
        }

        Ok(())
    }
}
