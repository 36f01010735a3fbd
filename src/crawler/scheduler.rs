//! Batch scheduler
//!
//! Splits the geography inputs into fixed-size batches and runs each batch
//! with bounded in-flight concurrency. Batches run strictly sequentially;
//! within a batch a counting semaphore admits partitions. A failed input is
//! recorded and never propagated, so one bad input cannot abort its batch.
//! Per-input resources are released by scope exit when each task finishes.

use crate::config::CrawlerConfig;
use crate::inputs::GeoInput;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// One unit of schedulable work: everything keyed by a geography row
#[async_trait]
pub trait InputRunner: Send + Sync {
    async fn run_input(&self, input: &GeoInput) -> crate::Result<()>;
}

/// Counters reported at the end of a run
#[derive(Debug, Default, Clone)]
pub struct RunSummary {
    pub batches: usize,
    pub inputs_succeeded: usize,
    pub inputs_failed: usize,
}

/// Fixed-size-batch scheduler with a per-batch admission gate
pub struct BatchScheduler<R: InputRunner + 'static> {
    runner: Arc<R>,
    batch_size: usize,
    permits: Arc<Semaphore>,
}

impl<R: InputRunner + 'static> BatchScheduler<R> {
    pub fn new(runner: Arc<R>, config: &CrawlerConfig) -> Self {
        Self {
            runner,
            batch_size: config.batch_size.max(1),
            permits: Arc::new(Semaphore::new(config.max_concurrent_partitions.max(1))),
        }
    }

    /// Runs every input, batch by batch
    pub async fn run(&self, inputs: Vec<GeoInput>) -> RunSummary {
        let total_batches = inputs.len().div_ceil(self.batch_size);
        let mut summary = RunSummary::default();

        for (index, batch) in inputs.chunks(self.batch_size).enumerate() {
            tracing::info!(
                "Starting batch {}/{} ({} inputs)",
                index + 1,
                total_batches,
                batch.len()
            );

            let (succeeded, failed) = self.run_batch(batch).await;
            summary.batches += 1;
            summary.inputs_succeeded += succeeded;
            summary.inputs_failed += failed;

            tracing::info!(
                "Completed batch {}/{} | ok: {}, failed: {}",
                index + 1,
                total_batches,
                succeeded,
                failed
            );
        }

        summary
    }

    /// Runs one batch to completion, gathering every outcome
    async fn run_batch(&self, batch: &[GeoInput]) -> (usize, usize) {
        let mut handles = Vec::with_capacity(batch.len());

        for input in batch {
            let runner = Arc::clone(&self.runner);
            let permits = Arc::clone(&self.permits);
            let input = input.clone();

            handles.push(tokio::spawn(async move {
                let _permit = match permits.acquire_owned().await {
                    Ok(permit) => permit,
                    // The gate is never closed while the scheduler is running
                    Err(_) => return Ok(()),
                };
                runner.run_input(&input).await
            }));
        }

        let mut succeeded = 0;
        let mut failed = 0;
        for (handle, input) in handles.into_iter().zip(batch) {
            match handle.await {
                Ok(Ok(())) => succeeded += 1,
                Ok(Err(e)) => {
                    failed += 1;
                    tracing::error!("Input zip {} failed: {}", input.zip, e);
                }
                Err(e) => {
                    failed += 1;
                    tracing::error!("Input zip {} panicked: {}", input.zip, e);
                }
            }
        }

        (succeeded, failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HarvestError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn geo_inputs(count: usize) -> Vec<GeoInput> {
        (0..count)
            .map(|i| GeoInput {
                zip: format!("{:05}", 10000 + i),
            })
            .collect()
    }

    fn config(batch_size: usize, concurrency: usize) -> CrawlerConfig {
        CrawlerConfig {
            batch_size,
            max_concurrent_partitions: concurrency,
            ..Default::default()
        }
    }

    /// Runner that tracks how many inputs run at once
    struct CountingRunner {
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl CountingRunner {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl InputRunner for CountingRunner {
        async fn run_input(&self, _input: &GeoInput) -> crate::Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            tokio::time::sleep(Duration::from_millis(10)).await;

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        }
    }

    /// Runner that fails on every other input
    struct FlakyRunner;

    #[async_trait]
    impl InputRunner for FlakyRunner {
        async fn run_input(&self, input: &GeoInput) -> crate::Result<()> {
            let last_digit = input.zip.chars().last().unwrap().to_digit(10).unwrap();
            if last_digit % 2 == 0 {
                Err(HarvestError::Input {
                    path: input.zip.clone(),
                    message: "synthetic failure".to_string(),
                })
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test]
    async fn test_batch_partitioning_120_inputs() {
        let runner = Arc::new(CountingRunner::new());
        let scheduler = BatchScheduler::new(Arc::clone(&runner), &config(50, 5));

        let summary = scheduler.run(geo_inputs(120)).await;

        // 120 inputs at batch size 50 -> batches of 50, 50, 20
        assert_eq!(summary.batches, 3);
        assert_eq!(summary.inputs_succeeded, 120);
        assert_eq!(summary.inputs_failed, 0);
        assert_eq!(runner.calls.load(Ordering::SeqCst), 120);
    }

    #[tokio::test]
    async fn test_concurrency_bounded_by_semaphore() {
        let runner = Arc::new(CountingRunner::new());
        let scheduler = BatchScheduler::new(Arc::clone(&runner), &config(50, 5));

        scheduler.run(geo_inputs(60)).await;

        assert!(runner.max_in_flight.load(Ordering::SeqCst) <= 5);
        assert!(runner.max_in_flight.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn test_failures_are_isolated() {
        let scheduler = BatchScheduler::new(Arc::new(FlakyRunner), &config(10, 3));

        let summary = scheduler.run(geo_inputs(20)).await;

        assert_eq!(summary.inputs_succeeded + summary.inputs_failed, 20);
        assert_eq!(summary.inputs_failed, 10);
    }

    #[tokio::test]
    async fn test_empty_input_set() {
        let scheduler = BatchScheduler::new(Arc::new(CountingRunner::new()), &config(50, 5));

        let summary = scheduler.run(Vec::new()).await;
        assert_eq!(summary.batches, 0);
        assert_eq!(summary.inputs_succeeded, 0);
    }
}
