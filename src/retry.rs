//! Bounded retry combinator
//!
//! One retry shape is shared by the three retry sites in the crawl engine:
//! the request executor (exponential backoff), the listing page loop and the
//! detail fetch loop (jittered delays). An operation is attempted up to a
//! fixed budget; `None` from an attempt triggers the backoff sleep and the
//! next attempt, and an exhausted budget yields `None` to the caller - the
//! empty-failure marker, never a panic or error.

use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Delay discipline applied between failed attempts
#[derive(Debug, Clone)]
pub enum Backoff {
    /// Sleep `base^attempt` seconds (attempt is 1-indexed)
    Exponential { base: f64 },

    /// Sleep a uniformly random duration from the inclusive range, milliseconds
    Jittered { min_ms: u64, max_ms: u64 },
}

impl Backoff {
    /// Computes the delay to sleep after the given failed attempt
    pub fn delay(&self, attempt: u32) -> Duration {
        match self {
            Backoff::Exponential { base } => Duration::from_secs_f64(base.powi(attempt as i32)),
            Backoff::Jittered { min_ms, max_ms } => {
                let ms = if min_ms >= max_ms {
                    *min_ms
                } else {
                    rand::thread_rng().gen_range(*min_ms..=*max_ms)
                };
                Duration::from_millis(ms)
            }
        }
    }
}

/// A bounded retry budget with its backoff discipline
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Backoff,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Backoff) -> Self {
        Self {
            // Floor of one attempt
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }
}

/// Runs `op` until it yields a value or the attempt budget is exhausted
///
/// The operation receives the 1-indexed attempt number. No sleep follows the
/// final attempt.
///
/// # Arguments
///
/// * `policy` - Attempt budget and backoff discipline
/// * `op` - Fallible async operation; `None` means "retry"
///
/// # Returns
///
/// * `Some(T)` - A successful attempt's value
/// * `None` - Every attempt failed
pub async fn retry<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> Option<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Option<T>>,
{
    for attempt in 1..=policy.max_attempts {
        if let Some(value) = op(attempt).await {
            return Some(value);
        }

        if attempt < policy.max_attempts {
            tokio::time::sleep(policy.backoff.delay(attempt)).await;
        }
    }

    None
}
