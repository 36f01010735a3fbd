//! HTTP transport layer
//!
//! This module wraps the low-level HTTP mechanics consumed by the crawl
//! engine: URL joining against a configured base, per-call fingerprint
//! header generation, proxy routing, and the exponential-backoff retry
//! discipline around each logical call.

mod executor;
mod headers;

pub use executor::{ExecutorResponse, RequestExecutor};
pub use headers::generate_baseline;
