//! Provider-Harvester: a provider-directory crawl engine
//!
//! This crate crawls a paginated, captcha-protected provider-search API exposed
//! through a Salesforce-style "Aura" RPC layer. It drives pagination across many
//! independent search partitions (geography × plan × specialty), acquires a fresh
//! captcha token per request, schedules partitions in bounded-concurrency batches,
//! and deduplicates per-record detail fetches through a durable on-disk cache.

pub mod artifacts;
pub mod cache;
pub mod captcha;
pub mod client;
pub mod config;
pub mod crawler;
pub mod inputs;
pub mod retry;
pub mod rpc;

use thiserror::Error;

/// Main error type for harvester operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Cache error: {0}")]
    Cache(#[from] cache::CacheError),

    #[error("RPC decode error: {0}")]
    Decode(String),

    #[error("Input file error for {path}: {message}")]
    Input { path: String, message: String },

    #[error("Browser automation error: {0}")]
    Browser(String),

    #[error("Task join error: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Unknown captcha provider: {0}")]
    UnknownProvider(String),
}

/// Result type alias for harvester operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use cache::DedupCache;
pub use client::RequestExecutor;
pub use config::Config;
pub use crawler::{BatchScheduler, DetailFetcher, ListingCrawler, PageCursor, Partition};
