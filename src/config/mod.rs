//! Configuration module for the harvester
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files, plus the environment overlay for secrets (proxy credentials and
//! captcha API keys).
//!
//! # Example
//!
//! ```no_run
//! use provider_harvester::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Crawling {} with page size {}", config.search.base_url, config.search.page_size);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    BrowserCaptchaConfig, CaptchaConfig, Config, CrawlerConfig, HttpConfig, InputsConfig,
    OutputConfig, ProxyConfig, SearchConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, overlay_env};
pub use validation::KNOWN_PROVIDERS;
