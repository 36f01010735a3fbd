//! Captcha token acquisition
//!
//! Every search request to the target must carry a fresh, short-lived
//! reCAPTCHA token bound to an action name. Tokens are never reused across
//! attempts. Three strategies are supported, selected once at configuration
//! time: two remote solving services and a browser-automation extractor.
//!
//! All strategies share one failure convention: a failed solve returns an
//! empty string, never an error. The caller logs the miss and sends the
//! request anyway - the server-side rejection then falls into the page
//! retry loop.

mod browser;
mod remote;

pub use browser::BrowserSource;
pub use remote::{CapSolverSource, TwoCaptchaSource};

use crate::config::{CaptchaConfig, ProxyConfig};
use crate::{ConfigError, ConfigResult};
use async_trait::async_trait;
use std::sync::Arc;

/// Capability interface for captcha token acquisition
///
/// `solve` may take seconds (remote services) to tens of seconds (browser
/// automation); callers must treat it as a suspension point.
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Returns a token bound to the given action, or "" on failure
    async fn solve(&self, action: &str) -> String;
}

/// Constructs the configured token source
///
/// The strategy is fixed for the whole run; the returned trait object is
/// shared across all partitions.
pub fn token_source_from_config(
    captcha: &CaptchaConfig,
    proxy: Option<&ProxyConfig>,
) -> ConfigResult<Arc<dyn TokenSource>> {
    let api_key = captcha.api_key.clone().unwrap_or_default();

    match captcha.provider.as_str() {
        "two-captcha" => Ok(Arc::new(TwoCaptchaSource::new(
            api_key,
            captcha.site_key.clone(),
            captcha.page_url.clone(),
        ))),
        "cap-solver" => Ok(Arc::new(CapSolverSource::new(
            api_key,
            captcha.site_key.clone(),
            captcha.page_url.clone(),
        ))),
        "browser" => Ok(Arc::new(BrowserSource::new(
            captcha.site_key.clone(),
            captcha.page_url.clone(),
            captcha.browser.clone(),
            proxy.cloned(),
        ))),
        other => Err(ConfigError::UnknownProvider(other.to_string())),
    }
}
