//! Browser-automation token extraction
//!
//! Launches a persistent Chromium session, warms it with decoy navigation and
//! a synthetic human pointer movement, then executes the reCAPTCHA API on the
//! target page to mint a token. The session directory keeps cookies and
//! fingerprint state between runs; two processes must not share it.

use crate::captcha::TokenSource;
use crate::config::{BrowserCaptchaConfig, ProxyConfig};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::layout::Point;
use chromiumoxide::Page;
use futures::StreamExt;
use rand::Rng;
use std::time::Duration;
use tokio::time::sleep;

/// Attempts at the automation layer, independent of the executor's retries
const SESSION_ATTEMPTS: u32 = 5;

/// Token-minting script executed in the page context
///
/// Loads the reCAPTCHA API when the page has not already done so, then asks
/// it for a token bound to the given action.
fn token_script(site_key: &str, action: &str) -> String {
    format!(
        r#"
async () => {{
    const siteKey = '{site_key}';
    const action = '{action}';
    if (typeof grecaptcha === 'undefined') {{
        const script = document.createElement('script');
        script.src = `https://www.google.com/recaptcha/api.js?render=${{siteKey}}`;
        document.head.appendChild(script);
        await new Promise((resolve) => {{ script.onload = resolve; }});
        await new Promise((resolve) => setTimeout(resolve, 2000));
    }}
    return new Promise((resolve) => {{
        grecaptcha.ready(function() {{
            grecaptcha.execute(siteKey, {{ action: action }}).then(resolve);
        }});
    }});
}}
"#
    )
}

/// Token source backed by a persistent automated browser session
pub struct BrowserSource {
    site_key: String,
    page_url: String,
    config: BrowserCaptchaConfig,
    proxy: Option<ProxyConfig>,
}

impl BrowserSource {
    pub fn new(
        site_key: String,
        page_url: String,
        config: BrowserCaptchaConfig,
        proxy: Option<ProxyConfig>,
    ) -> Self {
        Self {
            site_key,
            page_url,
            config,
            proxy,
        }
    }

    /// One full session: launch, warm up, mint, close
    async fn run_session(&self, action: &str) -> Result<String> {
        let mut builder = BrowserConfig::builder()
            .user_data_dir(&self.config.session_dir)
            .window_size(1366, 768)
            .no_sandbox()
            .arg("--disable-dev-shm-usage");

        if !self.config.headless {
            builder = builder.with_head();
        }

        if let Some(proxy) = &self.proxy {
            builder = builder.arg(format!("--proxy-server=http://{}:{}", proxy.host, proxy.port));
        }

        let config = builder.build().map_err(|e| anyhow!(e))?;

        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .context("failed to launch browser")?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let result = self.mint_token(&browser, action).await;

        // Always tear the session down, even on a failed mint
        let _ = browser.close().await;
        handler_task.abort();

        result
    }

    /// Drives the warm-up choreography and executes the token script
    async fn mint_token(&self, browser: &Browser, action: &str) -> Result<String> {
        let page = browser
            .new_page("about:blank")
            .await
            .context("failed to open page")?;

        for decoy in &self.config.decoy_urls {
            page.goto(decoy.as_str())
                .await
                .with_context(|| format!("decoy navigation to {} failed", decoy))?;
            sleep(Duration::from_millis(2000)).await;
            scroll_by(&page, 300).await?;
            sleep(Duration::from_millis(1500)).await;
        }

        tracing::debug!("Navigating to target page {}", self.page_url);
        page.goto(self.page_url.as_str())
            .await
            .context("target navigation failed")?;
        page.wait_for_navigation()
            .await
            .context("target page never settled")?;

        human_pointer_curve(&page, (100.0, 100.0), (500.0, 380.0), self.config.pointer_steps)
            .await?;
        scroll_by(&page, 500).await?;
        sleep(Duration::from_millis(5000)).await;

        let token: String = page
            .evaluate_function(token_script(&self.site_key, action))
            .await
            .context("token script failed")?
            .into_value()
            .context("token script returned a non-string")?;

        Ok(token)
    }
}

async fn scroll_by(page: &Page, pixels: i64) -> Result<()> {
    page.evaluate(format!("window.scrollBy(0, {})", pixels))
        .await
        .context("scroll failed")?;
    Ok(())
}

/// Moves the pointer along a cubic Bezier curve between two points
///
/// Control points are randomized within the bounding box of the endpoints,
/// and each interpolation step sleeps 5-25 ms, approximating a human
/// mouse trajectory.
async fn human_pointer_curve(
    page: &Page,
    start: (f64, f64),
    end: (f64, f64),
    steps: u32,
) -> Result<()> {
    let path = {
        let mut rng = rand::thread_rng();
        bezier_path(start, end, steps, &mut rng)
    };

    for (x, y) in path {
        page.move_mouse(Point::new(x, y))
            .await
            .context("pointer move failed")?;
        let pause = rand::thread_rng().gen_range(5..=25);
        sleep(Duration::from_millis(pause)).await;
    }

    Ok(())
}

/// Interpolates `steps + 1` points of a cubic Bezier with random control points
fn bezier_path(
    start: (f64, f64),
    end: (f64, f64),
    steps: u32,
    rng: &mut impl Rng,
) -> Vec<(f64, f64)> {
    let (x1, y1) = start;
    let (x2, y2) = end;

    let cx1 = x1 + (x2 - x1) * rng.gen::<f64>();
    let cy1 = y1 + (y2 - y1) * rng.gen::<f64>();
    let cx2 = x1 + (x2 - x1) * rng.gen::<f64>();
    let cy2 = y1 + (y2 - y1) * rng.gen::<f64>();

    (0..=steps)
        .map(|i| {
            let t = f64::from(i) / f64::from(steps);
            let u = 1.0 - t;
            let x = u.powi(3) * x1
                + 3.0 * u.powi(2) * t * cx1
                + 3.0 * u * t.powi(2) * cx2
                + t.powi(3) * x2;
            let y = u.powi(3) * y1
                + 3.0 * u.powi(2) * t * cy1
                + 3.0 * u * t.powi(2) * cy2
                + t.powi(3) * y2;
            (x, y)
        })
        .collect()
}

#[async_trait]
impl TokenSource for BrowserSource {
    async fn solve(&self, action: &str) -> String {
        for attempt in 1..=SESSION_ATTEMPTS {
            match self.run_session(action).await {
                Ok(token) if !token.is_empty() => return token,
                Ok(_) => {
                    tracing::warn!(attempt, "Browser session produced an empty token");
                }
                Err(e) => {
                    tracing::warn!(attempt, "Browser session failed: {:#}", e);
                }
            }
            sleep(Duration::from_secs(2)).await;
        }

        tracing::error!(
            "Failed to extract a captcha token after {} browser sessions",
            SESSION_ATTEMPTS
        );
        String::new()
    }
}
