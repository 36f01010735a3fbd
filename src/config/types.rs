use serde::Deserialize;

/// Main configuration structure for the harvester
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub search: SearchConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub proxy: Option<ProxyConfig>,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    pub captcha: CaptchaConfig,
    pub output: OutputConfig,
    pub inputs: InputsConfig,
}

/// Target-site search configuration
///
/// Carries the Aura RPC context needed to address the provider-search
/// integration procedures on the target community site.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    /// Base URL of the target site (e.g. "https://my.example-health.com")
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Tenant identifier sent in every search/detail input
    #[serde(rename = "tenant-id")]
    pub tenant_id: String,

    /// Search radius (e.g. "50mi")
    #[serde(default = "default_distance")]
    pub distance: String,

    /// Records requested per listing page
    #[serde(rename = "page-size", default = "default_page_size")]
    pub page_size: u32,

    /// Framework UID of the Aura application; generated per run when absent
    #[serde(default)]
    pub fwuid: Option<String>,

    /// Aura application descriptor
    #[serde(default = "default_app")]
    pub app: String,

    /// Loaded-application token paired with the app descriptor
    #[serde(rename = "app-loaded-token", default)]
    pub app_loaded_token: String,

    /// Integration procedure name for listing searches
    #[serde(rename = "search-method", default = "default_search_method")]
    pub search_method: String,

    /// Integration procedure name for per-provider detail lookups
    #[serde(rename = "detail-method", default = "default_detail_method")]
    pub detail_method: String,
}

/// HTTP transport configuration for the request executor
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Attempts per logical request; floored at 1
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Per-request timeout in seconds
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Exponential backoff base: sleep backoff^attempt seconds between attempts
    #[serde(default = "default_backoff")]
    pub backoff: f64,

    /// Whether to route requests through the configured proxy
    #[serde(rename = "use-proxy", default)]
    pub use_proxy: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            retries: default_retries(),
            timeout_secs: default_timeout_secs(),
            backoff: default_backoff(),
            use_proxy: false,
        }
    }
}

/// Forward-proxy configuration
///
/// Credentials are not read from the config file; they are overlaid from the
/// `PROXY_USERNAME` / `PROXY_PASSWORD` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct ProxyConfig {
    pub host: String,
    pub port: u16,

    #[serde(skip)]
    pub username: Option<String>,
    #[serde(skip)]
    pub password: Option<String>,
}

impl ProxyConfig {
    /// Renders the proxy URL, embedding credentials when both are present
    pub fn url(&self) -> String {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => {
                format!("http://{}:{}@{}:{}", user, pass, self.host, self.port)
            }
            _ => format!("http://{}:{}", self.host, self.port),
        }
    }
}

/// Crawl orchestration configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Geography inputs per batch; batches run strictly sequentially
    #[serde(rename = "batch-size", default = "default_batch_size")]
    pub batch_size: usize,

    /// Maximum partitions in flight within a batch
    #[serde(rename = "max-concurrent-partitions", default = "default_concurrency")]
    pub max_concurrent_partitions: usize,

    /// When true, every record on a page is detail-fetched before the next
    /// page is requested
    #[serde(rename = "sequential-flow", default = "default_true")]
    pub sequential_flow: bool,

    /// Attempts per listing page, each with a freshly acquired captcha token
    #[serde(rename = "page-attempts", default = "default_attempts")]
    pub page_attempts: u32,

    /// Attempts per detail fetch
    #[serde(rename = "detail-attempts", default = "default_attempts")]
    pub detail_attempts: u32,

    /// Jitter slept before each page attempt, milliseconds
    #[serde(rename = "pre-request-jitter-ms", default = "default_pre_jitter")]
    pub pre_request_jitter_ms: (u64, u64),

    /// Delay between failed attempts of the same page/detail, milliseconds
    #[serde(rename = "retry-delay-ms", default = "default_retry_delay")]
    pub retry_delay_ms: (u64, u64),
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            max_concurrent_partitions: default_concurrency(),
            sequential_flow: true,
            page_attempts: default_attempts(),
            detail_attempts: default_attempts(),
            pre_request_jitter_ms: default_pre_jitter(),
            retry_delay_ms: default_retry_delay(),
        }
    }
}

/// Captcha token acquisition configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CaptchaConfig {
    /// Strategy: "two-captcha", "cap-solver", or "browser"
    pub provider: String,

    /// reCAPTCHA site key of the target page
    #[serde(rename = "site-key")]
    pub site_key: String,

    /// URL of the page carrying the captcha widget
    #[serde(rename = "page-url")]
    pub page_url: String,

    /// Action name bound to each token
    #[serde(default = "default_action")]
    pub action: String,

    /// API key for the remote solving service; overlaid from
    /// `TWO_CAPTCHA_API_KEY` / `CAP_SOLVER_API_KEY`
    #[serde(skip)]
    pub api_key: Option<String>,

    #[serde(default)]
    pub browser: BrowserCaptchaConfig,
}

/// Browser-automation strategy configuration
#[derive(Debug, Clone, Deserialize)]
pub struct BrowserCaptchaConfig {
    /// Persistent session (user-data) directory; unsafe to share between
    /// concurrently running processes
    #[serde(rename = "session-dir", default = "default_session_dir")]
    pub session_dir: String,

    #[serde(default = "default_true")]
    pub headless: bool,

    /// Pages visited before navigating to the target, oldest first
    #[serde(rename = "decoy-urls", default = "default_decoys")]
    pub decoy_urls: Vec<String>,

    /// Interpolation steps of the synthetic pointer-movement curve
    #[serde(rename = "pointer-steps", default = "default_pointer_steps")]
    pub pointer_steps: u32,
}

impl Default for BrowserCaptchaConfig {
    fn default() -> Self {
        Self {
            session_dir: default_session_dir(),
            headless: true,
            decoy_urls: default_decoys(),
            pointer_steps: default_pointer_steps(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Root directory for raw listing/detail artifacts
    #[serde(rename = "output-dir")]
    pub output_dir: String,

    /// Directory holding the dedup cache database
    #[serde(rename = "cache-dir")]
    pub cache_dir: String,

    /// Advisory cap on the dedup store size, bytes
    #[serde(rename = "cache-max-size-bytes", default)]
    pub cache_max_size_bytes: Option<u64>,
}

/// Static reference table locations
#[derive(Debug, Clone, Deserialize)]
pub struct InputsConfig {
    /// Plan table (JSON list with NetworkCode/LobMctrType/CoverageType)
    #[serde(rename = "plans-path")]
    pub plans_path: String,

    /// Doctor specialty table
    #[serde(rename = "doctor-specialties-path")]
    pub doctor_specialties_path: String,

    /// Primary-care specialty table
    #[serde(rename = "pcp-specialties-path")]
    pub pcp_specialties_path: String,

    /// Dental specialty table
    #[serde(rename = "dental-specialties-path")]
    pub dental_specialties_path: String,

    /// Geography list (JSON rows with a zip field)
    #[serde(rename = "zips-path")]
    pub zips_path: String,
}

fn default_distance() -> String {
    "50mi".to_string()
}

fn default_page_size() -> u32 {
    50
}

fn default_app() -> String {
    "siteforce:communityApp".to_string()
}

fn default_search_method() -> String {
    "Member_findDoctor".to_string()
}

fn default_detail_method() -> String {
    "Member_providerDetails".to_string()
}

fn default_retries() -> u32 {
    5
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_backoff() -> f64 {
    2.5
}

fn default_batch_size() -> usize {
    50
}

fn default_concurrency() -> usize {
    5
}

fn default_true() -> bool {
    true
}

fn default_attempts() -> u32 {
    10
}

fn default_pre_jitter() -> (u64, u64) {
    (500, 1500)
}

fn default_retry_delay() -> (u64, u64) {
    (1000, 2000)
}

fn default_action() -> String {
    "captchaValidation".to_string()
}

fn default_session_dir() -> String {
    "sessions/captcha_profile".to_string()
}

fn default_decoys() -> Vec<String> {
    vec![
        "https://www.google.com".to_string(),
        "https://news.ycombinator.com".to_string(),
    ]
}

fn default_pointer_steps() -> u32 {
    50
}
