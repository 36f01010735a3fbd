use crate::config::types::{CaptchaConfig, Config, CrawlerConfig, HttpConfig, SearchConfig};
use crate::ConfigError;
use url::Url;

/// Known captcha provider names, matched against `[captcha] provider`
pub const KNOWN_PROVIDERS: [&str; 3] = ["two-captcha", "cap-solver", "browser"];

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_search_config(&config.search)?;
    validate_http_config(&config.http)?;
    validate_crawler_config(&config.crawler)?;
    validate_captcha_config(&config.captcha)?;
    validate_output_config(config)?;
    Ok(())
}

/// Validates the target-site search configuration
fn validate_search_config(config: &SearchConfig) -> Result<(), ConfigError> {
    Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if config.tenant_id.is_empty() {
        return Err(ConfigError::Validation(
            "tenant-id cannot be empty".to_string(),
        ));
    }

    if config.page_size < 1 {
        return Err(ConfigError::Validation(format!(
            "page-size must be >= 1, got {}",
            config.page_size
        )));
    }

    Ok(())
}

/// Validates HTTP transport configuration
fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.retries < 1 {
        return Err(ConfigError::Validation(format!(
            "retries must be >= 1, got {}",
            config.retries
        )));
    }

    if config.backoff <= 1.0 {
        return Err(ConfigError::Validation(format!(
            "backoff must be > 1.0, got {}",
            config.backoff
        )));
    }

    Ok(())
}

/// Validates crawl orchestration configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_concurrent_partitions < 1 || config.max_concurrent_partitions > 100 {
        return Err(ConfigError::Validation(format!(
            "max-concurrent-partitions must be between 1 and 100, got {}",
            config.max_concurrent_partitions
        )));
    }

    if config.batch_size < 1 {
        return Err(ConfigError::Validation(format!(
            "batch-size must be >= 1, got {}",
            config.batch_size
        )));
    }

    if config.page_attempts < 1 || config.detail_attempts < 1 {
        return Err(ConfigError::Validation(
            "page-attempts and detail-attempts must be >= 1".to_string(),
        ));
    }

    for (name, (min, max)) in [
        ("pre-request-jitter-ms", config.pre_request_jitter_ms),
        ("retry-delay-ms", config.retry_delay_ms),
    ] {
        if min > max {
            return Err(ConfigError::Validation(format!(
                "{} minimum {} exceeds maximum {}",
                name, min, max
            )));
        }
    }

    Ok(())
}

/// Validates captcha configuration
fn validate_captcha_config(config: &CaptchaConfig) -> Result<(), ConfigError> {
    if !KNOWN_PROVIDERS.contains(&config.provider.as_str()) {
        return Err(ConfigError::UnknownProvider(config.provider.clone()));
    }

    if config.site_key.is_empty() {
        return Err(ConfigError::Validation(
            "site-key cannot be empty".to_string(),
        ));
    }

    Url::parse(&config.page_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid page-url: {}", e)))?;

    if config.browser.pointer_steps < 2 {
        return Err(ConfigError::Validation(format!(
            "pointer-steps must be >= 2, got {}",
            config.browser.pointer_steps
        )));
    }

    Ok(())
}

/// Validates output paths
fn validate_output_config(config: &Config) -> Result<(), ConfigError> {
    if config.output.output_dir.is_empty() {
        return Err(ConfigError::Validation(
            "output-dir cannot be empty".to_string(),
        ));
    }

    if config.output.cache_dir.is_empty() {
        return Err(ConfigError::Validation(
            "cache-dir cannot be empty".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::{InputsConfig, OutputConfig};

    fn base_config() -> Config {
        Config {
            search: SearchConfig {
                base_url: "https://my.example-health.com".to_string(),
                tenant_id: "EH".to_string(),
                distance: "50mi".to_string(),
                page_size: 50,
                fwuid: None,
                app: "siteforce:communityApp".to_string(),
                app_loaded_token: String::new(),
                search_method: "Member_findDoctor".to_string(),
                detail_method: "Member_providerDetails".to_string(),
            },
            http: HttpConfig::default(),
            proxy: None,
            crawler: CrawlerConfig::default(),
            captcha: CaptchaConfig {
                provider: "browser".to_string(),
                site_key: "6LtestKey".to_string(),
                page_url: "https://my.example-health.com/member/s/find-care-plans".to_string(),
                action: "captchaValidation".to_string(),
                api_key: None,
                browser: Default::default(),
            },
            output: OutputConfig {
                output_dir: "./outputs/raw".to_string(),
                cache_dir: "./outputs/static".to_string(),
                cache_max_size_bytes: None,
            },
            inputs: InputsConfig {
                plans_path: "inputs/plans.json".to_string(),
                doctor_specialties_path: "inputs/doc.json".to_string(),
                pcp_specialties_path: "inputs/pcp.json".to_string(),
                dental_specialties_path: "inputs/dental.json".to_string(),
                zips_path: "inputs/uszips.json".to_string(),
            },
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate(&base_config()).is_ok());
    }

    #[test]
    fn test_invalid_base_url() {
        let mut config = base_config();
        config.search.base_url = "not a url".to_string();
        assert!(matches!(
            validate(&config).unwrap_err(),
            ConfigError::InvalidUrl(_)
        ));
    }

    #[test]
    fn test_zero_retries_rejected() {
        let mut config = base_config();
        config.http.retries = 0;
        assert!(matches!(
            validate(&config).unwrap_err(),
            ConfigError::Validation(_)
        ));
    }

    #[test]
    fn test_concurrency_out_of_range() {
        let mut config = base_config();
        config.crawler.max_concurrent_partitions = 0;
        assert!(validate(&config).is_err());

        config.crawler.max_concurrent_partitions = 101;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let mut config = base_config();
        config.captcha.provider = "carrier-pigeon".to_string();
        assert!(matches!(
            validate(&config).unwrap_err(),
            ConfigError::UnknownProvider(_)
        ));
    }

    #[test]
    fn test_inverted_jitter_range_rejected() {
        let mut config = base_config();
        config.crawler.pre_request_jitter_ms = (2000, 500);
        assert!(validate(&config).is_err());
    }
}
