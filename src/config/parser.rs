use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// After TOML parsing, secrets that must not live in the config file
/// (proxy credentials, captcha API keys) are overlaid from the environment.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;

    let mut config: Config = toml::from_str(&content)?;

    overlay_env(&mut config);
    validate(&config)?;

    Ok(config)
}

/// Overlays environment-sourced secrets onto a parsed configuration
///
/// Reads `PROXY_USERNAME` / `PROXY_PASSWORD` into the proxy section and the
/// provider-appropriate API key (`TWO_CAPTCHA_API_KEY` / `CAP_SOLVER_API_KEY`)
/// into the captcha section. Missing variables leave the fields unset.
pub fn overlay_env(config: &mut Config) {
    if let Some(proxy) = config.proxy.as_mut() {
        proxy.username = std::env::var("PROXY_USERNAME").ok();
        proxy.password = std::env::var("PROXY_PASSWORD").ok();
    }

    config.captcha.api_key = match config.captcha.provider.as_str() {
        "two-captcha" => std::env::var("TWO_CAPTCHA_API_KEY").ok(),
        "cap-solver" => std::env::var("CAP_SOLVER_API_KEY").ok(),
        _ => None,
    };
}

/// Computes a SHA-256 hash of the configuration file content
///
/// This is used to detect if the configuration has changed between runs.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    const VALID_CONFIG: &str = r#"
[search]
base-url = "https://my.example-health.com"
tenant-id = "EH"

[captcha]
provider = "two-captcha"
site-key = "6LtestKey"
page-url = "https://my.example-health.com/member/s/find-care-plans"

[output]
output-dir = "./outputs/raw"
cache-dir = "./outputs/static"

[inputs]
plans-path = "inputs/plans.json"
doctor-specialties-path = "inputs/specialities-doctor-types.json"
pcp-specialties-path = "inputs/specialities-pcp-types.json"
dental-specialties-path = "inputs/specialities-dental-types.json"
zips-path = "inputs/uszips.json"
"#;

    #[test]
    fn test_load_valid_config_with_defaults() {
        let file = create_temp_config(VALID_CONFIG);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.search.base_url, "https://my.example-health.com");
        assert_eq!(config.search.page_size, 50);
        assert_eq!(config.search.distance, "50mi");
        assert_eq!(config.http.retries, 5);
        assert!((config.http.backoff - 2.5).abs() < f64::EPSILON);
        assert_eq!(config.crawler.batch_size, 50);
        assert_eq!(config.crawler.max_concurrent_partitions, 5);
        assert!(config.crawler.sequential_flow);
        assert_eq!(config.crawler.page_attempts, 10);
        assert_eq!(config.captcha.action, "captchaValidation");
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_unknown_provider() {
        let content = VALID_CONFIG.replace("two-captcha", "magic-solver");
        let file = create_temp_config(&content);
        let result = load_config(file.path());
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::UnknownProvider(_)
        ));
    }

    #[test]
    fn test_compute_config_hash() {
        let file = create_temp_config("test content");

        let hash1 = compute_config_hash(file.path()).unwrap();
        let hash2 = compute_config_hash(file.path()).unwrap();

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_different_content_different_hash() {
        let file1 = create_temp_config("content 1");
        let file2 = create_temp_config("content 2");

        let hash1 = compute_config_hash(file1.path()).unwrap();
        let hash2 = compute_config_hash(file2.path()).unwrap();

        assert_ne!(hash1, hash2);
    }
}
