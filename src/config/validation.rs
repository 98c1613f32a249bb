use crate::config::types::{Config, CrawlerConfig, HttpConfig, StorageConfig};
use crate::ConfigError;
use url::Url;

/// Upper bound shared by both worker pools
const MAX_POOL_SIZE: usize = 256;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_http_config(&config.http)?;
    validate_storage_config(&config.storage)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    validate_pool_size("fetch-concurrency", config.fetch_concurrency)?;
    validate_pool_size("parse-workers", config.parse_workers)?;
    validate_base_origin(&config.base_origin)?;
    Ok(())
}

fn validate_pool_size(name: &str, size: usize) -> Result<(), ConfigError> {
    if size < 1 || size > MAX_POOL_SIZE {
        return Err(ConfigError::Validation(format!(
            "{} must be between 1 and {}, got {}",
            name, MAX_POOL_SIZE, size
        )));
    }
    Ok(())
}

/// The base origin must be an absolute http(s) URL with a host
fn validate_base_origin(origin: &str) -> Result<(), ConfigError> {
    let url = Url::parse(origin).map_err(|e| {
        ConfigError::Validation(format!("Invalid base-origin '{}': {}", origin, e))
    })?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "base-origin '{}' must use http or https",
            origin
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::Validation(format!(
            "base-origin '{}' has no host",
            origin
        )));
    }

    Ok(())
}

/// Validates HTTP client configuration
fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout-secs must be > 0".to_string(),
        ));
    }

    if config.connect_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "connect-timeout-secs must be > 0".to_string(),
        ));
    }

    Ok(())
}

/// Validates storage configuration
fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_pool_size() {
        assert!(validate_pool_size("fetch-concurrency", 1).is_ok());
        assert!(validate_pool_size("fetch-concurrency", 256).is_ok());

        assert!(validate_pool_size("fetch-concurrency", 0).is_err());
        assert!(validate_pool_size("fetch-concurrency", 257).is_err());
    }

    #[test]
    fn test_validate_base_origin() {
        assert!(validate_base_origin("https://en.wikipedia.org").is_ok());
        assert!(validate_base_origin("http://127.0.0.1:8080").is_ok());

        assert!(validate_base_origin("").is_err());
        assert!(validate_base_origin("/wiki/Main_Page").is_err());
        assert!(validate_base_origin("ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_http_timeouts() {
        let mut config = HttpConfig::default();
        config.timeout_secs = 0;
        assert!(validate_http_config(&config).is_err());

        let mut config = HttpConfig::default();
        config.connect_timeout_secs = 0;
        assert!(validate_http_config(&config).is_err());

        let mut config = HttpConfig::default();
        config.user_agent = "   ".to_string();
        assert!(validate_http_config(&config).is_err());
    }
}
