use crate::config::types::{ClientConfig, Config, CrawlerConfig, FilterConfig, OutputConfig};
use crate::ConfigError;

const MAX_TIMEOUT_SECS: u64 = 300;
const MAX_DELAY_MS: u64 = 60_000;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_client_config(&config.client)?;
    validate_filter_config(&config.filter)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max_pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    if config.timeout_secs < 1 || config.timeout_secs > MAX_TIMEOUT_SECS {
        return Err(ConfigError::Validation(format!(
            "timeout_secs must be between 1 and {}, got {}",
            MAX_TIMEOUT_SECS, config.timeout_secs
        )));
    }

    if config.delay_ms > MAX_DELAY_MS {
        return Err(ConfigError::Validation(format!(
            "delay_ms must be <= {}ms, got {}ms",
            MAX_DELAY_MS, config.delay_ms
        )));
    }

    Ok(())
}

/// Validates client identity configuration
fn validate_client_config(config: &ClientConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    // Header values cannot carry control characters
    if config.user_agent.chars().any(|c| c.is_control()) {
        return Err(ConfigError::Validation(
            "user_agent cannot contain control characters".to_string(),
        ));
    }

    Ok(())
}

/// Validates link filter configuration
fn validate_filter_config(config: &FilterConfig) -> Result<(), ConfigError> {
    for ext in &config.excluded_extensions {
        if ext.len() < 2 || !ext.starts_with('.') {
            return Err(ConfigError::Validation(format!(
                "excluded extension '{}' must start with '.' and name an extension",
                ext
            )));
        }

        if ext[1..].contains(['.', '/']) {
            return Err(ConfigError::Validation(format!(
                "excluded extension '{}' must be a single extension",
                ext
            )));
        }
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    Ok(())
}
