use crate::config::types::{Config, GenerationConfig, ServerConfig, StorageConfig, TelemetryConfig};
use crate::ConfigError;
use std::net::SocketAddr;
use url::Url;

const MAX_TIMEOUT_SECS: u64 = 3600;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_server_config(&config.server)?;
    validate_generation_config(&config.generation)?;
    validate_storage_config(&config.storage)?;
    validate_telemetry_config(&config.telemetry)?;
    Ok(())
}

fn validate_server_config(config: &ServerConfig) -> Result<(), ConfigError> {
    config.bind_address.parse::<SocketAddr>().map_err(|e| {
        ConfigError::Validation(format!(
            "bind_address must be a socket address like 127.0.0.1:7860, got '{}': {}",
            config.bind_address, e
        ))
    })?;
    Ok(())
}

fn validate_generation_config(config: &GenerationConfig) -> Result<(), ConfigError> {
    validate_http_url("generation endpoint", &config.endpoint)?;

    if config.timeout_secs < 1 || config.timeout_secs > MAX_TIMEOUT_SECS {
        return Err(ConfigError::Validation(format!(
            "timeout_secs must be between 1 and {}, got {}",
            MAX_TIMEOUT_SECS, config.timeout_secs
        )));
    }

    if config.output_component.trim().is_empty() {
        return Err(ConfigError::Validation(
            "output_component cannot be empty".to_string(),
        ));
    }

    if let Some(key) = &config.api_key {
        if key.trim().is_empty() {
            return Err(ConfigError::Validation(
                "api_key cannot be blank; remove it instead".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_telemetry_config(config: &TelemetryConfig) -> Result<(), ConfigError> {
    if let Some(endpoint) = &config.endpoint {
        validate_http_url("telemetry endpoint", endpoint)?;
    }
    Ok(())
}

/// Requires an absolute http(s) URL
fn validate_http_url(label: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", label, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            label, value
        )));
    }

    Ok(())
}
