//! Flowsite: cached web pages generated by a flow pipeline
//!
//! This crate serves pages produced by an external generation pipeline, caches
//! them inside the flow document that describes the site, and optionally
//! restricts generation to paths linked from pages that were already generated.

pub mod config;
pub mod generation;
pub mod links;
pub mod pages;
pub mod server;
pub mod storage;
pub mod telemetry;

use thiserror::Error;

/// Main error type for Flowsite operations
#[derive(Debug, Error)]
pub enum SiteError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StoreError),

    #[error("Generation error: {0}")]
    Generation(#[from] generation::GenerationError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),
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
}

/// Result type alias for Flowsite operations
pub type Result<T> = std::result::Result<T, SiteError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use links::{extract_internal_links, normalize_page_path};
pub use pages::{is_allowed, PageEntry, PageStore, WebsiteComponentConfig};
pub use server::{PageServer, ServeError};
