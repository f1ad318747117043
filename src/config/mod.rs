//! Configuration module for Flowsite
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use flowsite::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("flowsite.toml")).unwrap();
//! println!("Listening on {}", config.server.bind_address);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, FeatureFlags, GenerationConfig, ServerConfig, StorageConfig, TelemetryConfig,
    DEFAULT_OUTPUT_COMPONENT,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
