use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Flowsite
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub generation: GenerationConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub features: FeatureFlags,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Socket address to listen on (e.g. "127.0.0.1:7860")
    #[serde(rename = "bind-address")]
    pub bind_address: String,
}

/// Generation pipeline client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationConfig {
    /// Base URL of the pipeline service
    pub endpoint: String,

    /// Upper bound for a single pipeline call (seconds)
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Display name of the component whose output carries the page HTML
    #[serde(rename = "output-component", default = "default_output_component")]
    pub output_component: String,

    /// Optional key sent as `x-api-key`
    #[serde(rename = "api-key", default)]
    pub api_key: Option<String>,
}

impl GenerationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Flow document storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file holding flow documents
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// Process-wide switches, read once at startup
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct FeatureFlags {
    /// Enables page-store caching and link gating for every flow
    #[serde(rename = "page-store", default = "default_true")]
    pub page_store: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self { page_store: true }
    }
}

/// Run-event sink configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TelemetryConfig {
    /// Collector URL; events are only logged when absent
    #[serde(default)]
    pub endpoint: Option<String>,
}

pub const DEFAULT_OUTPUT_COMPONENT: &str = "Website Output";

fn default_timeout_secs() -> u64 {
    120
}

fn default_output_component() -> String {
    DEFAULT_OUTPUT_COMPONENT.to_string()
}

fn default_true() -> bool {
    true
}
