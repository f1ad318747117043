//! Generation pipeline module
//!
//! The pipeline is an external service: given a flow and per-component
//! overrides it executes the flow and returns its named outputs. This module
//! defines that contract, the HTTP client that talks to the service, and the
//! extraction of page HTML from a result.

mod client;
mod result;

pub use client::{build_http_client, HttpGenerationPipeline};
pub use result::{extract_html, GenerationResult, ResultData, RunOutputs, HTML_RESULT_KEY};

use crate::storage::Flow;
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::time::Duration;
use thiserror::Error;

/// Per-component overrides, keyed by component id
pub type Tweaks = Map<String, Value>;

/// Errors raised by a pipeline run
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Invalid pipeline endpoint: {0}")]
    Endpoint(#[from] url::ParseError),

    #[error("Request to generation pipeline failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Generation pipeline returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Generation timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("{0}")]
    Failed(String),
}

/// A service that executes flows
#[async_trait]
pub trait GenerationPipeline: Send + Sync {
    /// Runs `flow` with `tweaks` applied to its components
    async fn run(&self, flow: &Flow, tweaks: &Tweaks) -> Result<GenerationResult, GenerationError>;
}

/// Builds the overrides handed to every website input component
///
/// Each component receives the same `{data, path}` pair.
pub fn website_tweaks<'a>(
    component_ids: impl IntoIterator<Item = &'a str>,
    data: &Value,
    path: &str,
) -> Tweaks {
    component_ids
        .into_iter()
        .map(|id| (id.to_string(), json!({ "data": data, "path": path })))
        .collect()
}
