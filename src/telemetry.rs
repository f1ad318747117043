//! Run-event telemetry
//!
//! Every page request produces exactly one [`RunEvent`]. Sinks must return
//! immediately; anything slow happens on a spawned task.

use crate::config::TelemetryConfig;
use crate::generation::build_http_client;
use crate::SiteError;
use reqwest::Client;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Completion record of one website request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunEvent {
    pub is_website: bool,
    pub duration_seconds: f64,
    pub success: bool,
    pub error_message: String,
}

impl RunEvent {
    pub fn website(elapsed: Duration, error: Option<&str>) -> Self {
        Self {
            is_website: true,
            duration_seconds: elapsed.as_secs_f64(),
            success: error.is_none(),
            error_message: error.unwrap_or_default().to_string(),
        }
    }
}

/// Fire-and-forget destination for run events
pub trait TelemetrySink: Send + Sync {
    fn emit(&self, event: RunEvent);
}

/// Writes run events to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogTelemetry;

impl TelemetrySink for LogTelemetry {
    fn emit(&self, event: RunEvent) {
        if event.success {
            tracing::info!(
                target: "flowsite::telemetry",
                duration_seconds = event.duration_seconds,
                "website run succeeded"
            );
        } else {
            tracing::info!(
                target: "flowsite::telemetry",
                duration_seconds = event.duration_seconds,
                error = %event.error_message,
                "website run failed"
            );
        }
    }
}

/// Posts run events as JSON to a collector
pub struct HttpTelemetry {
    client: Client,
    endpoint: Url,
}

impl HttpTelemetry {
    pub fn new(endpoint: &str) -> Result<Self, SiteError> {
        Ok(Self {
            client: build_http_client(Duration::from_secs(10))?,
            endpoint: Url::parse(endpoint)?,
        })
    }
}

impl TelemetrySink for HttpTelemetry {
    fn emit(&self, event: RunEvent) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("Dropping run event: no async runtime available");
            return;
        };

        let client = self.client.clone();
        let endpoint = self.endpoint.clone();
        runtime.spawn(async move {
            let sent = client
                .post(endpoint.clone())
                .json(&event)
                .send()
                .await
                .and_then(|response| response.error_for_status());
            if let Err(e) = sent {
                tracing::warn!("Failed to deliver run event to {}: {}", endpoint, e);
            }
        });
    }
}

/// Chooses the sink for the given configuration
pub fn build_sink(config: &TelemetryConfig) -> Result<Arc<dyn TelemetrySink>, SiteError> {
    match &config.endpoint {
        Some(endpoint) => Ok(Arc::new(HttpTelemetry::new(endpoint)?)),
        None => Ok(Arc::new(LogTelemetry)),
    }
}
