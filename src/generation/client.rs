//! HTTP client for the generation pipeline
//!
//! Runs are submitted as `POST {endpoint}/api/v1/run/{flow_id}` with the
//! website input/output types and the per-component tweaks.

use crate::config::GenerationConfig;
use crate::generation::{GenerationError, GenerationPipeline, GenerationResult, Tweaks};
use crate::storage::Flow;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use url::Url;

const USER_AGENT: &str = concat!("flowsite/", env!("CARGO_PKG_VERSION"));

/// Longest error body echoed back in an error message
const MAX_ERROR_BODY: usize = 512;

/// Body of a run request
#[derive(Debug, Serialize)]
struct RunRequest<'a> {
    input_value: &'a str,
    input_type: &'a str,
    output_type: &'a str,
    tweaks: &'a Tweaks,
}

/// Builds an HTTP client whose requests give up after `timeout`
pub fn build_http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Generation pipeline reached over HTTP
pub struct HttpGenerationPipeline {
    client: Client,
    endpoint: Url,
    api_key: Option<String>,
}

impl HttpGenerationPipeline {
    pub fn new(config: &GenerationConfig) -> Result<Self, GenerationError> {
        let mut endpoint = Url::parse(&config.endpoint)?;
        if !endpoint.path().ends_with('/') {
            let path = format!("{}/", endpoint.path());
            endpoint.set_path(&path);
        }

        Ok(Self {
            client: build_http_client(config.timeout())?,
            endpoint,
            api_key: config.api_key.clone(),
        })
    }

    fn run_url(&self, flow: &Flow) -> Result<Url, GenerationError> {
        let mut url = self.endpoint.join(&format!("api/v1/run/{}", flow.id))?;
        url.set_query(Some("stream=false"));
        Ok(url)
    }
}

#[async_trait]
impl GenerationPipeline for HttpGenerationPipeline {
    async fn run(&self, flow: &Flow, tweaks: &Tweaks) -> Result<GenerationResult, GenerationError> {
        let url = self.run_url(flow)?;
        let body = RunRequest {
            input_value: "",
            input_type: "website",
            output_type: "website",
            tweaks,
        };

        tracing::debug!("Submitting run for flow {} to {}", flow.id, url);

        let mut request = self.client.post(url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.header("x-api-key", key);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(GenerationError::Status {
                status: status.as_u16(),
                message: error_message(&text),
            });
        }

        Ok(response.json::<GenerationResult>().await?)
    }
}

/// Picks the proximate error out of an error body
///
/// Pipeline errors arrive as `{"detail": "..."}`; anything else is echoed,
/// truncated.
fn error_message(body: &str) -> String {
    if let Ok(Value::Object(record)) = serde_json::from_str::<Value>(body) {
        if let Some(detail) = record.get("detail").and_then(Value::as_str) {
            return detail.to_string();
        }
    }
    body.chars().take(MAX_ERROR_BODY).collect()
}
