//! Request handling for generated websites
//!
//! One request runs through these steps in order:
//! 1. Resolve the flow
//! 2. Parse parameters (query string or JSON body)
//! 3. Project the website input components; none is a configuration error
//! 4. Return a stored page for the exact path, if any component has one
//! 5. Check link gating
//! 6. Run the pipeline and extract the page HTML
//! 7. Schedule the write-back, then respond
//!
//! Exactly one run event is emitted per request, whatever the outcome.

use crate::config::{Config, FeatureFlags};
use crate::generation::{
    extract_html, website_tweaks, GenerationError, GenerationPipeline, GenerationResult,
    HttpGenerationPipeline, Tweaks,
};
use crate::pages::{ReachabilityGate, WebsiteComponentConfig};
use crate::server::error::{ServeError, NO_HTML_OUTPUT};
use crate::server::request::PageRequest;
use crate::server::writer::StoreWriter;
use crate::storage::{Flow, FlowRepository};
use crate::telemetry::{build_sink, RunEvent, TelemetrySink};
use crate::SiteError;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Per-process serving settings
#[derive(Debug, Clone)]
pub struct ServeSettings {
    pub features: FeatureFlags,
    pub generation_timeout: Duration,
    /// Display name of the component whose result carries the page
    pub output_component: String,
}

impl ServeSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            features: config.features,
            generation_timeout: config.generation.timeout(),
            output_component: config.generation.output_component.clone(),
        }
    }
}

/// Where a served page came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSource {
    Store,
    Generated,
}

/// A successfully served page
#[derive(Debug)]
pub struct Served {
    pub html: String,
    pub source: PageSource,
    /// Background write-back, present when the page was generated for a
    /// flow that stores pages
    pub write_back: Option<JoinHandle<()>>,
}

pub struct PageServer {
    flows: Arc<dyn FlowRepository>,
    pipeline: Arc<dyn GenerationPipeline>,
    telemetry: Arc<dyn TelemetrySink>,
    writer: StoreWriter,
    settings: ServeSettings,
}

impl PageServer {
    pub fn new(
        flows: Arc<dyn FlowRepository>,
        pipeline: Arc<dyn GenerationPipeline>,
        telemetry: Arc<dyn TelemetrySink>,
        settings: ServeSettings,
    ) -> Self {
        let writer = StoreWriter::new(Arc::clone(&flows));
        Self {
            flows,
            pipeline,
            telemetry,
            writer,
            settings,
        }
    }

    /// Wires the HTTP pipeline client and telemetry sink from configuration
    pub fn from_config(config: &Config, flows: Arc<dyn FlowRepository>) -> Result<Self, SiteError> {
        let pipeline = Arc::new(HttpGenerationPipeline::new(&config.generation)?);
        let telemetry = build_sink(&config.telemetry)?;
        Ok(Self::new(
            flows,
            pipeline,
            telemetry,
            ServeSettings::from_config(config),
        ))
    }

    /// Serves one page of the website identified by `identifier`
    pub async fn serve(&self, identifier: &str, request: PageRequest) -> Result<Served, ServeError> {
        let started = Instant::now();
        let result = self.handle(identifier, request).await;

        let error = result.as_ref().err().map(ToString::to_string);
        self.telemetry
            .emit(RunEvent::website(started.elapsed(), error.as_deref()));

        result
    }

    async fn handle(&self, identifier: &str, request: PageRequest) -> Result<Served, ServeError> {
        let path = request.normalized_path();
        debug!("Website request: flow={}, method={}, path={}", identifier, request.method, path);

        let flow = self.resolve(identifier).await?;
        let data = request.parameters()?;

        let components: Vec<WebsiteComponentConfig> = flow
            .website_components()
            .into_iter()
            .map(|c| c.with_features(self.settings.features))
            .collect();
        if components.is_empty() {
            warn!("Flow {} has no website input component", flow.id);
            return Err(ServeError::Misconfigured);
        }

        let stored = components
            .iter()
            .filter(|c| c.use_store)
            .find_map(|c| c.page_store.lookup(&path));
        if let Some(entry) = stored {
            debug!("Serving stored page {} of flow {}", path, flow.id);
            return Ok(Served {
                html: entry.content.clone(),
                source: PageSource::Store,
                write_back: None,
            });
        }

        let gate = ReachabilityGate::from_components(&components);
        if !gate.allows(&path) {
            debug!(
                "Rejecting unlinked path {} of flow {} ({} reachable)",
                path,
                flow.id,
                gate.reachable().len()
            );
            return Err(ServeError::Forbidden(path));
        }

        let tweaks = website_tweaks(components.iter().map(|c| c.id.as_str()), &data, &path);
        let result = self.generate(&flow, &tweaks).await?;
        let html = extract_html(&result, &self.settings.output_component)
            .ok_or_else(|| ServeError::GenerationFailed(NO_HTML_OUTPUT.to_string()))?;

        info!("Generated page {} of flow {} ({} bytes)", path, flow.id, html.len());

        let write_back = components
            .iter()
            .any(|c| c.use_store)
            .then(|| self.writer.schedule(flow.id, path, html.clone()));

        Ok(Served {
            html,
            source: PageSource::Generated,
            write_back,
        })
    }

    async fn resolve(&self, identifier: &str) -> Result<Flow, ServeError> {
        let flows = Arc::clone(&self.flows);
        let lookup = identifier.to_string();
        let found = tokio::task::spawn_blocking(move || flows.resolve_flow(&lookup))
            .await
            .map_err(|e| ServeError::Storage(e.to_string()))?
            .map_err(|e| ServeError::Storage(e.to_string()))?;

        found.ok_or_else(|| ServeError::NotFound(identifier.to_string()))
    }

    async fn generate(&self, flow: &Flow, tweaks: &Tweaks) -> Result<GenerationResult, ServeError> {
        let limit = self.settings.generation_timeout;
        match tokio::time::timeout(limit, self.pipeline.run(flow, tweaks)).await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(e)) => {
                warn!("Generation failed for flow {}: {}", flow.id, e);
                Err(ServeError::GenerationFailed(e.to_string()))
            }
            Err(_) => {
                let e = GenerationError::Timeout(limit);
                warn!("Generation failed for flow {}: {}", flow.id, e);
                Err(ServeError::GenerationFailed(e.to_string()))
            }
        }
    }
}
