//! Background write-back of generated pages
//!
//! A generated page is added to the page store of the first website component
//! with `use_store` enabled. The update is a read-modify-commit cycle against
//! the flow's version; a concurrent commit causes the cycle to start over
//! from a fresh read so no update is lost.

use crate::pages::{remove_stored_page, upsert_stored_page, website_components};
use crate::storage::{FlowRepository, StoreError, StoreResult};
use serde_json::Value;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};
use uuid::Uuid;

/// Read-modify-commit cycles attempted before giving up on a contended flow
pub const MAX_COMMIT_ATTEMPTS: usize = 3;

/// Result of editing the page stores of a flow
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistOutcome {
    /// The named component's store changed and the flow was committed
    Committed { component_id: String },
    /// Nothing to change: identical content, or no such page
    Unchanged,
    /// No component with `use_store` enabled can take the page
    NoStore,
}

#[derive(Clone)]
pub struct StoreWriter {
    flows: Arc<dyn FlowRepository>,
}

impl StoreWriter {
    pub fn new(flows: Arc<dyn FlowRepository>) -> Self {
        Self { flows }
    }

    /// Stores `content` under `path` in the flow, committing the new document
    ///
    /// Blocking; call from a blocking-capable context.
    pub fn persist(&self, flow_id: Uuid, path: &str, content: &str) -> StoreResult<PersistOutcome> {
        self.modify(flow_id, |data| upsert_page(data, path, content))
    }

    /// Removes `path` from every website component's store
    ///
    /// The next request for the path regenerates it. Returns `false` when no
    /// store held the path.
    pub fn drop_page(&self, flow_id: Uuid, path: &str) -> StoreResult<bool> {
        let outcome = self.modify(flow_id, |data| remove_page(data, path))?;
        Ok(matches!(outcome, PersistOutcome::Committed { .. }))
    }

    fn modify(
        &self,
        flow_id: Uuid,
        edit: impl Fn(&mut Value) -> PersistOutcome,
    ) -> StoreResult<PersistOutcome> {
        let mut attempt = 1;
        loop {
            let mut flow = self.flows.load_flow(flow_id)?;
            let outcome = edit(&mut flow.data);
            if !matches!(outcome, PersistOutcome::Committed { .. }) {
                return Ok(outcome);
            }

            match self.flows.commit_flow(&flow) {
                Ok(_) => return Ok(outcome),
                Err(StoreError::Conflict { .. }) if attempt < MAX_COMMIT_ATTEMPTS => {
                    debug!("Flow {} changed during commit (attempt {}), retrying", flow_id, attempt);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Runs [`persist`](Self::persist) on a background task
    ///
    /// Failures are logged. The handle may be dropped; tests await it.
    pub fn schedule(&self, flow_id: Uuid, path: String, content: String) -> JoinHandle<()> {
        let writer = self.clone();
        tokio::spawn(async move {
            let result = tokio::task::spawn_blocking(move || {
                let outcome = writer.persist(flow_id, &path, &content);
                (path, outcome)
            })
            .await;

            match result {
                Ok((path, Ok(PersistOutcome::Committed { component_id }))) => {
                    debug!("Stored page {} in component {} of flow {}", path, component_id, flow_id);
                }
                Ok((path, Ok(PersistOutcome::Unchanged))) => {
                    debug!("Page {} of flow {} already up to date", path, flow_id);
                }
                Ok((path, Ok(PersistOutcome::NoStore))) => {
                    warn!("Flow {} no longer stores pages, dropping {}", flow_id, path);
                }
                Ok((path, Err(e))) => {
                    error!("Failed to store page {} for flow {}: {}", path, flow_id, e);
                }
                Err(e) => {
                    error!("Write-back task for flow {} failed: {}", flow_id, e);
                }
            }
        })
    }
}

fn upsert_page(data: &mut Value, path: &str, content: &str) -> PersistOutcome {
    let Some(component) = website_components(data).into_iter().find(|c| c.use_store) else {
        return PersistOutcome::NoStore;
    };

    match upsert_stored_page(data, &component.id, path, content) {
        Some(true) => PersistOutcome::Committed {
            component_id: component.id,
        },
        Some(false) => PersistOutcome::Unchanged,
        None => {
            warn!("Page store of component {} is not a list, leaving it as is", component.id);
            PersistOutcome::NoStore
        }
    }
}

fn remove_page(data: &mut Value, path: &str) -> PersistOutcome {
    let mut first_changed = None;
    for component in website_components(data) {
        if remove_stored_page(data, &component.id, path) == Some(true) {
            first_changed.get_or_insert(component.id);
        }
    }

    match first_changed {
        Some(component_id) => PersistOutcome::Committed { component_id },
        None => PersistOutcome::Unchanged,
    }
}
