//! Storage module for flow documents
//!
//! This module handles persistence of the flows that describe each website:
//! - SQLite database initialization and schema management
//! - Resolution by id or endpoint name
//! - Versioned commits that reject concurrent overwrites

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteFlowStore;
pub use traits::{FlowRepository, StoreError, StoreResult};

use crate::pages::{website_components, WebsiteComponentConfig};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use uuid::Uuid;

/// Opens (or creates) the flow database at `path`
pub fn open_storage(path: &Path) -> StoreResult<SqliteFlowStore> {
    SqliteFlowStore::new(path)
}

/// A persisted flow document
#[derive(Debug, Clone, PartialEq)]
pub struct Flow {
    pub id: Uuid,
    pub name: String,
    pub endpoint_name: Option<String>,
    /// The flow graph; website components and their page stores live here
    pub data: Value,
    /// Incremented on every commit
    pub version: i64,
    pub updated_at: String,
}

impl Flow {
    /// Typed view of the flow's website input components
    pub fn website_components(&self) -> Vec<WebsiteComponentConfig> {
        website_components(&self.data)
    }
}

/// Input for creating a flow, also the import file format
#[derive(Debug, Clone, Deserialize)]
pub struct NewFlow {
    pub name: String,
    #[serde(default)]
    pub endpoint_name: Option<String>,
    pub data: Value,
}
