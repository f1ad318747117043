//! Storage traits and error types
//!
//! This module defines the interface to the persistence collaborator that
//! owns flow documents.

use crate::storage::{Flow, NewFlow};
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Flow not found: {0}")]
    FlowNotFound(String),

    #[error("Flow {flow_id} was modified concurrently (expected version {expected_version})")]
    Conflict { flow_id: Uuid, expected_version: i64 },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Access to persisted flow documents
///
/// Methods block on I/O; async callers run them on the blocking pool.
/// Implementations must be shareable across request tasks.
pub trait FlowRepository: Send + Sync {
    /// Resolves a flow by id (UUID form) or by endpoint name
    ///
    /// Returns `Ok(None)` when nothing matches.
    fn resolve_flow(&self, identifier: &str) -> StoreResult<Option<Flow>>;

    /// Loads the current state of a flow
    fn load_flow(&self, id: Uuid) -> StoreResult<Flow>;

    /// Writes `flow.data` back if the stored version still equals `flow.version`
    ///
    /// Returns the committed flow carrying its new version, or
    /// `StoreError::Conflict` when another writer committed first.
    fn commit_flow(&self, flow: &Flow) -> StoreResult<Flow>;

    /// Creates a new flow document
    fn insert_flow(&self, flow: &NewFlow) -> StoreResult<Flow>;

    /// Lists every flow, ordered by name
    fn list_flows(&self) -> StoreResult<Vec<Flow>>;
}
