//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the FlowRepository trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{FlowRepository, StoreError, StoreResult};
use crate::storage::{Flow, NewFlow};
use chrono::Utc;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

const FLOW_COLUMNS: &str = "id, name, endpoint_name, data, version, updated_at";

/// SQLite storage backend
///
/// A single connection guarded by a mutex; request tasks call in from the
/// blocking pool.
pub struct SqliteFlowStore {
    conn: Mutex<Connection>,
}

impl SqliteFlowStore {
    /// Opens or creates the database at `path`
    pub fn new(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA busy_timeout = 5000;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory database (for tests and dry runs)
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn connection(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Database("connection lock poisoned".to_string()))
    }

    fn query_flow(
        conn: &Connection,
        filter: &str,
        value: &str,
    ) -> StoreResult<Option<Flow>> {
        let sql = format!("SELECT {} FROM flows WHERE {} = ?1", FLOW_COLUMNS, filter);
        let row = conn
            .query_row(&sql, params![value], FlowRow::from_row)
            .optional()?;
        row.map(FlowRow::into_flow).transpose()
    }
}

/// Raw column values of a `flows` row
struct FlowRow {
    id: String,
    name: String,
    endpoint_name: Option<String>,
    data: String,
    version: i64,
    updated_at: String,
}

impl FlowRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            endpoint_name: row.get(2)?,
            data: row.get(3)?,
            version: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }

    fn into_flow(self) -> StoreResult<Flow> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| StoreError::Serialization(format!("Invalid flow id '{}': {}", self.id, e)))?;
        let data = serde_json::from_str(&self.data).map_err(|e| {
            StoreError::Serialization(format!("Invalid document for flow {}: {}", id, e))
        })?;

        Ok(Flow {
            id,
            name: self.name,
            endpoint_name: self.endpoint_name,
            data,
            version: self.version,
            updated_at: self.updated_at,
        })
    }
}

fn map_constraint(err: rusqlite::Error) -> StoreError {
    match err {
        rusqlite::Error::SqliteFailure(ref failure, ref message)
            if failure.code == ErrorCode::ConstraintViolation =>
        {
            StoreError::ConstraintViolation(
                message
                    .clone()
                    .unwrap_or_else(|| "constraint violated".to_string()),
            )
        }
        other => StoreError::Sqlite(other),
    }
}

impl FlowRepository for SqliteFlowStore {
    fn resolve_flow(&self, identifier: &str) -> StoreResult<Option<Flow>> {
        let conn = self.connection()?;
        match Uuid::parse_str(identifier) {
            Ok(id) => Self::query_flow(&conn, "id", &id.to_string()),
            Err(_) => Self::query_flow(&conn, "endpoint_name", identifier),
        }
    }

    fn load_flow(&self, id: Uuid) -> StoreResult<Flow> {
        let conn = self.connection()?;
        Self::query_flow(&conn, "id", &id.to_string())?
            .ok_or_else(|| StoreError::FlowNotFound(id.to_string()))
    }

    fn commit_flow(&self, flow: &Flow) -> StoreResult<Flow> {
        let data = serde_json::to_string(&flow.data)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        let now = Utc::now().to_rfc3339();
        let id = flow.id.to_string();

        let conn = self.connection()?;
        let updated = conn.execute(
            "UPDATE flows SET data = ?1, version = version + 1, updated_at = ?2
             WHERE id = ?3 AND version = ?4",
            params![data, now, id, flow.version],
        )?;

        if updated == 0 {
            let exists: Option<i64> = conn
                .query_row("SELECT version FROM flows WHERE id = ?1", params![id], |row| {
                    row.get(0)
                })
                .optional()?;
            return Err(match exists {
                Some(_) => StoreError::Conflict {
                    flow_id: flow.id,
                    expected_version: flow.version,
                },
                None => StoreError::FlowNotFound(id),
            });
        }

        Ok(Flow {
            version: flow.version + 1,
            updated_at: now,
            ..flow.clone()
        })
    }

    fn insert_flow(&self, flow: &NewFlow) -> StoreResult<Flow> {
        let id = Uuid::new_v4();
        let data = serde_json::to_string(&flow.data)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        let now = Utc::now().to_rfc3339();

        let conn = self.connection()?;
        conn.execute(
            "INSERT INTO flows (id, name, endpoint_name, data, version, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, 1, ?5, ?5)",
            params![id.to_string(), flow.name, flow.endpoint_name, data, now],
        )
        .map_err(map_constraint)?;

        Ok(Flow {
            id,
            name: flow.name.clone(),
            endpoint_name: flow.endpoint_name.clone(),
            data: flow.data.clone(),
            version: 1,
            updated_at: now,
        })
    }

    fn list_flows(&self) -> StoreResult<Vec<Flow>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM flows ORDER BY name ASC",
            FLOW_COLUMNS
        ))?;

        let rows = stmt
            .query_map([], FlowRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(FlowRow::into_flow).collect()
    }
}
