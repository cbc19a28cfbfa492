//! SQLite adapter over `rusqlite`. Useful for local smoke runs and for
//! exercising the full protocol without a server.

use super::{not_connected, settle, AdapterCapabilities, DatabaseAdapter};
use crate::config::DatabaseConfig;
use crate::errors::{ProbeError, ProbeResult};
use crate::model::{Operation, TestResult};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, instrument};

pub struct SqliteAdapter {
    path: String,
    table: String,
    conn: Mutex<Option<Connection>>,
}

impl SqliteAdapter {
    pub fn new(path: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            table: table.into(),
            conn: Mutex::new(None),
        }
    }

    pub fn factory(
        config: &DatabaseConfig,
        table: &str,
    ) -> ProbeResult<Arc<dyn DatabaseAdapter>> {
        let path = config
            .connection_string
            .as_deref()
            .map(strip_scheme)
            .or(config.database.as_deref())
            .filter(|p| !p.is_empty())
            .ok_or_else(|| {
                ProbeError::invalid_config("sqlite requires a connection string or database path")
            })?;
        Ok(Arc::new(Self::new(path, table)))
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    fn guard(&self) -> MutexGuard<'_, Option<Connection>> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` against the open connection, or report the probe as not connected.
    fn probe<F>(&self, operation: Operation, f: F) -> TestResult
    where
        F: FnOnce(&Connection, &str) -> rusqlite::Result<Value>,
    {
        let guard = self.guard();
        match guard.as_ref() {
            Some(conn) => settle(operation, f(conn, &self.table)),
            None => not_connected(operation),
        }
    }
}

fn strip_scheme(url: &str) -> &str {
    url.strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))
        .unwrap_or(url)
}

fn row_json(row: &rusqlite::Row<'_>) -> rusqlite::Result<Value> {
    Ok(json!({
        "id": row.get::<_, String>(0)?,
        "test_message": row.get::<_, String>(1)?,
        "created_at": row.get::<_, Option<String>>(2)?,
    }))
}

#[async_trait]
impl DatabaseAdapter for SqliteAdapter {
    fn engine(&self) -> &'static str {
        "sqlite"
    }

    #[instrument(skip(self), fields(engine = "sqlite", path = %self.path))]
    async fn connect(&self) -> ProbeResult<()> {
        let conn = Connection::open(&self.path)
            .and_then(|c| {
                c.query_row("SELECT 1", [], |r| r.get::<_, i64>(0))?;
                Ok(c)
            })
            .map_err(|e| ProbeError::Connection(format!("SQLite connection failed: {e}")))?;
        *self.guard() = Some(conn);
        debug!("sqlite connection open");
        Ok(())
    }

    async fn disconnect(&self) -> ProbeResult<()> {
        let taken = self.guard().take();
        if let Some(conn) = taken {
            conn.close()
                .map_err(|(_, e)| ProbeError::Connection(format!("SQLite close failed: {e}")))?;
        }
        Ok(())
    }

    async fn create_test_table(&self) -> ProbeResult<()> {
        let guard = self.guard();
        let conn = guard.as_ref().ok_or(ProbeError::NotConnected)?;
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (
                id TEXT PRIMARY KEY,
                test_message TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            )",
            self.table
        );
        conn.execute_batch(&sql)
            .map_err(|e| ProbeError::Query(format!("Failed to create test table: {e}")))
    }

    async fn test_read(&self) -> ProbeResult<TestResult> {
        Ok(self.probe(Operation::Read, |conn, table| {
            let mut stmt = conn.prepare(&format!(
                "SELECT id, test_message, created_at FROM {table}
                 ORDER BY created_at DESC, rowid DESC LIMIT 5"
            ))?;
            let rows = stmt
                .query_map([], row_json)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(json!({ "rowCount": rows.len(), "rows": rows }))
        }))
    }

    async fn test_write(&self, message: &str) -> ProbeResult<TestResult> {
        let id = uuid::Uuid::new_v4().to_string();
        Ok(self.probe(Operation::Write, |conn, table| {
            let row = conn.query_row(
                &format!(
                    "INSERT INTO {table} (id, test_message) VALUES (?1, ?2)
                     RETURNING id, test_message, created_at"
                ),
                params![id, message],
                row_json,
            )?;
            Ok(json!({ "id": id, "insertedRow": row }))
        }))
    }

    async fn test_delete(&self, id: &str) -> ProbeResult<TestResult> {
        Ok(self.probe(Operation::Delete, |conn, table| {
            let deleted = conn.execute(&format!("DELETE FROM {table} WHERE id = ?1"), params![id])?;
            Ok(json!({ "deletedCount": deleted }))
        }))
    }

    fn capabilities(&self) -> AdapterCapabilities {
        AdapterCapabilities::ALL
    }

    async fn drop_test_table(&self) -> ProbeResult<()> {
        let guard = self.guard();
        let Some(conn) = guard.as_ref() else {
            return Ok(());
        };
        conn.execute_batch(&format!("DROP TABLE IF EXISTS {}", self.table))
            .map_err(|e| ProbeError::Query(format!("Failed to drop test table: {e}")))
    }

    async fn health_check(&self) -> ProbeResult<TestResult> {
        let path = self.path.clone();
        Ok(self.probe(Operation::Connection, move |conn, table| {
            let (version, now): (String, String) = conn.query_row(
                "SELECT sqlite_version(), strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                [],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )?;
            let table_present: Option<String> = conn
                .query_row(
                    "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
                    params![table],
                    |r| r.get(0),
                )
                .optional()?;
            Ok(json!({
                "serverTime": now,
                "serverVersion": version,
                "path": path,
                "tablePresent": table_present.is_some(),
            }))
        }))
    }
}
