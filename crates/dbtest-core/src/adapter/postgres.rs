//! PostgreSQL adapter over an `sqlx` connection pool.

use super::{not_connected, settle, AdapterCapabilities, DatabaseAdapter};
use crate::config::DatabaseConfig;
use crate::errors::{ProbeError, ProbeResult};
use crate::model::{Operation, TestResult};
use async_trait::async_trait;
use serde_json::{json, Value};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use sqlx::PgPool;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

const POOL_SIZE: u32 = 5;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

type ProbeRow = (String, String, Option<String>);

pub struct PostgresAdapter {
    options: PgConnectOptions,
    table: String,
    pool: Arc<RwLock<Option<PgPool>>>,
}

impl PostgresAdapter {
    pub fn new(options: PgConnectOptions, table: impl Into<String>) -> Self {
        Self {
            options,
            table: table.into(),
            pool: Arc::new(RwLock::new(None)),
        }
    }

    pub fn factory(
        config: &DatabaseConfig,
        table: &str,
    ) -> ProbeResult<Arc<dyn DatabaseAdapter>> {
        Ok(Arc::new(Self::new(connect_options(config)?, table)))
    }

    async fn current_pool(&self) -> Option<PgPool> {
        self.pool.read().await.clone()
    }
}

/// Connection string wins over discrete fields. `ssl` forces `require`.
pub fn connect_options(config: &DatabaseConfig) -> ProbeResult<PgConnectOptions> {
    let options = match config.connection_string.as_deref() {
        Some(url) => PgConnectOptions::from_str(url).map_err(|e| {
            ProbeError::invalid_config(format!("invalid PostgreSQL connection string: {e}"))
        })?,
        None => {
            let mut options = PgConnectOptions::new()
                .host(config.host.as_deref().unwrap_or("localhost"))
                .port(config.effective_port().unwrap_or(5432));
            if let Some(db) = &config.database {
                options = options.database(db);
            }
            if let Some(user) = &config.username {
                options = options.username(user);
            }
            if let Some(password) = &config.password {
                options = options.password(password);
            }
            options.ssl_mode(PgSslMode::Prefer)
        }
    };
    Ok(if config.ssl {
        options.ssl_mode(PgSslMode::Require)
    } else {
        options
    })
}

fn row_json((id, test_message, created_at): ProbeRow) -> Value {
    json!({ "id": id, "test_message": test_message, "created_at": created_at })
}

#[async_trait]
impl DatabaseAdapter for PostgresAdapter {
    fn engine(&self) -> &'static str {
        "postgresql"
    }

    #[instrument(skip(self), fields(engine = "postgresql"))]
    async fn connect(&self) -> ProbeResult<()> {
        let pool = PgPoolOptions::new()
            .max_connections(POOL_SIZE)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect_with(self.options.clone())
            .await
            .map_err(|e| ProbeError::Connection(format!("PostgreSQL connection failed: {e}")))?;

        sqlx::query("SELECT 1")
            .execute(&pool)
            .await
            .map_err(|e| ProbeError::Connection(format!("PostgreSQL connection failed: {e}")))?;

        *self.pool.write().await = Some(pool);
        info!("PostgreSQL connection pool established");
        Ok(())
    }

    async fn disconnect(&self) -> ProbeResult<()> {
        let taken = self.pool.write().await.take();
        if let Some(pool) = taken {
            pool.close().await;
            debug!("PostgreSQL pool closed");
        }
        Ok(())
    }

    async fn create_test_table(&self) -> ProbeResult<()> {
        let pool = self.current_pool().await.ok_or(ProbeError::NotConnected)?;
        let create = format!(
            "CREATE TABLE IF NOT EXISTS {} (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                test_message TEXT NOT NULL,
                created_at TIMESTAMP WITH TIME ZONE DEFAULT NOW()
            )",
            self.table
        );
        let comment = format!(
            "COMMENT ON TABLE {} IS 'Database connectivity test table'",
            self.table
        );
        for sql in [create, comment] {
            sqlx::query(&sql)
                .execute(&pool)
                .await
                .map_err(|e| ProbeError::Query(format!("Failed to create test table: {e}")))?;
        }
        Ok(())
    }

    async fn test_read(&self) -> ProbeResult<TestResult> {
        let Some(pool) = self.current_pool().await else {
            return Ok(not_connected(Operation::Read));
        };
        let sql = format!(
            "SELECT id::text, test_message, created_at::text FROM {}
             ORDER BY created_at DESC LIMIT 5",
            self.table
        );
        let outcome = sqlx::query_as::<_, ProbeRow>(&sql)
            .fetch_all(&pool)
            .await
            .map(|rows| {
                let rows: Vec<Value> = rows.into_iter().map(row_json).collect();
                json!({ "rowCount": rows.len(), "rows": rows })
            });
        Ok(settle(Operation::Read, outcome))
    }

    async fn test_write(&self, message: &str) -> ProbeResult<TestResult> {
        let Some(pool) = self.current_pool().await else {
            return Ok(not_connected(Operation::Write));
        };
        let sql = format!(
            "INSERT INTO {} (test_message) VALUES ($1)
             RETURNING id::text, test_message, created_at::text",
            self.table
        );
        let outcome = sqlx::query_as::<_, ProbeRow>(&sql)
            .bind(message)
            .fetch_one(&pool)
            .await
            .map(|row| {
                let id = row.0.clone();
                json!({ "id": id, "insertedRow": row_json(row) })
            });
        Ok(settle(Operation::Write, outcome))
    }

    async fn test_delete(&self, id: &str) -> ProbeResult<TestResult> {
        let Some(pool) = self.current_pool().await else {
            return Ok(not_connected(Operation::Delete));
        };
        let sql = format!("DELETE FROM {} WHERE id = $1::uuid", self.table);
        let outcome = sqlx::query(&sql)
            .bind(id)
            .execute(&pool)
            .await
            .map(|done| json!({ "deletedCount": done.rows_affected() }));
        Ok(settle(Operation::Delete, outcome))
    }

    fn capabilities(&self) -> AdapterCapabilities {
        AdapterCapabilities::ALL
    }

    async fn drop_test_table(&self) -> ProbeResult<()> {
        let Some(pool) = self.current_pool().await else {
            return Ok(());
        };
        sqlx::query(&format!("DROP TABLE IF EXISTS {}", self.table))
            .execute(&pool)
            .await
            .map(|_| ())
            .map_err(|e| ProbeError::Query(format!("Failed to drop test table: {e}")))
    }

    async fn health_check(&self) -> ProbeResult<TestResult> {
        let Some(pool) = self.current_pool().await else {
            return Ok(not_connected(Operation::Connection));
        };
        let outcome = sqlx::query_as::<_, (String, String)>("SELECT NOW()::text, version()")
            .fetch_one(&pool)
            .await
            .map(|(server_time, server_version)| {
                json!({
                    "serverTime": server_time,
                    "serverVersion": server_version,
                    "poolSize": pool.size(),
                    "idleConnections": pool.num_idle(),
                })
            });
        Ok(settle(Operation::Connection, outcome))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineKind;

    #[test]
    fn discrete_fields_build_options() {
        let cfg = DatabaseConfig::new(EngineKind::Postgres)
            .with_host("db.internal", None)
            .with_database("app")
            .with_credentials("svc", Some("pw".into()));
        let options = connect_options(&cfg).unwrap();
        assert_eq!(options.get_host(), "db.internal");
        assert_eq!(options.get_port(), 5432);
        assert_eq!(options.get_database(), Some("app"));
        assert_eq!(options.get_username(), "svc");
    }

    #[test]
    fn connection_string_wins_and_ssl_forces_require() {
        let cfg = DatabaseConfig::new(EngineKind::Postgres)
            .with_connection_string("postgresql://u:p@example.com:6543/db")
            .with_host("ignored", Some(1))
            .with_ssl(true);
        let options = connect_options(&cfg).unwrap();
        assert_eq!(options.get_host(), "example.com");
        assert_eq!(options.get_port(), 6543);
        assert!(matches!(options.get_ssl_mode(), PgSslMode::Require));
    }

    #[test]
    fn malformed_url_is_config_error() {
        let cfg = DatabaseConfig::new(EngineKind::Postgres).with_connection_string("not a url");
        assert!(connect_options(&cfg).unwrap_err().is_config_error());
    }

    #[tokio::test]
    async fn probes_before_connect_report_not_connected() {
        let adapter = PostgresAdapter::new(PgConnectOptions::new(), "db_connection_test");
        let write = adapter.test_write("x").await.unwrap();
        assert_eq!(write.error.as_deref(), Some("Not connected to database"));
        assert_eq!(
            adapter.create_test_table().await.unwrap_err(),
            ProbeError::NotConnected
        );
        assert!(adapter.disconnect().await.is_ok());
    }
}
