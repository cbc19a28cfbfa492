//! MySQL adapter over an `sqlx` connection pool. Probe ids are UUIDv4
//! strings generated client-side since MySQL has no `RETURNING`.

use super::{not_connected, settle, AdapterCapabilities, DatabaseAdapter};
use crate::config::DatabaseConfig;
use crate::errors::{ProbeError, ProbeResult};
use crate::model::{Operation, TestResult};
use async_trait::async_trait;
use serde_json::{json, Value};
use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions, MySqlSslMode};
use sqlx::MySqlPool;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

const POOL_SIZE: u32 = 5;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

type ProbeRow = (String, String, Option<String>);

pub struct MysqlAdapter {
    options: MySqlConnectOptions,
    table: String,
    pool: Arc<RwLock<Option<MySqlPool>>>,
}

impl MysqlAdapter {
    pub fn new(options: MySqlConnectOptions, table: impl Into<String>) -> Self {
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

    async fn current_pool(&self) -> Option<MySqlPool> {
        self.pool.read().await.clone()
    }

    fn select_sql(&self) -> String {
        format!(
            "SELECT id, test_message, CAST(created_at AS CHAR) FROM {}",
            self.table
        )
    }
}

pub fn connect_options(config: &DatabaseConfig) -> ProbeResult<MySqlConnectOptions> {
    let options = match config.connection_string.as_deref() {
        Some(url) => MySqlConnectOptions::from_str(url).map_err(|e| {
            ProbeError::invalid_config(format!("invalid MySQL connection string: {e}"))
        })?,
        None => {
            let mut options = MySqlConnectOptions::new()
                .host(config.host.as_deref().unwrap_or("localhost"))
                .port(config.effective_port().unwrap_or(3306));
            if let Some(db) = &config.database {
                options = options.database(db);
            }
            if let Some(user) = &config.username {
                options = options.username(user);
            }
            if let Some(password) = &config.password {
                options = options.password(password);
            }
            options.ssl_mode(MySqlSslMode::Preferred)
        }
    };
    Ok(if config.ssl {
        options.ssl_mode(MySqlSslMode::Required)
    } else {
        options
    })
}

fn row_json((id, test_message, created_at): ProbeRow) -> Value {
    json!({ "id": id, "test_message": test_message, "created_at": created_at })
}

#[async_trait]
impl DatabaseAdapter for MysqlAdapter {
    fn engine(&self) -> &'static str {
        "mysql"
    }

    #[instrument(skip(self), fields(engine = "mysql"))]
    async fn connect(&self) -> ProbeResult<()> {
        let pool = MySqlPoolOptions::new()
            .max_connections(POOL_SIZE)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect_with(self.options.clone())
            .await
            .map_err(|e| ProbeError::Connection(format!("MySQL connection failed: {e}")))?;

        *self.pool.write().await = Some(pool);
        info!("MySQL connection pool established");
        Ok(())
    }

    async fn disconnect(&self) -> ProbeResult<()> {
        let taken = self.pool.write().await.take();
        if let Some(pool) = taken {
            pool.close().await;
            debug!("MySQL pool closed");
        }
        Ok(())
    }

    async fn create_test_table(&self) -> ProbeResult<()> {
        let pool = self.current_pool().await.ok_or(ProbeError::NotConnected)?;
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (
                id CHAR(36) PRIMARY KEY,
                test_message TEXT NOT NULL,
                created_at TIMESTAMP(3) DEFAULT CURRENT_TIMESTAMP(3)
            ) COMMENT = 'Database connectivity test table'",
            self.table
        );
        sqlx::query(&sql)
            .execute(&pool)
            .await
            .map(|_| ())
            .map_err(|e| ProbeError::Query(format!("Failed to create test table: {e}")))
    }

    async fn test_read(&self) -> ProbeResult<TestResult> {
        let Some(pool) = self.current_pool().await else {
            return Ok(not_connected(Operation::Read));
        };
        let sql = format!("{} ORDER BY created_at DESC LIMIT 5", self.select_sql());
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
        let id = uuid::Uuid::new_v4().to_string();
        let insert = format!("INSERT INTO {} (id, test_message) VALUES (?, ?)", self.table);
        let select = format!("{} WHERE id = ?", self.select_sql());

        let outcome = async {
            sqlx::query(&insert)
                .bind(&id)
                .bind(message)
                .execute(&pool)
                .await?;
            sqlx::query_as::<_, ProbeRow>(&select)
                .bind(&id)
                .fetch_one(&pool)
                .await
        }
        .await
        .map(|row| json!({ "id": id, "insertedRow": row_json(row) }));
        Ok(settle(Operation::Write, outcome))
    }

    async fn test_delete(&self, id: &str) -> ProbeResult<TestResult> {
        let Some(pool) = self.current_pool().await else {
            return Ok(not_connected(Operation::Delete));
        };
        let sql = format!("DELETE FROM {} WHERE id = ?", self.table);
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
        let outcome = sqlx::query_as::<_, (String, String)>("SELECT CAST(NOW() AS CHAR), VERSION()")
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
    fn discrete_fields_default_to_port_3306() {
        let cfg = DatabaseConfig::new(EngineKind::Mysql)
            .with_host("mysql.local", None)
            .with_database("app");
        let options = connect_options(&cfg).unwrap();
        assert_eq!(options.get_host(), "mysql.local");
        assert_eq!(options.get_port(), 3306);
        assert_eq!(options.get_database(), Some("app"));
    }

    #[test]
    fn malformed_url_is_config_error() {
        let cfg = DatabaseConfig::new(EngineKind::Mysql).with_connection_string("::::");
        assert!(connect_options(&cfg).unwrap_err().is_config_error());
    }

    #[tokio::test]
    async fn health_before_connect_is_a_failed_connection_result() {
        let adapter = MysqlAdapter::new(MySqlConnectOptions::new(), "db_connection_test");
        let health = adapter.health_check().await.unwrap();
        assert!(!health.success);
        assert_eq!(health.operation, Operation::Connection);
    }
}
