//! Supabase adapter speaking to the project's PostgREST endpoint (`/rest/v1`).
//!
//! PostgREST cannot run DDL, so the probe table has to exist already;
//! `db-test setup -d supabase` writes the migration that creates it.

use super::{not_connected, settle, AdapterCapabilities, DatabaseAdapter};
use crate::config::DatabaseConfig;
use crate::errors::{ProbeError, ProbeResult};
use crate::model::{Operation, TestResult};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, USER_AGENT};
use reqwest::{RequestBuilder, StatusCode};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

const USER_AGENT_VALUE: &str = concat!("db-test/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const PREFER_REPRESENTATION: &str = "return=representation";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyRole {
    ServiceRole,
    Anon,
}

impl KeyRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ServiceRole => "service_role",
            Self::Anon => "anon",
        }
    }
}

pub struct SupabaseAdapter {
    client: reqwest::Client,
    rest_url: String,
    table: String,
    role: KeyRole,
    connected: AtomicBool,
}

impl SupabaseAdapter {
    /// `key` is sent both as `apikey` and as the bearer token.
    pub fn new(
        project_url: &str,
        key: &str,
        role: KeyRole,
        table: impl Into<String>,
    ) -> ProbeResult<Self> {
        let key_header = HeaderValue::from_str(key)
            .map_err(|_| ProbeError::invalid_config("Supabase key contains invalid characters"))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {key}"))
            .map_err(|_| ProbeError::invalid_config("Supabase key contains invalid characters"))?;

        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        default_headers.insert("apikey", key_header);
        default_headers.insert(AUTHORIZATION, bearer);

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .default_headers(default_headers)
            .build()
            .map_err(|e| ProbeError::invalid_config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            rest_url: format!("{}/rest/v1", project_url.trim_end_matches('/')),
            table: table.into(),
            role,
            connected: AtomicBool::new(false),
        })
    }

    /// Service-role key preferred over the anon key.
    pub fn factory(
        config: &DatabaseConfig,
        table: &str,
    ) -> ProbeResult<Arc<dyn DatabaseAdapter>> {
        let url = config
            .supabase_url
            .as_deref()
            .or(config.connection_string.as_deref())
            .ok_or_else(|| ProbeError::invalid_config("Supabase requires supabaseUrl"))?;
        let (key, role) = match (&config.supabase_service_key, &config.supabase_key) {
            (Some(service), _) => (service.as_str(), KeyRole::ServiceRole),
            (None, Some(anon)) => (anon.as_str(), KeyRole::Anon),
            (None, None) => {
                return Err(ProbeError::invalid_config(
                    "Supabase requires supabaseKey or supabaseServiceKey",
                ))
            }
        };
        Ok(Arc::new(Self::new(url, key, role, table)?))
    }

    pub fn role(&self) -> KeyRole {
        self.role
    }

    fn table_url(&self) -> String {
        format!("{}/{}", self.rest_url, self.table)
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

/// Send and decode a JSON body. Non-2xx statuses become errors carrying the body.
async fn send_json(request: RequestBuilder) -> Result<(StatusCode, Value), String> {
    let response = request.send().await.map_err(|e| e.to_string())?;
    let status = response.status();
    let body = response.text().await.map_err(|e| e.to_string())?;
    if !status.is_success() {
        return Err(rest_error(status, &body));
    }
    let value = if body.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&body).map_err(|e| format!("invalid JSON from Supabase: {e}"))?
    };
    Ok((status, value))
}

/// PostgREST errors carry a `message` field; fall back to the raw body.
fn rest_error(status: StatusCode, body: &str) -> String {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string());
    if message.is_empty() {
        format!("HTTP {status}")
    } else {
        format!("HTTP {status}: {message}")
    }
}

fn into_rows(value: Value) -> Vec<Value> {
    match value {
        Value::Array(rows) => rows,
        Value::Null => Vec::new(),
        other => vec![other],
    }
}

#[async_trait]
impl DatabaseAdapter for SupabaseAdapter {
    fn engine(&self) -> &'static str {
        "supabase"
    }

    #[instrument(skip(self), fields(engine = "supabase", role = self.role.as_str()))]
    async fn connect(&self) -> ProbeResult<()> {
        send_json(self.client.get(format!("{}/", self.rest_url)))
            .await
            .map_err(|e| ProbeError::Connection(format!("Supabase connection failed: {e}")))?;
        self.connected.store(true, Ordering::SeqCst);
        debug!("Supabase REST endpoint reachable");
        Ok(())
    }

    async fn disconnect(&self) -> ProbeResult<()> {
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    /// Verifies the table is reachable; it cannot be created over REST.
    async fn create_test_table(&self) -> ProbeResult<()> {
        if !self.is_connected() {
            return Err(ProbeError::NotConnected);
        }
        let request = self
            .client
            .get(self.table_url())
            .query(&[("select", "id"), ("limit", "1")]);
        match send_json(request).await {
            Ok(_) => Ok(()),
            Err(e) => Err(ProbeError::Query(format!(
                "Test table '{}' is not available ({e}). Run `db-test setup -d supabase` and apply the generated migration",
                self.table
            ))),
        }
    }

    async fn test_read(&self) -> ProbeResult<TestResult> {
        if !self.is_connected() {
            return Ok(not_connected(Operation::Read));
        }
        let request = self.client.get(self.table_url()).query(&[
            ("select", "id,test_message,created_at"),
            ("order", "created_at.desc"),
            ("limit", "5"),
        ]);
        let outcome = send_json(request).await.map(|(_, body)| {
            let rows = into_rows(body);
            json!({ "rowCount": rows.len(), "rows": rows })
        });
        Ok(settle(Operation::Read, outcome))
    }

    async fn test_write(&self, message: &str) -> ProbeResult<TestResult> {
        if !self.is_connected() {
            return Ok(not_connected(Operation::Write));
        }
        let request = self
            .client
            .post(self.table_url())
            .header("Prefer", PREFER_REPRESENTATION)
            .json(&json!({ "test_message": message }));
        let outcome = send_json(request).await.and_then(|(_, body)| {
            let row = into_rows(body)
                .into_iter()
                .next()
                .ok_or_else(|| "insert returned no row".to_string())?;
            Ok(json!({ "id": row.get("id").cloned().unwrap_or(Value::Null), "insertedRow": row }))
        });
        Ok(settle(Operation::Write, outcome))
    }

    async fn test_delete(&self, id: &str) -> ProbeResult<TestResult> {
        if !self.is_connected() {
            return Ok(not_connected(Operation::Delete));
        }
        let filter = format!("eq.{id}");
        let request = self
            .client
            .delete(self.table_url())
            .header("Prefer", PREFER_REPRESENTATION)
            .query(&[("id", filter.as_str())]);
        let outcome = send_json(request)
            .await
            .map(|(_, body)| json!({ "deletedCount": into_rows(body).len() }));
        Ok(settle(Operation::Delete, outcome))
    }

    fn capabilities(&self) -> AdapterCapabilities {
        AdapterCapabilities {
            drop_table: false,
            health_check: true,
        }
    }

    async fn health_check(&self) -> ProbeResult<TestResult> {
        if !self.is_connected() {
            return Ok(not_connected(Operation::Connection));
        }
        let endpoint = format!("{}/", self.rest_url);
        let outcome = send_json(self.client.get(&endpoint)).await.map(|(status, _)| {
            json!({
                "statusCode": status.as_u16(),
                "endpoint": endpoint,
                "keyRole": self.role.as_str(),
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
    fn factory_prefers_service_key() {
        let cfg = DatabaseConfig::new(EngineKind::Supabase).with_supabase(
            "https://x.supabase.co/",
            Some("anon".into()),
            Some("service".into()),
        );
        let adapter = SupabaseAdapter::new("https://x.supabase.co/", "service", KeyRole::ServiceRole, "t")
            .unwrap();
        assert_eq!(adapter.rest_url, "https://x.supabase.co/rest/v1");
        assert!(SupabaseAdapter::factory(&cfg, "t").is_ok());
    }

    #[test]
    fn factory_requires_url_and_key() {
        let no_url = DatabaseConfig::new(EngineKind::Supabase);
        assert!(SupabaseAdapter::factory(&no_url, "t").err().unwrap().is_config_error());
        let no_key = DatabaseConfig::new(EngineKind::Supabase).with_supabase("https://x.supabase.co", None, None);
        let err = SupabaseAdapter::factory(&no_key, "t").err().unwrap();
        assert!(err.to_string().contains("supabaseKey"));
    }

    #[test]
    fn rest_errors_use_postgrest_message() {
        let msg = rest_error(
            StatusCode::NOT_FOUND,
            r#"{"code":"42P01","message":"relation \"public.t\" does not exist"}"#,
        );
        assert_eq!(msg, "HTTP 404 Not Found: relation \"public.t\" does not exist");
        assert_eq!(rest_error(StatusCode::BAD_GATEWAY, ""), "HTTP 502 Bad Gateway");
    }
}
