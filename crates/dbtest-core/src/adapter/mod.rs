//! Adapter contract and the engine → adapter registry.

use crate::config::{DatabaseConfig, EngineKind};
use crate::errors::{ProbeError, ProbeResult};
use crate::model::{Operation, TestResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

#[cfg(feature = "mongodb")]
pub mod mongodb;
#[cfg(feature = "mysql")]
pub mod mysql;
#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "sqlite")]
pub mod sqlite;
#[cfg(feature = "supabase")]
pub mod supabase;

/// Optional operations an adapter supports beyond the required probes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdapterCapabilities {
    pub drop_table: bool,
    pub health_check: bool,
}

impl AdapterCapabilities {
    pub const ALL: Self = Self {
        drop_table: true,
        health_check: true,
    };
}

/// Engine-specific driver used by the test runner.
///
/// Probes report expected failures as `Ok(TestResult { success: false, .. })`.
/// An `Err` from a probe is treated the same way after the retry policy
/// has run out of attempts.
#[async_trait]
pub trait DatabaseAdapter: Send + Sync {
    /// Short engine label for logs.
    fn engine(&self) -> &'static str;

    async fn connect(&self) -> ProbeResult<()>;

    /// Best effort. Callers log failures and move on.
    async fn disconnect(&self) -> ProbeResult<()>;

    /// Ensure the probe table exists. Fails with [`ProbeError::NotConnected`]
    /// before `connect()`.
    async fn create_test_table(&self) -> ProbeResult<()>;

    async fn test_read(&self) -> ProbeResult<TestResult>;

    async fn test_write(&self, message: &str) -> ProbeResult<TestResult>;

    async fn test_delete(&self, id: &str) -> ProbeResult<TestResult>;

    fn capabilities(&self) -> AdapterCapabilities {
        AdapterCapabilities::default()
    }

    async fn drop_test_table(&self) -> ProbeResult<()> {
        Ok(())
    }

    async fn health_check(&self) -> ProbeResult<TestResult> {
        Err(ProbeError::Query(format!(
            "{} adapter has no health check",
            self.engine()
        )))
    }
}

/// Builds an adapter for `config` that probes `table_name`.
pub type AdapterFactory = fn(&DatabaseConfig, &str) -> ProbeResult<Arc<dyn DatabaseAdapter>>;

#[derive(Clone, Default)]
pub struct AdapterRegistry {
    factories: HashMap<EngineKind, AdapterFactory>,
}

impl AdapterRegistry {
    /// Empty registry. Only `custom` configs resolve against it.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every adapter compiled into this build.
    pub fn builtin() -> Self {
        #[allow(unused_mut)]
        let mut registry = Self::new();
        #[cfg(feature = "sqlite")]
        registry.register(EngineKind::Sqlite, sqlite::SqliteAdapter::factory);
        #[cfg(feature = "postgres")]
        registry.register(EngineKind::Postgres, postgres::PostgresAdapter::factory);
        #[cfg(feature = "mysql")]
        registry.register(EngineKind::Mysql, mysql::MysqlAdapter::factory);
        #[cfg(feature = "supabase")]
        registry.register(EngineKind::Supabase, supabase::SupabaseAdapter::factory);
        #[cfg(feature = "mongodb")]
        registry.register(EngineKind::Mongodb, mongodb::MongoAdapter::factory);
        registry
    }

    /// Adds or replaces the factory for `engine`. `custom` cannot be registered.
    pub fn register(&mut self, engine: EngineKind, factory: AdapterFactory) -> &mut Self {
        if engine != EngineKind::Custom {
            self.factories.insert(engine, factory);
        }
        self
    }

    pub fn supports(&self, engine: EngineKind) -> bool {
        engine == EngineKind::Custom || self.factories.contains_key(&engine)
    }

    pub fn engines(&self) -> Vec<EngineKind> {
        EngineKind::ALL
            .into_iter()
            .filter(|e| self.supports(*e))
            .collect()
    }

    pub fn create(
        &self,
        config: &DatabaseConfig,
        table_name: &str,
    ) -> ProbeResult<Arc<dyn DatabaseAdapter>> {
        if config.engine == EngineKind::Custom {
            return config
                .custom_adapter
                .clone()
                .ok_or(ProbeError::MissingCustomAdapter);
        }
        let factory = self
            .factories
            .get(&config.engine)
            .ok_or_else(|| ProbeError::unsupported(config.engine.as_str()))?;
        factory(config, table_name)
    }
}

/// Turns a probe body's outcome into a result, keeping driver errors as
/// expected failures rather than `Err`.
#[cfg(any(
    feature = "sqlite",
    feature = "postgres",
    feature = "mysql",
    feature = "supabase",
    feature = "mongodb"
))]
pub(crate) fn settle<E: std::fmt::Display>(
    operation: Operation,
    outcome: Result<serde_json::Value, E>,
) -> TestResult {
    match outcome {
        Ok(details) => TestResult::ok_with(operation, details),
        Err(e) => TestResult::failed(operation, e.to_string()),
    }
}

#[cfg(any(
    feature = "sqlite",
    feature = "postgres",
    feature = "mysql",
    feature = "supabase",
    feature = "mongodb"
))]
pub(crate) fn not_connected(operation: Operation) -> TestResult {
    TestResult::failed(operation, ProbeError::NotConnected.to_string())
}

impl std::fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("engines", &self.engines())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullAdapter;

    #[async_trait]
    impl DatabaseAdapter for NullAdapter {
        fn engine(&self) -> &'static str {
            "null"
        }
        async fn connect(&self) -> ProbeResult<()> {
            Ok(())
        }
        async fn disconnect(&self) -> ProbeResult<()> {
            Ok(())
        }
        async fn create_test_table(&self) -> ProbeResult<()> {
            Ok(())
        }
        async fn test_read(&self) -> ProbeResult<TestResult> {
            Ok(TestResult::ok(Operation::Read))
        }
        async fn test_write(&self, _message: &str) -> ProbeResult<TestResult> {
            Ok(TestResult::ok(Operation::Write))
        }
        async fn test_delete(&self, _id: &str) -> ProbeResult<TestResult> {
            Ok(TestResult::ok(Operation::Delete))
        }
    }

    fn null_factory(_: &DatabaseConfig, _: &str) -> ProbeResult<Arc<dyn DatabaseAdapter>> {
        Ok(Arc::new(NullAdapter))
    }

    #[test]
    fn custom_engine_uses_configured_instance() {
        let registry = AdapterRegistry::new();
        let adapter = registry
            .create(&DatabaseConfig::custom(Arc::new(NullAdapter)), "t")
            .unwrap();
        assert_eq!(adapter.engine(), "null");
    }

    #[test]
    fn custom_engine_without_instance_is_rejected() {
        let err = AdapterRegistry::new()
            .create(&DatabaseConfig::new(EngineKind::Custom), "t")
            .err()
            .unwrap();
        assert_eq!(err, ProbeError::MissingCustomAdapter);
    }

    #[test]
    fn unregistered_engine_is_unsupported() {
        let err = AdapterRegistry::new()
            .create(&DatabaseConfig::new(EngineKind::Mysql), "t")
            .err()
            .unwrap();
        assert_eq!(err.to_string(), "Unsupported database type: mysql");
    }

    #[test]
    fn registered_factory_is_used() {
        let mut registry = AdapterRegistry::new();
        registry.register(EngineKind::Mongodb, null_factory);
        assert!(registry.supports(EngineKind::Mongodb));
        let adapter = registry
            .create(&DatabaseConfig::new(EngineKind::Mongodb), "t")
            .unwrap();
        assert_eq!(adapter.engine(), "null");
        assert_eq!(
            registry.engines(),
            vec![EngineKind::Mongodb, EngineKind::Custom]
        );
    }

    #[tokio::test]
    async fn optional_capabilities_default_off() {
        let adapter = NullAdapter;
        assert_eq!(adapter.capabilities(), AdapterCapabilities::default());
        assert!(adapter.drop_test_table().await.is_ok());
        assert!(adapter.health_check().await.is_err());
    }

    #[cfg(any(
        feature = "sqlite",
        feature = "postgres",
        feature = "mysql",
        feature = "supabase",
        feature = "mongodb"
    ))]
    #[test]
    fn driver_errors_settle_into_failed_results() {
        let ok = settle::<ProbeError>(Operation::Read, Ok(serde_json::json!({ "rowCount": 2 })));
        assert!(ok.success);
        assert_eq!(ok.details, Some(serde_json::json!({ "rowCount": 2 })));

        let failed = settle(Operation::Write, Err("duplicate key"));
        assert!(!failed.success);
        assert_eq!(failed.error.as_deref(), Some("duplicate key"));

        let offline = not_connected(Operation::Delete);
        assert_eq!(offline.operation, Operation::Delete);
        assert_eq!(offline.error.as_deref(), Some("Not connected to database"));
    }
}
