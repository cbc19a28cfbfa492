use super::ConnectionStatus;
use crate::adapter::AdapterRegistry;
use crate::config::TestSuiteConfig;
use crate::engine::runner::DbTester;
use serde::Serialize;

pub const MODAL_TIMEOUT_MS: u64 = 10_000;

pub const MSG_TESTING: &str = "Testing database connection...";
pub const MSG_CONNECTED: &str = "Database connected successfully!";
pub const MSG_FAILED: &str = "Database connection failed";
pub const MSG_ERROR: &str = "Database connection error";
pub const UNKNOWN_ERROR: &str = "Unknown error occurred";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModalState {
    pub status: ConnectionStatus,
    pub message: String,
    pub details: String,
}

impl ModalState {
    fn testing() -> Self {
        Self {
            status: ConnectionStatus::Testing,
            message: MSG_TESTING.to_string(),
            details: String::new(),
        }
    }
}

/// Detailed status backed by a full suite run.
pub struct StatusModal {
    config: TestSuiteConfig,
    registry: AdapterRegistry,
    state: ModalState,
}

impl StatusModal {
    /// Runs the suite silently with a 10s connect deadline.
    pub fn new(config: TestSuiteConfig) -> Self {
        Self {
            config: config.silent(true).with_timeout_ms(MODAL_TIMEOUT_MS),
            registry: AdapterRegistry::builtin(),
            state: ModalState::testing(),
        }
    }

    pub fn with_registry(mut self, registry: AdapterRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn state(&self) -> &ModalState {
        &self.state
    }

    pub async fn check(&mut self) -> &ModalState {
        self.state = ModalState::testing();

        let outcome = match DbTester::with_registry(self.config.clone(), &self.registry) {
            Ok(tester) => tester.run_test_suite().await,
            Err(e) => Err(e),
        };

        self.state = match outcome {
            Ok(suite) if suite.overall => ModalState {
                status: ConnectionStatus::Connected,
                message: MSG_CONNECTED.to_string(),
                details: format!("Connection verified in {}ms", suite.duration_ms),
            },
            Ok(suite) => ModalState {
                status: ConnectionStatus::Failed,
                message: MSG_FAILED.to_string(),
                details: suite
                    .first_failure()
                    .and_then(|r| r.error.clone())
                    .unwrap_or_else(|| UNKNOWN_ERROR.to_string()),
            },
            Err(e) => ModalState {
                status: ConnectionStatus::Failed,
                message: MSG_ERROR.to_string(),
                details: e.to_string(),
            },
        };
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DatabaseConfig, EngineKind};

    #[tokio::test]
    async fn missing_custom_adapter_is_a_connection_error() {
        let mut modal = StatusModal::new(TestSuiteConfig::new(DatabaseConfig::new(EngineKind::Custom)));
        assert_eq!(modal.state().message, MSG_TESTING);
        let state = modal.check().await;
        assert_eq!(state.status, ConnectionStatus::Failed);
        assert_eq!(state.message, MSG_ERROR);
        assert!(state.details.contains("Custom adapter must be provided"));
    }

    #[test]
    fn overrides_silence_and_timeout() {
        let modal = StatusModal::new(TestSuiteConfig::new(DatabaseConfig::new(EngineKind::Sqlite)));
        assert!(modal.config.silent);
        assert_eq!(modal.config.timeout_ms, MODAL_TIMEOUT_MS);
    }
}
