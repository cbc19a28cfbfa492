//! Error types for the test engine and its adapters.

use std::time::Duration;

/// Result type for engine and adapter operations.
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Errors raised while configuring or running a test suite.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProbeError {
    /// Engine tag is unknown, or its adapter is not compiled into this build.
    #[error("Unsupported database type: {engine}")]
    UnsupportedEngine { engine: String },

    /// `custom` engine selected without an adapter instance.
    #[error("Custom adapter must be provided when type is \"custom\"")]
    MissingCustomAdapter,

    /// Configuration values that cannot be used.
    #[error("configuration error: {message}")]
    InvalidConfig { message: String },

    /// Adapter could not establish connectivity. The message is the adapter's own.
    #[error("{0}")]
    Connection(String),

    /// Deadline wrapper fired before the operation finished.
    #[error("{operation} timeout after {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u64 },

    /// Operation attempted before `connect()` succeeded.
    #[error("Not connected to database")]
    NotConnected,

    /// A statement or request against the probe table failed.
    #[error("{0}")]
    Query(String),

    /// A user hook returned an error.
    #[error("{hook} hook failed: {message}")]
    Hook { hook: &'static str, message: String },
}

impl ProbeError {
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    pub fn unsupported(engine: impl Into<String>) -> Self {
        Self::UnsupportedEngine {
            engine: engine.into(),
        }
    }

    pub fn timeout(operation: impl Into<String>, timeout: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }
    }

    pub fn hook(hook: &'static str, err: &anyhow::Error) -> Self {
        Self::Hook {
            hook,
            message: format!("{err:#}"),
        }
    }

    /// Configuration errors are raised at construction and never retried.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedEngine { .. } | Self::MissingCustomAdapter | Self::InvalidConfig { .. }
        )
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
