use super::ConnectionStatus;
use crate::adapter::AdapterRegistry;
use crate::config::TestSuiteConfig;
use crate::engine::runner::DbTester;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::ops::ControlFlow;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::debug;

pub const BADGE_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

pub const MSG_HEALTHY: &str = "Database is healthy";
pub const MSG_UNAVAILABLE: &str = "Database is unavailable";
pub const MSG_ERROR: &str = "Connection error occurred";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BadgeState {
    pub status: ConnectionStatus,
    pub message: String,
    pub last_checked: Option<DateTime<Local>>,
}

impl BadgeState {
    /// `🟢 DB Online: Database is healthy (last checked 10:42:07)`
    pub fn summary(&self) -> String {
        let mut line = format!("{} {}", self.status.icon(), self.status.label());
        if !self.message.is_empty() {
            line.push_str(": ");
            line.push_str(&self.message);
        }
        if let Some(at) = self.last_checked {
            line.push_str(&format!(" (last checked {})", at.format("%H:%M:%S")));
        }
        line
    }
}

/// Compact health indicator backed by [`DbTester::quick_test`].
pub struct StatusBadge {
    config: TestSuiteConfig,
    registry: AdapterRegistry,
    state: BadgeState,
}

impl StatusBadge {
    /// Runs quick tests silently with a 5s connect deadline.
    pub fn new(config: TestSuiteConfig) -> Self {
        Self {
            config: config.silent(true).with_timeout_ms(BADGE_TIMEOUT_MS),
            registry: AdapterRegistry::builtin(),
            state: BadgeState {
                status: ConnectionStatus::Testing,
                message: String::new(),
                last_checked: None,
            },
        }
    }

    pub fn with_registry(mut self, registry: AdapterRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn state(&self) -> &BadgeState {
        &self.state
    }

    /// Check once and update the state.
    pub async fn poll(&mut self) -> &BadgeState {
        self.state.status = ConnectionStatus::Testing;

        let (status, message) = match DbTester::with_registry(self.config.clone(), &self.registry)
        {
            Ok(tester) if tester.quick_test().await => (ConnectionStatus::Connected, MSG_HEALTHY),
            Ok(_) => (ConnectionStatus::Failed, MSG_UNAVAILABLE),
            Err(e) => {
                debug!(error = %e, "status badge could not build tester");
                (ConnectionStatus::Failed, MSG_ERROR)
            }
        };
        self.state = BadgeState {
            status,
            message: message.to_string(),
            last_checked: Some(Local::now()),
        };
        &self.state
    }

    /// Poll immediately, then every `interval`, calling `on_change` after each
    /// poll until it returns [`ControlFlow::Break`].
    pub async fn run<F>(&mut self, interval: Duration, mut on_change: F)
    where
        F: FnMut(&BadgeState) -> ControlFlow<()>,
    {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let state = self.poll().await;
            if on_change(state).is_break() {
                return;
            }
        }
    }
}
