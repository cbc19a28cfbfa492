//! Presentation models for embedding connection status in a UI or terminal.
//!
//! Both widgets drive the engine only through [`DbTester`](crate::DbTester)
//! and never touch an adapter directly.

pub mod badge;
pub mod modal;

pub use badge::{BadgeState, StatusBadge};
pub use modal::{ModalState, StatusModal};

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Testing,
    Connected,
    Failed,
}

impl ConnectionStatus {
    pub fn icon(self) -> &'static str {
        match self {
            Self::Connected => "🟢",
            Self::Failed => "🔴",
            Self::Testing => "🟡",
        }
    }

    /// Short badge label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Connected => "DB Online",
            Self::Failed => "DB Offline",
            Self::Testing => "Checking...",
        }
    }

    /// Modal title.
    pub fn title(self) -> &'static str {
        match self {
            Self::Connected => "Connected",
            Self::Failed => "Connection Failed",
            Self::Testing => "Testing Connection",
        }
    }
}
