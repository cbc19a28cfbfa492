use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Which probe produced a [`TestResult`]. Health checks and connection
/// failures share the `connection` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Read,
    Write,
    Delete,
    Connection,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Delete => "delete",
            Self::Connection => "connection",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one probe. `error` is set iff `success` is false.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub success: bool,
    pub operation: Operation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Wall-clock time of the attempt that produced this result, filled in by the retry wrapper.
    #[serde(
        rename = "duration",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub duration_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl TestResult {
    pub fn ok(operation: Operation) -> Self {
        Self {
            success: true,
            operation,
            error: None,
            duration_ms: None,
            details: None,
        }
    }

    pub fn ok_with(operation: Operation, details: serde_json::Value) -> Self {
        Self {
            details: Some(details),
            ..Self::ok(operation)
        }
    }

    pub fn failed(operation: Operation, error: impl Into<String>) -> Self {
        Self {
            success: false,
            operation,
            error: Some(error.into()),
            duration_ms: None,
            details: None,
        }
    }

    pub fn with_duration(mut self, elapsed: Duration) -> Self {
        self.duration_ms = Some(millis(elapsed));
        self
    }

    /// Identifier of the row a write probe inserted, looked up under `id` then `insertedId`.
    pub fn inserted_id(&self) -> Option<String> {
        let details = self.details.as_ref()?;
        ["id", "insertedId"]
            .iter()
            .filter_map(|key| details.get(*key))
            .find_map(|value| match value {
                serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
                serde_json::Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
    }
}

/// Aggregate report of one orchestrator run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestSuite {
    pub overall: bool,
    pub results: Vec<TestResult>,
    #[serde(rename = "duration")]
    pub duration_ms: u64,
    /// ISO-8601 completion time (UTC).
    pub timestamp: String,
}

impl TestSuite {
    /// Stamps the suite with the current time. `overall` is derived from `results`.
    pub fn finish(results: Vec<TestResult>, elapsed: Duration) -> Self {
        Self {
            overall: all_succeeded(&results),
            results,
            duration_ms: millis(elapsed),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    pub fn first_failure(&self) -> Option<&TestResult> {
        self.results.iter().find(|r| !r.success)
    }
}

/// An empty result list is a failed run.
pub fn all_succeeded(results: &[TestResult]) -> bool {
    !results.is_empty() && results.iter().all(|r| r.success)
}

pub(crate) fn millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn inserted_id_prefers_id_then_inserted_id() {
        let r = TestResult::ok_with(Operation::Write, json!({ "id": "abc-123" }));
        assert_eq!(r.inserted_id().as_deref(), Some("abc-123"));

        let r = TestResult::ok_with(Operation::Write, json!({ "insertedId": "665f1c" }));
        assert_eq!(r.inserted_id().as_deref(), Some("665f1c"));

        let r = TestResult::ok_with(Operation::Write, json!({ "id": 42 }));
        assert_eq!(r.inserted_id().as_deref(), Some("42"));
    }

    #[test]
    fn inserted_id_ignores_empty_and_missing() {
        assert_eq!(TestResult::ok(Operation::Write).inserted_id(), None);
        let r = TestResult::ok_with(Operation::Write, json!({ "id": "", "rows": 1 }));
        assert_eq!(r.inserted_id(), None);
        let r = TestResult::ok_with(Operation::Write, json!({ "id": null }));
        assert_eq!(r.inserted_id(), None);
    }

    #[test]
    fn overall_requires_every_result_to_succeed() {
        let ok = TestResult::ok(Operation::Read);
        let bad = TestResult::failed(Operation::Write, "boom");
        assert!(all_succeeded(&[ok.clone(), ok.clone()]));
        assert!(!all_succeeded(&[ok, bad]));
        assert!(!all_succeeded(&[]));
    }

    #[test]
    fn suite_serializes_with_wire_field_names() {
        let suite = TestSuite::finish(
            vec![TestResult::ok(Operation::Read).with_duration(Duration::from_millis(12))],
            Duration::from_millis(40),
        );
        let v = serde_json::to_value(&suite).unwrap();
        assert_eq!(v["overall"], json!(true));
        assert_eq!(v["duration"], json!(40));
        assert_eq!(v["results"][0]["operation"], json!("read"));
        assert_eq!(v["results"][0]["duration"], json!(12));
        assert!(v["results"][0].get("error").is_none());
        assert!(v["timestamp"].as_str().unwrap().ends_with('Z'));
    }
}
