use crate::model::{TestResult, TestSuite};
use crate::report::progress::{ProgressEvent, ProgressSink};
use std::fmt::Write as _;
use std::sync::Arc;

pub const PASSED_BANNER: &str = "✅ All database tests passed!";
pub const FAILED_BANNER: &str = "❌ Some database tests failed";

#[must_use]
pub fn format_banner(overall: bool) -> &'static str {
    if overall {
        PASSED_BANNER
    } else {
        FAILED_BANNER
    }
}

/// `✅ READ (12ms)` style line for one result. Deterministic, unit-testable.
#[must_use]
pub fn format_result_line(result: &TestResult) -> String {
    let icon = if result.success { "✅" } else { "❌" };
    let op = result.operation.as_str().to_uppercase();
    match result.duration_ms {
        Some(ms) => format!("{icon} {op} ({ms}ms)"),
        None => format!("{icon} {op}"),
    }
}

/// One narration line per runner event.
#[must_use]
pub fn format_progress_event(event: &ProgressEvent) -> String {
    match event {
        ProgressEvent::Started { engine } => {
            format!("🔄 Starting database connection test suite ({engine})...")
        }
        ProgressEvent::Connected => "🔌 Connected".to_string(),
        ProgressEvent::TableReady { table } => format!("📋 Test table '{table}' ready"),
        ProgressEvent::ProbeFinished(result) => match &result.error {
            Some(err) => format!("{}: {err}", format_result_line(result)),
            None => format_result_line(result),
        },
        ProgressEvent::ProbeSkipped { operation, reason } => {
            format!("⏭️  {} skipped: {reason}", operation.as_str().to_uppercase())
        }
        ProgressEvent::Aborted { error } => format!("❌ Database test suite failed: {error}"),
        ProgressEvent::CleanupWarning { error } => format!("⚠️  Cleanup warning: {error}"),
        ProgressEvent::Finished { overall, .. } => format_banner(*overall).to_string(),
    }
}

/// Sink that writes every event to stderr.
pub fn default_progress_sink() -> ProgressSink {
    Arc::new(|event: &ProgressEvent| eprintln!("{}", format_progress_event(event)))
}

/// Full report: banner, duration, one line per result, errors, and details
/// when `verbose`.
#[must_use]
pub fn format_suite(suite: &TestSuite, verbose: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", format_banner(suite.overall));
    let _ = writeln!(out, "Duration: {}ms", suite.duration_ms);
    let _ = writeln!(out);
    for result in &suite.results {
        let _ = writeln!(out, "{}", format_result_line(result));
        if let Some(err) = &result.error {
            let _ = writeln!(out, "   Error: {err}");
        }
        if verbose {
            if let Some(details) = &result.details {
                let pretty = serde_json::to_string_pretty(details).unwrap_or_default();
                let _ = writeln!(out, "   Details: {pretty}");
            }
        }
    }
    out
}

pub fn print_suite(suite: &TestSuite, verbose: bool) {
    println!();
    print!("{}", format_suite(suite, verbose));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Operation;
    use serde_json::json;
    use std::time::Duration;

    #[test]
    fn result_line_includes_duration_when_known() {
        let r = TestResult::ok(Operation::Read).with_duration(Duration::from_millis(12));
        assert_eq!(format_result_line(&r), "✅ READ (12ms)");
        let r = TestResult::failed(Operation::Connection, "ECONNREFUSED");
        assert_eq!(format_result_line(&r), "❌ CONNECTION");
    }

    #[test]
    fn suite_report_lists_errors_and_verbose_details() {
        let suite = TestSuite {
            overall: false,
            results: vec![
                TestResult::ok_with(Operation::Read, json!({ "rowCount": 0 }))
                    .with_duration(Duration::from_millis(3)),
                TestResult::failed(Operation::Write, "permission denied"),
            ],
            duration_ms: 41,
            timestamp: "2026-01-01T00:00:00.000Z".into(),
        };

        let quiet = format_suite(&suite, false);
        assert!(quiet.starts_with(FAILED_BANNER));
        assert!(quiet.contains("Duration: 41ms"));
        assert!(quiet.contains("❌ WRITE\n   Error: permission denied"));
        assert!(!quiet.contains("Details"));

        let loud = format_suite(&suite, true);
        assert!(loud.contains("Details: {\n  \"rowCount\": 0\n}"));
    }

    #[test]
    fn finished_event_prints_banner() {
        let line = format_progress_event(&ProgressEvent::Finished {
            overall: true,
            duration_ms: 5,
        });
        assert_eq!(line, PASSED_BANNER);
        let line = format_progress_event(&ProgressEvent::ProbeSkipped {
            operation: Operation::Delete,
            reason: "write returned no id".into(),
        });
        assert_eq!(line, "⏭️  DELETE skipped: write returned no id");
    }
}
