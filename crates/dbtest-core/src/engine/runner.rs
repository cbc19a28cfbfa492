use crate::adapter::{AdapterRegistry, DatabaseAdapter};
use crate::config::TestSuiteConfig;
use crate::engine::policy::{run_with_retry, with_deadline, RetryPolicy};
use crate::errors::{ProbeError, ProbeResult};
use crate::model::{Operation, TestResult, TestSuite};
use crate::report::console::default_progress_sink;
use crate::report::progress::{ProgressEvent, ProgressSink};
use chrono::{SecondsFormat, Utc};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Label used in deadline errors around `connect()`.
const CONNECT_LABEL: &str = "Connection";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Connecting,
    SchemaReady,
    Probing,
    CleaningUp,
    Done,
}

impl RunPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::SchemaReady => "schema-ready",
            Self::Probing => "probing",
            Self::CleaningUp => "cleaning-up",
            Self::Done => "done",
        }
    }
}

/// Drives one adapter through the connect / probe / cleanup protocol.
pub struct DbTester {
    config: TestSuiteConfig,
    adapter: Arc<dyn DatabaseAdapter>,
    policy: RetryPolicy,
    progress: Option<ProgressSink>,
}

impl DbTester {
    /// Validate `config` and resolve its adapter from the built-in registry.
    pub fn new(config: TestSuiteConfig) -> ProbeResult<Self> {
        Self::with_registry(config, &AdapterRegistry::builtin())
    }

    pub fn with_registry(config: TestSuiteConfig, registry: &AdapterRegistry) -> ProbeResult<Self> {
        config.validate()?;
        let adapter = registry.create(&config.database, &config.table_name)?;
        let policy = RetryPolicy::new(config.retry_attempts);
        let progress = (!config.silent).then(default_progress_sink);
        debug!(
            engine = adapter.engine(),
            table = %config.table_name,
            phase = RunPhase::Idle.as_str(),
            "test runner ready"
        );
        Ok(Self {
            config,
            adapter,
            policy,
            progress,
        })
    }

    /// Replace the stderr narration. Ignored when the config is silent.
    pub fn with_progress(mut self, sink: ProgressSink) -> Self {
        if !self.config.silent {
            self.progress = Some(sink);
        }
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn config(&self) -> &TestSuiteConfig {
        &self.config
    }

    pub fn adapter(&self) -> &Arc<dyn DatabaseAdapter> {
        &self.adapter
    }

    /// Run the complete suite.
    ///
    /// Connection, schema and hook failures are folded into a single failed
    /// `connection` result. Only an `afterTest` hook error is returned as `Err`.
    pub async fn run_test_suite(&self) -> ProbeResult<TestSuite> {
        let started = Instant::now();
        let mut results = Vec::new();
        self.emit(ProgressEvent::Started {
            engine: self.adapter.engine(),
        });

        let outcome = self.run_protocol(&mut results).await;
        let aborted = outcome.is_err();
        if let Err(e) = outcome {
            warn!(engine = self.adapter.engine(), error = %e, "test suite aborted");
            self.emit(ProgressEvent::Aborted {
                error: e.to_string(),
            });
            results.push(TestResult::failed(Operation::Connection, e.to_string()));
        }

        self.enter(RunPhase::CleaningUp);
        self.cleanup().await;

        let suite = TestSuite::finish(results, started.elapsed());
        self.enter(RunPhase::Done);
        // An aborted run has already said why it failed.
        if !aborted {
            self.emit(ProgressEvent::Finished {
                overall: suite.overall,
                duration_ms: suite.duration_ms,
            });
        }

        if let Some(hook) = &self.config.after_test {
            hook(suite.clone())
                .await
                .map_err(|e| ProbeError::hook("afterTest", &e))?;
        }
        Ok(suite)
    }

    async fn run_protocol(&self, results: &mut Vec<TestResult>) -> ProbeResult<()> {
        if let Some(hook) = &self.config.before_test {
            hook().await.map_err(|e| ProbeError::hook("beforeTest", &e))?;
        }

        self.enter(RunPhase::Connecting);
        with_deadline(CONNECT_LABEL, self.config.timeout(), self.adapter.connect()).await?;
        self.emit(ProgressEvent::Connected);

        if self.config.auto_create_table {
            self.adapter.create_test_table().await?;
            self.emit(ProgressEvent::TableReady {
                table: self.config.table_name.clone(),
            });
        }
        self.enter(RunPhase::SchemaReady);

        self.enter(RunPhase::Probing);
        let adapter = &self.adapter;

        let read = run_with_retry(&self.policy, Operation::Read, || adapter.test_read()).await;
        self.record(results, read);

        let message = probe_message();
        let message = message.as_str();
        let write =
            run_with_retry(&self.policy, Operation::Write, || adapter.test_write(message)).await;
        let inserted = write.inserted_id();
        self.record(results, write);

        match inserted {
            Some(id) => {
                let id = id.as_str();
                let delete =
                    run_with_retry(&self.policy, Operation::Delete, || adapter.test_delete(id))
                        .await;
                self.record(results, delete);
            }
            None => self.emit(ProgressEvent::ProbeSkipped {
                operation: Operation::Delete,
                reason: "write returned no id".to_string(),
            }),
        }

        if adapter.capabilities().health_check {
            let health =
                run_with_retry(&self.policy, Operation::Connection, || adapter.health_check())
                    .await;
            self.record(results, health);
        }
        Ok(())
    }

    async fn cleanup(&self) {
        let engine = self.adapter.engine();
        if self.config.cleanup_after_test && self.adapter.capabilities().drop_table {
            if let Err(e) = self.adapter.drop_test_table().await {
                warn!(engine, table = %self.config.table_name, error = %e, "failed to drop test table");
                self.emit(ProgressEvent::CleanupWarning {
                    error: e.to_string(),
                });
            }
        }
        if let Err(e) = self.adapter.disconnect().await {
            warn!(engine, error = %e, "disconnect failed");
            self.emit(ProgressEvent::CleanupWarning {
                error: e.to_string(),
            });
        }
    }

    /// Connect, run one read probe without retries, disconnect.
    ///
    /// Returns `false` on any error; disconnect is attempted either way.
    pub async fn quick_test(&self) -> bool {
        let outcome = async {
            with_deadline(CONNECT_LABEL, self.config.timeout(), self.adapter.connect()).await?;
            self.adapter.test_read().await
        }
        .await;
        let disconnected = self.adapter.disconnect().await;

        match (outcome, disconnected) {
            (Ok(read), Ok(())) => read.success,
            (Ok(_), Err(e)) | (Err(e), _) => {
                debug!(engine = self.adapter.engine(), error = %e, "quick test failed");
                false
            }
        }
    }

    fn record(&self, results: &mut Vec<TestResult>, result: TestResult) {
        debug!(
            operation = %result.operation,
            success = result.success,
            duration_ms = result.duration_ms,
            "probe finished"
        );
        self.emit(ProgressEvent::ProbeFinished(result.clone()));
        results.push(result);
    }

    fn enter(&self, phase: RunPhase) {
        debug!(engine = self.adapter.engine(), phase = phase.as_str(), "suite phase");
    }

    fn emit(&self, event: ProgressEvent) {
        if let Some(sink) = &self.progress {
            sink(&event);
        }
    }
}

fn probe_message() -> String {
    format!(
        "Test message at {}",
        Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
    )
}

/// Build a tester for `config` and run the full suite.
pub async fn test_database(config: TestSuiteConfig) -> ProbeResult<TestSuite> {
    DbTester::new(config)?.run_test_suite().await
}

/// Build a tester for `config` and run [`DbTester::quick_test`].
/// Configuration errors are still returned as `Err`.
pub async fn quick_database_test(config: TestSuiteConfig) -> ProbeResult<bool> {
    Ok(DbTester::new(config)?.quick_test().await)
}
