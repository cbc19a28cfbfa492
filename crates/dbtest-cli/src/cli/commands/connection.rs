//! Turns connection flags (or a config file) into a suite configuration.

use crate::cli::args::ConnectionArgs;
use anyhow::{bail, Context};
use dbtest_core::config::env::{ENV_PUBLIC_SUPABASE_ANON_KEY, ENV_PUBLIC_SUPABASE_URL};
use dbtest_core::config::load_config;
use dbtest_core::{DatabaseConfig, EngineKind, TestSuiteConfig};

pub fn suite_config(args: &ConnectionArgs) -> anyhow::Result<TestSuiteConfig> {
    let base = match &args.config {
        Some(path) => {
            if !path.exists() {
                bail!("Config file not found: {}", path.display());
            }
            load_config(path).with_context(|| format!("invalid config {}", path.display()))?
        }
        None => TestSuiteConfig::new(database_from_flags(args)?),
    };
    Ok(apply_overrides(base, args))
}

fn database_from_flags(args: &ConnectionArgs) -> anyhow::Result<DatabaseConfig> {
    let engine: EngineKind = args.database.parse()?;
    let public = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());

    let mut db = DatabaseConfig::new(engine).with_ssl(args.ssl);
    db.connection_string = args.connection_string.clone();
    db.host = args.host.clone();
    db.port = args.port;
    db.database = args.db_name.clone();
    db.username = args.username.clone();
    db.password = args.password.clone();
    db.supabase_url = args
        .supabase_url
        .clone()
        .or_else(|| public(ENV_PUBLIC_SUPABASE_URL));
    db.supabase_key = args
        .supabase_key
        .clone()
        .or_else(|| public(ENV_PUBLIC_SUPABASE_ANON_KEY));
    db.supabase_service_key = args.supabase_service_key.clone();
    Ok(db)
}

fn apply_overrides(mut cfg: TestSuiteConfig, args: &ConnectionArgs) -> TestSuiteConfig {
    if let Some(table) = &args.table {
        cfg.table_name = table.clone();
    }
    if let Some(timeout_ms) = args.timeout_ms {
        cfg.timeout_ms = timeout_ms;
    }
    if let Some(retries) = args.retries {
        cfg.retry_attempts = retries;
    }
    cfg
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::args::{Cli, Command};
    use clap::Parser;

    fn connection(argv: &[&str]) -> ConnectionArgs {
        let mut full = vec!["db-test", "test"];
        full.extend_from_slice(argv);
        match Cli::try_parse_from(full).expect("parse").cmd {
            Command::Test(args) => args.connection,
            _ => unreachable!(),
        }
    }

    #[test]
    fn flags_build_database_config() {
        let args = connection(&[
            "-d", "mysql", "-H", "db.local", "-p", "3307", "--db-name", "app", "-u", "svc",
            "--ssl", "-t", "probe_rows", "--retries", "1",
        ]);
        let cfg = suite_config(&args).unwrap();
        assert_eq!(cfg.database.engine, EngineKind::Mysql);
        assert_eq!(cfg.database.host.as_deref(), Some("db.local"));
        assert_eq!(cfg.database.port, Some(3307));
        assert_eq!(cfg.database.database.as_deref(), Some("app"));
        assert!(cfg.database.ssl);
        assert_eq!(cfg.table_name, "probe_rows");
        assert_eq!(cfg.retry_attempts, 1);
        assert_eq!(cfg.timeout_ms, dbtest_core::config::DEFAULT_TIMEOUT_MS);
    }

    #[test]
    fn unknown_engine_is_rejected() {
        let err = suite_config(&connection(&["-d", "oracle"])).unwrap_err();
        assert_eq!(err.to_string(), "Unsupported database type: oracle");
    }

    #[test]
    fn missing_config_file_is_reported() {
        let err = suite_config(&connection(&["-c", "/nope/db-test.config.json"])).unwrap_err();
        assert_eq!(err.to_string(), "Config file not found: /nope/db-test.config.json");
    }

    #[test]
    fn flags_override_config_file_policy() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db-test.config.json");
        std::fs::write(
            &path,
            r#"{ "database": { "type": "sqlite", "connectionString": "probe.db" }, "timeoutMs": 1000 }"#,
        )
        .unwrap();
        let cfg = suite_config(&connection(&[
            "-c",
            path.to_str().unwrap(),
            "--timeout-ms",
            "2500",
        ]))
        .unwrap();
        assert_eq!(cfg.database.engine, EngineKind::Sqlite);
        assert_eq!(cfg.timeout_ms, 2500);
    }
}
