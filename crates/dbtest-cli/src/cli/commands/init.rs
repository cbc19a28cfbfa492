use crate::exit_codes;
use crate::templates;
use anyhow::bail;
use std::path::{Path, PathBuf};

pub fn run() -> anyhow::Result<i32> {
    let cwd = std::env::current_dir()?;
    match write_default_config(&cwd) {
        Ok(path) => {
            println!("Created: {}", path.display());
            println!("✅ Configuration initialized!");
            Ok(exit_codes::SUCCESS)
        }
        Err(e) => {
            eprintln!("❌ Initialization failed: {e:#}");
            Ok(exit_codes::SETUP_ERROR)
        }
    }
}

pub fn write_default_config(dir: &Path) -> anyhow::Result<PathBuf> {
    let path = dir.join(templates::CONFIG_FILE);
    if path.exists() {
        bail!("Configuration file already exists");
    }
    std::fs::write(&path, templates::DEFAULT_CONFIG)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_parses_and_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_default_config(dir.path()).unwrap();

        let cfg: dbtest_core::TestSuiteConfig =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(cfg.database.engine, dbtest_core::EngineKind::Postgres);
        assert!(cfg.database.ssl);

        let err = write_default_config(dir.path()).unwrap_err();
        assert_eq!(err.to_string(), "Configuration file already exists");
    }
}
