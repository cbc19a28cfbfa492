use crate::cli::args::SetupArgs;
use crate::exit_codes;
use crate::templates;
use dbtest_core::EngineKind;
use serde_json::json;
use std::path::{Path, PathBuf};

pub fn run(args: SetupArgs) -> anyhow::Result<i32> {
    match generate(&args.database, &args.output) {
        Ok(written) => {
            println!("✅ Setup files generated successfully!");
            println!();
            println!("Generated files:");
            for path in written {
                println!("  - {}", path.display());
            }
            Ok(exit_codes::SUCCESS)
        }
        Err(e) => {
            eprintln!("❌ Setup failed: {e:#}");
            Ok(exit_codes::SETUP_ERROR)
        }
    }
}

/// Write the migration, config and env example for `database` under `out_dir`.
/// Existing files are left untouched. Returns the paths now present.
pub fn generate(database: &str, out_dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let engine: EngineKind = database.parse()?;
    let files = [
        (templates::MIGRATION_FILE, migration_template(engine).to_string()),
        (templates::CONFIG_FILE, config_template(engine)?),
        (templates::ENV_EXAMPLE_FILE, env_template(engine).to_string()),
    ];

    let mut written = Vec::with_capacity(files.len());
    for (name, content) in files {
        let path = out_dir.join(name);
        write_file_if_missing(&path, &content)?;
        written.push(path);
    }
    Ok(written)
}

fn migration_template(engine: EngineKind) -> &'static str {
    match engine {
        EngineKind::Postgres | EngineKind::Supabase => templates::MIGRATION_POSTGRES,
        EngineKind::Mysql => templates::MIGRATION_MYSQL,
        EngineKind::Sqlite => templates::MIGRATION_SQLITE,
        EngineKind::Mongodb => templates::MIGRATION_MONGODB,
        EngineKind::Custom => templates::MIGRATION_CUSTOM,
    }
}

fn env_template(engine: EngineKind) -> &'static str {
    match engine {
        EngineKind::Supabase => templates::ENV_EXAMPLE_SUPABASE,
        EngineKind::Sqlite => templates::ENV_EXAMPLE_SQLITE,
        _ => templates::ENV_EXAMPLE_DEFAULT,
    }
}

fn config_template(engine: EngineKind) -> anyhow::Result<String> {
    let database = match engine {
        EngineKind::Supabase => json!({
            "type": engine.as_str(),
            "supabaseUrl": "${NEXT_PUBLIC_SUPABASE_URL}",
            "supabaseKey": "${NEXT_PUBLIC_SUPABASE_ANON_KEY}",
            "supabaseServiceKey": "${SUPABASE_SERVICE_ROLE_KEY}",
        }),
        _ => json!({
            "type": engine.as_str(),
            "connectionString": "${DATABASE_URL}",
        }),
    };
    let config = json!({
        "database": database,
        "tableName": dbtest_core::config::DEFAULT_TABLE_NAME,
        "autoCreateTable": true,
        "cleanupAfterTest": true,
        "timeoutMs": dbtest_core::config::DEFAULT_TIMEOUT_MS,
        "retryAttempts": dbtest_core::config::DEFAULT_RETRY_ATTEMPTS,
    });
    Ok(serde_json::to_string_pretty(&config)? + "\n")
}

fn write_file_if_missing(path: &Path, content: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if path.exists() {
        println!("   Skipped {} (exists)", path.display());
    } else {
        std::fs::write(path, content)?;
        println!("   Created {}", path.display());
    }
    Ok(())
}
