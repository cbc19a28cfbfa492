pub const CONFIG_FILE: &str = "db-test.config.json";
pub const MIGRATION_FILE: &str = "migrations/001_create_db_test_table.sql";
pub const ENV_EXAMPLE_FILE: &str = ".env.example";

pub const MIGRATION_POSTGRES: &str = r#"-- Database connectivity test table
CREATE TABLE IF NOT EXISTS db_connection_test (
  id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
  test_message TEXT NOT NULL,
  created_at TIMESTAMP WITH TIME ZONE DEFAULT NOW()
);

COMMENT ON TABLE db_connection_test IS 'Database connectivity test table';
"#;

pub const MIGRATION_MYSQL: &str = r#"-- Database connectivity test table
CREATE TABLE IF NOT EXISTS db_connection_test (
  id CHAR(36) PRIMARY KEY DEFAULT (UUID()),
  test_message TEXT NOT NULL,
  created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);
"#;

pub const MIGRATION_SQLITE: &str = r#"-- Database connectivity test table
CREATE TABLE IF NOT EXISTS db_connection_test (
  id TEXT PRIMARY KEY,
  test_message TEXT NOT NULL,
  created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
);
"#;

pub const MIGRATION_MONGODB: &str = r#"-- MongoDB needs no migration: the db_connection_test collection
-- is created on the first run when autoCreateTable is enabled.
"#;

pub const MIGRATION_CUSTOM: &str = "-- Custom migration - please adapt for your database type\n";

pub const ENV_EXAMPLE_SUPABASE: &str = r#"NEXT_PUBLIC_SUPABASE_URL=your_supabase_url
NEXT_PUBLIC_SUPABASE_ANON_KEY=your_anon_key
SUPABASE_SERVICE_ROLE_KEY=your_service_role_key
"#;

pub const ENV_EXAMPLE_SQLITE: &str = r#"DATABASE_URL=sqlite://./db-test.sqlite
"#;

pub const ENV_EXAMPLE_DEFAULT: &str = r#"DATABASE_URL=your_connection_string
DB_HOST=localhost
DB_PORT=5432
DB_NAME=your_database
DB_USER=your_username
DB_PASSWORD=your_password
DB_SSL=true
"#;

/// Written by `db-test init`.
pub const DEFAULT_CONFIG: &str = r#"{
  "database": {
    "type": "postgresql",
    "connectionString": "${DATABASE_URL}",
    "ssl": true
  },
  "tableName": "db_connection_test",
  "autoCreateTable": true,
  "cleanupAfterTest": true,
  "timeoutMs": 30000,
  "retryAttempts": 3
}
"#;
