use clap::builder::BoolishValueParser;
use clap::{Args, Parser, Subcommand};
use dbtest_core::status::badge::DEFAULT_REFRESH_INTERVAL;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "db-test",
    version,
    about = "Verify database connectivity with a scripted read/write/delete probe"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

impl Cli {
    /// Whether the invoked subcommand asked for verbose output.
    pub fn verbose(&self) -> bool {
        matches!(&self.cmd, Command::Test(args) if args.verbose)
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the connectivity test suite
    Test(TestArgs),
    /// Generate migration, config and .env example files for an engine
    Setup(SetupArgs),
    /// Write a default db-test.config.json in the current directory
    Init,
    /// Poll the database like a status badge
    Status(StatusArgs),
    Version,
}

/// Where the database is. A config file replaces the connection flags.
#[derive(Args, Clone, Debug)]
pub struct ConnectionArgs {
    /// Config file (JSON, or YAML by extension). ${VAR} placeholders are expanded
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Database type: postgresql | mysql | mongodb | supabase | sqlite
    #[arg(short = 'd', long, env = "DB_TYPE", default_value = "postgresql")]
    pub database: String,

    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub connection_string: Option<String>,

    #[arg(short = 'H', long, env = "DB_HOST")]
    pub host: Option<String>,

    #[arg(short = 'p', long, env = "DB_PORT")]
    pub port: Option<u16>,

    #[arg(long = "db-name", env = "DB_NAME")]
    pub db_name: Option<String>,

    #[arg(short = 'u', long, env = "DB_USER")]
    pub username: Option<String>,

    #[arg(short = 'w', long, env = "DB_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Require TLS
    #[arg(long, env = "DB_SSL", value_parser = BoolishValueParser::new())]
    pub ssl: bool,

    /// Supabase project URL (falls back to NEXT_PUBLIC_SUPABASE_URL)
    #[arg(long, env = "SUPABASE_URL")]
    pub supabase_url: Option<String>,

    /// Supabase anon key (falls back to NEXT_PUBLIC_SUPABASE_ANON_KEY)
    #[arg(long, env = "SUPABASE_ANON_KEY", hide_env_values = true)]
    pub supabase_key: Option<String>,

    #[arg(long, env = "SUPABASE_SERVICE_ROLE_KEY", hide_env_values = true)]
    pub supabase_service_key: Option<String>,

    /// Probe table name
    #[arg(short = 't', long)]
    pub table: Option<String>,

    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Attempts per probe
    #[arg(long)]
    pub retries: Option<u32>,
}

#[derive(Args, Clone, Debug)]
pub struct TestArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Print the suite as JSON
    #[arg(short = 'j', long)]
    pub json: bool,

    /// Print configuration, progress and result details
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Also write the JSON report to this file
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    /// Re-run the suite until Ctrl+C
    #[arg(long)]
    pub watch: bool,

    /// Seconds between watch runs
    #[arg(long, default_value_t = 10)]
    pub interval_secs: u64,
}

#[derive(Args, Clone, Debug)]
pub struct SetupArgs {
    #[arg(short = 'd', long, default_value = "postgresql")]
    pub database: String,

    /// Output directory
    #[arg(short = 'o', long, default_value = ".")]
    pub output: PathBuf,
}

#[derive(Args, Clone, Debug)]
pub struct StatusArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Seconds between checks
    #[arg(long, default_value_t = DEFAULT_REFRESH_INTERVAL.as_secs())]
    pub interval_secs: u64,

    /// Check once and exit 0 (online) or 1 (offline)
    #[arg(long)]
    pub once: bool,
}
