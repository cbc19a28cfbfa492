//! Building a [`DatabaseConfig`] from environment variables.

use super::{DatabaseConfig, EngineKind};
use crate::errors::{ProbeError, ProbeResult};

pub const ENV_DB_TYPE: &str = "DB_TYPE";
pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
pub const ENV_DB_HOST: &str = "DB_HOST";
pub const ENV_DB_PORT: &str = "DB_PORT";
pub const ENV_DB_NAME: &str = "DB_NAME";
pub const ENV_DB_USER: &str = "DB_USER";
pub const ENV_DB_PASSWORD: &str = "DB_PASSWORD";
pub const ENV_DB_SSL: &str = "DB_SSL";
pub const ENV_SUPABASE_URL: &str = "SUPABASE_URL";
pub const ENV_SUPABASE_ANON_KEY: &str = "SUPABASE_ANON_KEY";
pub const ENV_SUPABASE_SERVICE_ROLE_KEY: &str = "SUPABASE_SERVICE_ROLE_KEY";
/// Front-end frameworks expose these names to the browser bundle.
pub const ENV_PUBLIC_SUPABASE_URL: &str = "NEXT_PUBLIC_SUPABASE_URL";
pub const ENV_PUBLIC_SUPABASE_ANON_KEY: &str = "NEXT_PUBLIC_SUPABASE_ANON_KEY";

const DEFAULT_ENGINE: EngineKind = EngineKind::Postgres;

impl DatabaseConfig {
    /// Create config from environment variables.
    ///
    /// | Variable | Description |
    /// |----------|-------------|
    /// | `DB_TYPE` | Engine tag (default: `postgresql`) |
    /// | `DATABASE_URL` | Connection string |
    /// | `DB_HOST`, `DB_PORT`, `DB_NAME` | Discrete connection fields |
    /// | `DB_USER`, `DB_PASSWORD` | Credentials |
    /// | `DB_SSL` | `true`/`1` to require TLS |
    /// | `SUPABASE_URL` (or `NEXT_PUBLIC_SUPABASE_URL`) | Supabase project URL |
    /// | `SUPABASE_ANON_KEY` (or `NEXT_PUBLIC_SUPABASE_ANON_KEY`) | Supabase anon key |
    /// | `SUPABASE_SERVICE_ROLE_KEY` | Supabase service-role key |
    pub fn from_env() -> ProbeResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`DatabaseConfig::from_env`], reading values through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> ProbeResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let engine = match get(ENV_DB_TYPE) {
            Some(tag) => tag.parse()?,
            None => DEFAULT_ENGINE,
        };
        let port = get(ENV_DB_PORT)
            .map(|raw| {
                raw.trim().parse::<u16>().map_err(|_| {
                    ProbeError::invalid_config(format!("{ENV_DB_PORT} is not a valid port: {raw}"))
                })
            })
            .transpose()?;

        Ok(Self {
            connection_string: get(ENV_DATABASE_URL),
            host: get(ENV_DB_HOST),
            port,
            database: get(ENV_DB_NAME),
            username: get(ENV_DB_USER),
            password: get(ENV_DB_PASSWORD),
            ssl: get(ENV_DB_SSL).is_some_and(|v| parse_flag(&v)),
            supabase_url: get(ENV_SUPABASE_URL).or_else(|| get(ENV_PUBLIC_SUPABASE_URL)),
            supabase_key: get(ENV_SUPABASE_ANON_KEY).or_else(|| get(ENV_PUBLIC_SUPABASE_ANON_KEY)),
            supabase_service_key: get(ENV_SUPABASE_SERVICE_ROLE_KEY),
            ..Self::new(engine)
        })
    }
}

pub fn parse_flag(raw: &str) -> bool {
    let v = raw.trim();
    v == "1" || v.eq_ignore_ascii_case("true") || v.eq_ignore_ascii_case("yes")
}
