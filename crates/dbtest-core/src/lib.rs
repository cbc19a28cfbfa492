//! Database connectivity verification engine.
//!
//! A [`DbTester`] drives one [`DatabaseAdapter`] through a fixed protocol:
//!
//! - connect (bounded by the configured deadline)
//! - ensure the probe table exists
//! - read, write and delete probes (each retried with linear backoff)
//! - optional health check
//! - drop the probe table and disconnect, whatever happened before
//!
//! and returns one [`TestSuite`] describing the outcome.
//!
//! # Quick Start
//!
//! ```no_run
//! use dbtest_core::{test_database, DatabaseConfig, EngineKind, TestSuiteConfig};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let database = DatabaseConfig::new(EngineKind::Sqlite).with_connection_string("probe.db");
//! let suite = test_database(TestSuiteConfig::new(database).silent(true)).await?;
//! println!("overall: {}", suite.overall);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! | Environment Variable | Description |
//! |---------------------|-------------|
//! | `DB_TYPE` | Engine tag (`postgresql`, `mysql`, `mongodb`, `supabase`, `sqlite`) |
//! | `DATABASE_URL` | Connection string |
//! | `DB_HOST` / `DB_PORT` / `DB_NAME` | Discrete connection fields |
//! | `DB_USER` / `DB_PASSWORD` | Credentials |
//! | `DB_SSL` | `true` to require TLS |
//! | `SUPABASE_URL` / `SUPABASE_ANON_KEY` / `SUPABASE_SERVICE_ROLE_KEY` | Supabase project |

pub mod adapter;
pub mod config;
pub mod engine;
pub mod errors;
pub mod model;
pub mod report;
pub mod status;

pub use adapter::{AdapterCapabilities, AdapterRegistry, DatabaseAdapter};
pub use config::{DatabaseConfig, EngineKind, TestSuiteConfig};
pub use engine::policy::{run_with_retry, with_deadline, RetryPolicy};
pub use engine::runner::{quick_database_test, test_database, DbTester};
pub use errors::{ProbeError, ProbeResult};
pub use model::{Operation, TestResult, TestSuite};
