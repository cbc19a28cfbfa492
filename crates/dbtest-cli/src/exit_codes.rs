//! Process exit codes for `db-test`.

pub const SUCCESS: i32 = 0;
pub const TESTS_FAILED: i32 = 1; // At least one probe failed, or the badge is offline
pub const SETUP_ERROR: i32 = 1; // Bad config, unsupported engine, I/O error
