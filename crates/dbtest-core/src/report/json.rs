use crate::model::TestSuite;
use std::path::Path;

/// Pretty JSON form used by `--json` output.
pub fn to_json_string(suite: &TestSuite) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(suite)?)
}

pub fn write_json(suite: &TestSuite, out: &Path) -> anyhow::Result<()> {
    std::fs::write(out, to_json_string(suite)?)?;
    Ok(())
}
