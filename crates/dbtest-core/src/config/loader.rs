use super::{DatabaseConfig, TestSuiteConfig};
use crate::errors::{ProbeError, ProbeResult};
use regex::{Captures, Regex};
use std::path::Path;
use std::sync::OnceLock;

/// Load a suite configuration from a JSON or YAML file.
///
/// `.yaml`/`.yml` files are parsed as YAML, everything else as JSON.
/// `${VAR}` placeholders inside string values are expanded from the process
/// environment; unset variables expand to an empty string, and string
/// fields left blank that way are treated as absent.
pub fn load_config(path: &Path) -> ProbeResult<TestSuiteConfig> {
    load_config_with(path, |key| std::env::var(key).ok())
}

/// [`load_config`] with an explicit placeholder lookup.
pub fn load_config_with<F>(path: &Path, lookup: F) -> ProbeResult<TestSuiteConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = std::fs::read_to_string(path).map_err(|e| {
        ProbeError::invalid_config(format!("failed to read config {}: {}", path.display(), e))
    })?;

    let mut cfg: TestSuiteConfig = if is_yaml(path) {
        let mut doc: serde_yaml::Value = serde_yaml::from_str(&raw)
            .map_err(|e| ProbeError::invalid_config(format!("failed to parse YAML: {e}")))?;
        expand_yaml_strings(&mut doc, &lookup);
        serde_yaml::from_value(doc)
            .map_err(|e| ProbeError::invalid_config(format!("failed to parse YAML: {e}")))?
    } else {
        let mut doc: serde_json::Value = serde_json::from_str(&raw)
            .map_err(|e| ProbeError::invalid_config(format!("failed to parse JSON: {e}")))?;
        expand_json_strings(&mut doc, &lookup);
        serde_json::from_value(doc)
            .map_err(|e| ProbeError::invalid_config(format!("failed to parse JSON: {e}")))?
    };
    clear_blank_fields(&mut cfg.database);
    cfg.validate()?;
    Ok(cfg)
}

fn expand_json_strings<F>(value: &mut serde_json::Value, lookup: &F)
where
    F: Fn(&str) -> Option<String>,
{
    match value {
        serde_json::Value::String(s) => *s = expand_env_placeholders(s, lookup),
        serde_json::Value::Array(items) => {
            items.iter_mut().for_each(|v| expand_json_strings(v, lookup));
        }
        serde_json::Value::Object(map) => {
            map.values_mut().for_each(|v| expand_json_strings(v, lookup));
        }
        _ => {}
    }
}

// Mapping keys are left as written.
fn expand_yaml_strings<F>(value: &mut serde_yaml::Value, lookup: &F)
where
    F: Fn(&str) -> Option<String>,
{
    match value {
        serde_yaml::Value::String(s) => *s = expand_env_placeholders(s, lookup),
        serde_yaml::Value::Sequence(items) => {
            items.iter_mut().for_each(|v| expand_yaml_strings(v, lookup));
        }
        serde_yaml::Value::Mapping(map) => {
            map.iter_mut().for_each(|(_, v)| expand_yaml_strings(v, lookup));
        }
        serde_yaml::Value::Tagged(tagged) => expand_yaml_strings(&mut tagged.value, lookup),
        _ => {}
    }
}

fn clear_blank_fields(db: &mut DatabaseConfig) {
    for field in [
        &mut db.connection_string,
        &mut db.host,
        &mut db.database,
        &mut db.username,
        &mut db.password,
        &mut db.supabase_url,
        &mut db.supabase_key,
        &mut db.supabase_service_key,
    ] {
        if field.as_deref().is_some_and(|v| v.trim().is_empty()) {
            *field = None;
        }
    }
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"))
}

/// Replace every `${NAME}` in `raw` with `lookup(NAME)`.
pub fn expand_env_placeholders<F>(raw: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    let re = PLACEHOLDER.get_or_init(|| {
        Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("static placeholder regex")
    });
    re.replace_all(raw, |caps: &Captures<'_>| lookup(&caps[1]).unwrap_or_default())
        .into_owned()
}
