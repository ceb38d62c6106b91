//! Flattening printer for nested data.
//!
//! Every terminal value becomes one `path = value` line. The path joins map
//! keys and sequence indices with `.`:
//!
//! ```
//! use sched_cli::flatten::flatten;
//!
//! let value = serde_json::json!({"a": {"b": [1, 2]}});
//! let lines: Vec<String> = flatten(&value)
//!     .into_iter()
//!     .map(|(key, value)| format!("{key} = {value}"))
//!     .collect();
//! assert_eq!(lines, ["a.b.0 = 1", "a.b.1 = 2"]);
//! ```
//!
//! Time limit fields ([`DURATION_KEYS`]) at or above the unlimited sentinel
//! print as `unlimited`. Other numbers print as they are.

use std::io::Write;

use serde_json::Value;

use crate::error::CliError;
use crate::units::is_unlimited_time;

/// Keys whose values are time limits in seconds.
pub const DURATION_KEYS: &[&str] = &["max_time_limit_per_task", "time_limit_secs"];

/// Flatten `value` into `(path, rendered value)` pairs.
///
/// Sequences are visited in index order, maps in their iteration order.
/// Empty containers produce nothing.
#[must_use]
pub fn flatten(value: &Value) -> Vec<(String, String)> {
    let mut lines = Vec::new();
    walk(value, String::new(), None, &mut lines);
    lines
}

fn walk(value: &Value, path: String, key: Option<&str>, lines: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            for (name, child) in map {
                walk(child, join(&path, name), Some(name), lines);
            }
        }
        Value::Array(items) => {
            for (idx, child) in items.iter().enumerate() {
                walk(child, join(&path, &idx.to_string()), None, lines);
            }
        }
        terminal => lines.push((path, render(key, terminal))),
    }
}

fn join(path: &str, step: &str) -> String {
    if path.is_empty() {
        step.to_string()
    } else {
        format!("{path}.{step}")
    }
}

fn render(key: Option<&str>, value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n)
            if key.is_some_and(|k| DURATION_KEYS.contains(&k))
                && n.as_u64().is_some_and(is_unlimited_time) =>
        {
            "unlimited".to_string()
        }
        other => other.to_string(),
    }
}

/// Write the flattened form of `value`, one line per terminal.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_flat<W: Write>(writer: &mut W, value: &Value) -> Result<(), CliError> {
    for (path, rendered) in flatten(value) {
        if path.is_empty() {
            writeln!(writer, "{rendered}")?;
        } else {
            writeln!(writer, "{path} = {rendered}")?;
        }
    }
    Ok(())
}

/// Convert a TOML tree into the JSON model the printer walks.
#[must_use]
pub fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::from(i),
        toml::Value::Float(f) => serde_json::Number::from_f64(f).map_or(Value::Null, Value::Number),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => table_to_json(table),
    }
}

/// Convert a TOML table into a JSON object.
#[must_use]
pub fn table_to_json(table: toml::Table) -> Value {
    Value::Object(
        table
            .into_iter()
            .map(|(key, value)| (key, toml_to_json(value)))
            .collect(),
    )
}
