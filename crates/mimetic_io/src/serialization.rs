//! JSON helpers with error context, used for run summaries and archives.

use crate::error::{IoError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

fn encode<T: Serialize>(data: &T, pretty: bool) -> Result<String> {
    let encoded = if pretty {
        serde_json::to_string_pretty(data)
    } else {
        serde_json::to_string(data)
    };
    encoded.map_err(|e| IoError::encoding(format!("{} as JSON: {e}", std::any::type_name::<T>())))
}

pub fn to_json<T: Serialize>(data: &T) -> Result<String> {
    encode(data, false)
}

pub fn to_json_pretty<T: Serialize>(data: &T) -> Result<String> {
    encode(data, true)
}

/// Parses `json`. Blank input is rejected as [`IoError::Invalid`] rather
/// than reported as a parse error at column 0.
pub fn from_json<T>(json: &str) -> Result<T>
where
    T: for<'de> Deserialize<'de>,
{
    if json.trim().is_empty() {
        return Err(IoError::invalid("blank JSON document"));
    }
    Ok(serde_json::from_str(json)?)
}

/// Writes pretty-printed JSON, creating parent directories as needed.
pub fn write_json_file<T, P>(data: &T, path: P) -> Result<()>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let json = to_json_pretty(data)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, json).map_err(|e| IoError::from(e).during(format!("writing {}", path.display())))
}

pub fn read_json_file<T, P>(path: P) -> Result<T>
where
    T: for<'de> Deserialize<'de>,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let action = || format!("reading {}", path.display());
    let json = std::fs::read_to_string(path).map_err(|e| IoError::from(e).during(action()))?;
    from_json(&json).map_err(|e| e.during(action()))
}
