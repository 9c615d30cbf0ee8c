use crate::ipc::error::HandlerErr;
use serde_json::{json, Value};
use std::path::PathBuf;

pub fn get_required_str(params: &Value, key: &str) -> Result<String, HandlerErr> {
    get_optional_str(params, key)
        .ok_or_else(|| HandlerErr::new("bad_params", format!("missing {}", key)))
}

pub fn get_optional_str(params: &Value, key: &str) -> Option<String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Accepts a JSON integer or a numeric string.
pub fn get_required_id(params: &Value, key: &str) -> Result<i64, HandlerErr> {
    let v = params
        .get(key)
        .ok_or_else(|| HandlerErr::new("bad_params", format!("missing {}", key)))?;
    v.as_i64()
        .or_else(|| v.as_str().and_then(|s| s.trim().parse::<i64>().ok()))
        .ok_or_else(|| HandlerErr::new("bad_params", format!("{} must be an integer", key)))
}

/// Absent means `default`; present values must be positive integers.
pub fn get_positive_usize(params: &Value, key: &str, default: usize) -> Result<usize, HandlerErr> {
    let Some(v) = params.get(key).filter(|v| !v.is_null()) else {
        return Ok(default);
    };
    v.as_u64()
        .or_else(|| v.as_str().and_then(|s| s.trim().parse::<u64>().ok()))
        .map(|n| n as usize)
        .ok_or_else(|| {
            HandlerErr::new("bad_params", format!("{} must be a positive integer", key))
        })
}

pub fn write_export_file(path: &str, contents: &[u8]) -> Result<PathBuf, HandlerErr> {
    let out = PathBuf::from(path);
    if let Some(parent) = out.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            HandlerErr::new("export_failed", e.to_string()).with_details(json!({ "path": path }))
        })?;
    }
    std::fs::write(&out, contents).map_err(|e| {
        HandlerErr::new("export_failed", e.to_string()).with_details(json!({ "path": path }))
    })?;
    Ok(out)
}
