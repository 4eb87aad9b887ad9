//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`RollcallSettings::default()`]
//! 2. If `~/.rollcall/settings.json` exists, deep-merge user values over
//!    defaults
//! 3. Apply environment variable overrides (highest priority)
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::Result;
use crate::types::RollcallSettings;

/// Resolve the path to the settings file (`~/.rollcall/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".rollcall").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<RollcallSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// If the file does not exist, returns defaults. If the file contains
/// invalid JSON, returns an error.
pub fn load_settings_from_path(path: &Path) -> Result<RollcallSettings> {
    let defaults = serde_json::to_value(RollcallSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: RollcallSettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Recursive deep merge of two JSON values.
///
/// - Objects are merged recursively (source overrides target per-key)
/// - Arrays and primitives are replaced entirely by source
/// - Null values in source are skipped (preserving target)
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply environment variable overrides to loaded settings.
///
/// Each env var has strict parsing rules: integers must be valid and within
/// range; invalid values are silently ignored (fall back to file/default).
pub fn apply_env_overrides(settings: &mut RollcallSettings) {
    // ── Ledger settings ─────────────────────────────────────────────
    if let Some(v) = read_env_string("ROLLCALL_DB_PATH") {
        settings.ledger.db_path = v;
    }
    if let Some(v) = read_env_u32("ROLLCALL_POOL_SIZE", 1, 128) {
        settings.ledger.pool_size = v;
    }
    if let Some(v) = read_env_u32("ROLLCALL_BUSY_TIMEOUT_MS", 1, 600_000) {
        settings.ledger.busy_timeout_ms = v;
    }

    // ── Policy settings ─────────────────────────────────────────────
    if let Some(v) = read_env_string("ROLLCALL_TIMEZONE") {
        settings.policy.timezone = v;
    }
    if let Some(v) = read_env_string("ROLLCALL_WINDOW_START") {
        settings.policy.window_start = v;
    }
    if let Some(v) = read_env_string("ROLLCALL_WINDOW_END") {
        settings.policy.window_end = v;
    }
    if let Some(v) = read_env_string("ROLLCALL_CUTOFF") {
        settings.policy.cutoff = v;
    }

    // ── Server settings ─────────────────────────────────────────────
    if let Some(v) = read_env_string("ROLLCALL_HOST") {
        settings.server.host = v;
    }
    if let Some(v) = read_env_u16("ROLLCALL_PORT", 1, 65535) {
        settings.server.port = v;
    }

    // ── Roster ──────────────────────────────────────────────────────
    if let Some(v) = read_env_string("ROLLCALL_ROSTER_PATH") {
        settings.roster_path = Some(v);
    }
}

fn read_env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn read_env_u16(name: &str, min: u16, max: u16) -> Option<u16> {
    std::env::var(name)
        .ok()
        .and_then(|v| parse_in_range_u16(&v, min, max))
}

fn read_env_u32(name: &str, min: u32, max: u32) -> Option<u32> {
    std::env::var(name)
        .ok()
        .and_then(|v| parse_in_range_u32(&v, min, max))
}

fn parse_in_range_u16(value: &str, min: u16, max: u16) -> Option<u16> {
    value
        .trim()
        .parse::<u16>()
        .ok()
        .filter(|v| (min..=max).contains(v))
}

fn parse_in_range_u32(value: &str, min: u32, max: u32) -> Option<u32> {
    value
        .trim()
        .parse::<u32>()
        .ok()
        .filter(|v| (min..=max).contains(v))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
