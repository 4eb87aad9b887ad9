//! # rollcall-settings
//!
//! Configuration management with layered sources for the Rollcall service.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults** — [`RollcallSettings::default()`]
//! 2. **User file** — `~/.rollcall/settings.json` (deep-merged over defaults)
//! 3. **Environment variables** — `ROLLCALL_*` overrides (highest priority)

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::{LedgerSettings, PolicySettings, RollcallSettings, ServerSettings};

use std::sync::OnceLock;

/// Global settings singleton.
///
/// Initialized on first access via [`get_settings`]. Loaded from
/// `~/.rollcall/settings.json` with env var overrides, or compiled
/// defaults if loading fails.
static SETTINGS: OnceLock<RollcallSettings> = OnceLock::new();

/// Get the global settings instance.
pub fn get_settings() -> &'static RollcallSettings {
    SETTINGS.get_or_init(|| load_settings().unwrap_or_default())
}

/// Initialize the global settings with a specific value.
///
/// # Errors
///
/// Returns the provided settings back if the global was already
/// initialized.
#[allow(clippy::result_large_err)]
pub fn init_settings(settings: RollcallSettings) -> std::result::Result<(), RollcallSettings> {
    SETTINGS.set(settings)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn re_exports_work() {
        let _settings = RollcallSettings::default();
        let _path = settings_path();
    }

    #[test]
    fn deep_merge_re_exported() {
        let a = serde_json::json!({"x": 1});
        let b = serde_json::json!({"y": 2});
        let merged = deep_merge(a, b);
        assert_eq!(merged["x"], 1);
        assert_eq!(merged["y"], 2);
    }
}
