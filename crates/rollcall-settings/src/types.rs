//! Settings types with compiled defaults.
//!
//! Time-of-day values are stored as `HH:MM` strings and the zone as an
//! IANA name; [`PolicySettings::day_policy`] converts the section into a
//! validated [`DayPolicy`] at startup so the rest of the system never
//! parses configuration again.

use std::str::FromStr;

use chrono::NaiveTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use rollcall_core::{DayPolicy, ScanWindow};

use crate::errors::{Result, SettingsError};

/// Root settings for the Rollcall service.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RollcallSettings {
    /// Ledger database settings.
    pub ledger: LedgerSettings,
    /// Scan-window and cutoff policy.
    pub policy: PolicySettings,
    /// HTTP server settings.
    pub server: ServerSettings,
    /// Path to the roster JSON file (optional; empty roster when unset).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roster_path: Option<String>,
}

/// Ledger database settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LedgerSettings {
    /// Path to the `SQLite` database file.
    pub db_path: String,
    /// Maximum connection pool size.
    pub pool_size: u32,
    /// Busy timeout in milliseconds.
    pub busy_timeout_ms: u32,
    /// Page cache size in KiB.
    pub cache_size_kib: i64,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            pool_size: 16,
            busy_timeout_ms: 30_000,
            cache_size_kib: 8192,
        }
    }
}

fn default_db_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    format!("{home}/.rollcall/database/rollcall.db")
}

/// Scan-window and cutoff policy settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PolicySettings {
    /// IANA time zone name for the canonical school zone.
    pub timezone: String,
    /// Scan window opening time (`HH:MM`).
    pub window_start: String,
    /// Scan window closing time (`HH:MM`).
    pub window_end: String,
    /// Reconciliation cutoff time (`HH:MM`).
    pub cutoff: String,
}

impl Default for PolicySettings {
    fn default() -> Self {
        Self {
            timezone: "Asia/Manila".into(),
            window_start: "06:00".into(),
            window_end: "16:00".into(),
            cutoff: "16:01".into(),
        }
    }
}

impl PolicySettings {
    /// Build the validated [`DayPolicy`] from this section.
    pub fn day_policy(&self) -> Result<DayPolicy> {
        let timezone = Tz::from_str(&self.timezone).map_err(|_| SettingsError::Invalid {
            message: format!("policy.timezone: unknown zone {:?}", self.timezone),
        })?;
        let window = ScanWindow::new(
            parse_time("policy.windowStart", &self.window_start)?,
            parse_time("policy.windowEnd", &self.window_end)?,
        )
        .map_err(|e| SettingsError::Invalid {
            message: e.to_string(),
        })?;
        let cutoff = parse_time("policy.cutoff", &self.cutoff)?;

        DayPolicy::new(timezone, window, cutoff).map_err(|e| SettingsError::Invalid {
            message: e.to_string(),
        })
    }
}

fn parse_time(field: &str, value: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M").map_err(|_| SettingsError::Invalid {
        message: format!("{field}: {value:?} is not a HH:MM time"),
    })
}

/// HTTP server settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    /// Host to bind.
    pub host: String,
    /// Port to bind (0 for auto-assign).
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8431,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
