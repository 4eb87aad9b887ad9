//! Attendance vocabulary — the record entity, its enums, and signal types.
//!
//! [`AttendanceRecord`] is the sole persisted entity in the system. The
//! uniqueness invariant over (`student_id`, `subject`, `date`) is enforced
//! by the ledger's storage layer; the types here only carry the data.
//!
//! Wire format is camelCase JSON, matching the ingress payloads. SQL
//! conversions go through `as_sql`/`from_sql` so the storage layer never
//! stringifies enums ad hoc.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ids::StudentId;

/// Terminal attendance status for a (student, subject, date) key.
///
/// Every variant is terminal: once a record is written, only an explicit
/// manual override may replace the status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    /// Qualifying presence signal arrived inside the scan window.
    Present,
    /// Presence signal arrived, but past the per-subject start policy.
    Late,
    /// No qualifying signal by cutoff; written by the reconciliation sweep.
    Absent,
}

impl AttendanceStatus {
    /// SQL column representation.
    #[must_use]
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::Late => "late",
            Self::Absent => "absent",
        }
    }

    /// Parse the SQL column representation.
    #[must_use]
    pub fn from_sql(s: &str) -> Option<Self> {
        match s {
            "present" => Some(Self::Present),
            "late" => Some(Self::Late),
            "absent" => Some(Self::Absent),
            _ => None,
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Provenance of an attendance record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordSource {
    /// Automated recognition event.
    Recognition,
    /// Teacher-entered presence or override.
    Manual,
    /// Reconciliation sweep.
    System,
}

impl RecordSource {
    /// SQL column representation.
    #[must_use]
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Recognition => "recognition",
            Self::Manual => "manual",
            Self::System => "system",
        }
    }

    /// Parse the SQL column representation.
    #[must_use]
    pub fn from_sql(s: &str) -> Option<Self> {
        match s {
            "recognition" => Some(Self::Recognition),
            "manual" => Some(Self::Manual),
            "system" => Some(Self::System),
            _ => None,
        }
    }
}

impl fmt::Display for RecordSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Status a live presence signal can resolve to.
///
/// Deliberately excludes `Absent`: absence is only ever concluded by the
/// reconciliation sweep, never submitted as a signal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceStatus {
    /// On-time presence.
    Present,
    /// Late presence, per the external start-time policy.
    Late,
}

impl From<PresenceStatus> for AttendanceStatus {
    fn from(status: PresenceStatus) -> Self {
        match status {
            PresenceStatus::Present => Self::Present,
            PresenceStatus::Late => Self::Late,
        }
    }
}

/// The sole persisted entity: one terminal attendance outcome per
/// (`student_id`, `subject`, `date`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    /// Storage row ID (`att-<uuidv7>`). The logical key is the tuple below.
    pub id: String,
    /// Stable external student identifier.
    pub student_id: StudentId,
    /// Section identifying the class context.
    pub section: String,
    /// Subject identifying the class context.
    pub subject: String,
    /// School day, normalized to the canonical time zone. Never a timestamp.
    pub date: NaiveDate,
    /// Terminal status; mutable only via manual override.
    pub status: AttendanceStatus,
    /// Timestamp of the underlying signal or reconciliation sweep.
    pub recorded_at: DateTime<Utc>,
    /// Provenance of the write.
    pub source: RecordSource,
    /// Required when `source = system` and `status = absent`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// An externally resolved presence event for a student, subject, and time.
///
/// `resolved_status` is decided by policy upstream (signal time relative to
/// a per-subject start time); the core does not re-derive it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceSignal {
    /// Student the signal was resolved to.
    pub student_id: StudentId,
    /// Section the signal was observed in.
    pub section: String,
    /// Subject the signal counts toward.
    pub subject: String,
    /// When the presence was observed.
    pub timestamp: DateTime<Utc>,
    /// Externally resolved status (`present` or `late`).
    pub resolved_status: PresenceStatus,
}

/// One active (student, section, subject) enrollment on a given date, as
/// supplied by a roster provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    /// Enrolled student.
    pub student_id: StudentId,
    /// Section the student is enrolled in.
    pub section: String,
    /// Subject taught to that section.
    pub subject: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
