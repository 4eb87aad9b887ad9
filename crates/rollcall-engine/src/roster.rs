//! Roster provider seam.
//!
//! The roster is an external collaborator: which sections and subjects
//! count as real is entirely the provider's policy. The core only consumes
//! the typed enrollment set for a date and never second-guesses it.

use async_trait::async_trait;
use chrono::NaiveDate;

use rollcall_core::Enrollment;

use crate::errors::RosterError;

/// Supplies the set of active (student, section, subject) enrollments for a
/// given date.
#[async_trait]
pub trait RosterProvider: Send + Sync {
    /// Enrollments active on `date`.
    async fn active_enrollments(&self, date: NaiveDate) -> Result<Vec<Enrollment>, RosterError>;
}

/// In-memory roster, loaded once at startup (e.g. from a JSON file).
///
/// Returns the same enrollment set for every date — term-scoped rosters
/// that vary by day belong in a real provider implementation.
#[derive(Clone, Debug, Default)]
pub struct StaticRoster {
    enrollments: Vec<Enrollment>,
}

impl StaticRoster {
    /// Build from an explicit enrollment list.
    #[must_use]
    pub fn new(enrollments: Vec<Enrollment>) -> Self {
        Self { enrollments }
    }

    /// Parse a JSON array of enrollments (the roster file format).
    pub fn from_json_str(json: &str) -> Result<Self, RosterError> {
        let enrollments: Vec<Enrollment> = serde_json::from_str(json)
            .map_err(|e| RosterError::Provider(format!("invalid roster JSON: {e}")))?;
        Ok(Self { enrollments })
    }

    /// Number of enrollments in the roster.
    #[must_use]
    pub fn len(&self) -> usize {
        self.enrollments.len()
    }

    /// Whether the roster is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.enrollments.is_empty()
    }
}

#[async_trait]
impl RosterProvider for StaticRoster {
    async fn active_enrollments(&self, _date: NaiveDate) -> Result<Vec<Enrollment>, RosterError> {
        Ok(self.enrollments.clone())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 9, 1).unwrap()
    }

    #[tokio::test]
    async fn static_roster_returns_all_enrollments() {
        let roster = StaticRoster::new(vec![
            Enrollment {
                student_id: "stu-1".into(),
                section: "10-A".into(),
                subject: "Math".into(),
            },
            Enrollment {
                student_id: "stu-2".into(),
                section: "10-A".into(),
                subject: "Math".into(),
            },
        ]);
        let enrollments = roster.active_enrollments(date()).await.unwrap();
        assert_eq!(enrollments.len(), 2);
    }

    #[tokio::test]
    async fn from_json_parses_the_roster_file_format() {
        let json = r#"[
            {"studentId": "stu-1", "section": "10-A", "subject": "Math"},
            {"studentId": "stu-2", "section": "10-B", "subject": "Physics"}
        ]"#;
        let roster = StaticRoster::from_json_str(json).unwrap();
        assert_eq!(roster.len(), 2);
        let enrollments = roster.active_enrollments(date()).await.unwrap();
        assert_eq!(enrollments[1].subject, "Physics");
    }

    #[test]
    fn from_json_rejects_malformed_input() {
        let err = StaticRoster::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, RosterError::Provider(_)));
    }

    #[test]
    fn empty_roster() {
        let roster = StaticRoster::default();
        assert!(roster.is_empty());
        assert_eq!(roster.len(), 0);
    }
}
