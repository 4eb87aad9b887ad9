//! Attendance recorder — the live-signal write path.
//!
//! One call per externally resolved presence event: validate, build the
//! record, hand it to the ledger's atomic conditional create, then notify.
//! Whether the signal's `try_create` wins or loses a race (against a
//! duplicate scan or the reconciliation sweep), the caller always gets a
//! definite outcome carrying the record now stored for the key.

use std::sync::Arc;

use tracing::{info, warn};

use rollcall_core::{
    AttendanceRecord, DayPolicy, PresenceSignal, RecordSource, new_record_id,
};
use rollcall_ledger::{AttendanceLedger, CreateOutcome};

use crate::errors::RecorderError;
use crate::notify::NotificationDispatcher;

/// Outcome of recording one presence signal.
#[derive(Clone, Debug)]
pub enum RecordOutcome {
    /// The signal created the day's record for this (student, subject).
    Recorded(AttendanceRecord),
    /// A record already existed — "already recorded today". Carries the
    /// existing record, whatever its status and source.
    Duplicate(AttendanceRecord),
}

impl RecordOutcome {
    /// The record now stored for the signal's key.
    #[must_use]
    pub fn record(&self) -> &AttendanceRecord {
        match self {
            Self::Recorded(rec) | Self::Duplicate(rec) => rec,
        }
    }
}

/// Turns presence signals into ledger writes and notifications.
pub struct AttendanceRecorder {
    ledger: AttendanceLedger,
    policy: DayPolicy,
    dispatcher: Arc<dyn NotificationDispatcher>,
}

impl AttendanceRecorder {
    /// Create a recorder.
    pub fn new(
        ledger: AttendanceLedger,
        policy: DayPolicy,
        dispatcher: Arc<dyn NotificationDispatcher>,
    ) -> Self {
        Self {
            ledger,
            policy,
            dispatcher,
        }
    }

    /// Record a recognition-sourced presence signal.
    pub async fn record(&self, signal: &PresenceSignal) -> Result<RecordOutcome, RecorderError> {
        self.record_with_source(signal, RecordSource::Recognition)
            .await
    }

    /// Record a teacher-entered presence signal.
    pub async fn record_manual(
        &self,
        signal: &PresenceSignal,
    ) -> Result<RecordOutcome, RecorderError> {
        self.record_with_source(signal, RecordSource::Manual).await
    }

    async fn record_with_source(
        &self,
        signal: &PresenceSignal,
        source: RecordSource,
    ) -> Result<RecordOutcome, RecorderError> {
        validate_signal(signal)?;

        let record = AttendanceRecord {
            id: new_record_id(),
            student_id: signal.student_id.clone(),
            section: signal.section.clone(),
            subject: signal.subject.clone(),
            date: self.policy.school_day(signal.timestamp),
            status: signal.resolved_status.into(),
            recorded_at: signal.timestamp,
            source,
            reason: None,
        };

        match self.ledger.try_create(&record)? {
            CreateOutcome::Created(created) => {
                info!(
                    student = created.student_id.as_str(),
                    subject = created.subject,
                    date = %created.date,
                    status = %created.status,
                    "presence signal recorded"
                );
                // Dispatch failure must not roll back the write and is
                // never retried here.
                if let Err(err) = self.dispatcher.notify(&created).await {
                    warn!(
                        record_id = created.id,
                        error = %err,
                        "notification dispatch failed for recorded signal"
                    );
                }
                Ok(RecordOutcome::Recorded(created))
            }
            CreateOutcome::Exists(existing) => {
                info!(
                    student = existing.student_id.as_str(),
                    subject = existing.subject,
                    date = %existing.date,
                    existing_status = %existing.status,
                    "duplicate presence signal"
                );
                Ok(RecordOutcome::Duplicate(existing))
            }
        }
    }
}

/// Reject malformed or incomplete signals before they reach the ledger.
fn validate_signal(signal: &PresenceSignal) -> Result<(), RecorderError> {
    if signal.student_id.trim().is_empty() {
        return Err(RecorderError::InvalidSignal("empty student id".into()));
    }
    if signal.section.trim().is_empty() {
        return Err(RecorderError::InvalidSignal("empty section".into()));
    }
    if signal.subject.trim().is_empty() {
        return Err(RecorderError::InvalidSignal("empty subject".into()));
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(unused_results)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rollcall_core::{AttendanceStatus, PresenceStatus};

    use crate::notify::{BroadcastDispatcher, NoopDispatcher};

    fn recorder() -> AttendanceRecorder {
        AttendanceRecorder::new(
            AttendanceLedger::open_in_memory().unwrap(),
            DayPolicy::default(),
            Arc::new(NoopDispatcher),
        )
    }

    fn signal(student: &str, subject: &str) -> PresenceSignal {
        PresenceSignal {
            student_id: student.into(),
            section: "10-A".into(),
            subject: subject.into(),
            // 00:12 UTC = 08:12 Manila, inside the scan window.
            timestamp: Utc.with_ymd_and_hms(2025, 9, 1, 0, 12, 0).unwrap(),
            resolved_status: PresenceStatus::Present,
        }
    }

    #[tokio::test]
    async fn first_signal_creates_a_present_record() {
        let recorder = recorder();
        let outcome = recorder.record(&signal("stu-1", "Math")).await.unwrap();

        let RecordOutcome::Recorded(rec) = outcome else {
            panic!("expected Recorded");
        };
        assert_eq!(rec.status, AttendanceStatus::Present);
        assert_eq!(rec.source, RecordSource::Recognition);
        assert_eq!(rec.date, chrono::NaiveDate::from_ymd_opt(2025, 9, 1).unwrap());
        assert!(rec.reason.is_none());
    }

    #[tokio::test]
    async fn second_signal_is_a_duplicate_carrying_the_first_record() {
        let recorder = recorder();
        let first = recorder.record(&signal("stu-1", "Math")).await.unwrap();

        let mut again = signal("stu-1", "Math");
        // 50 ms later, resolved differently — the stored record must not move.
        again.timestamp = Utc.with_ymd_and_hms(2025, 9, 1, 0, 12, 0).unwrap()
            + chrono::Duration::milliseconds(50);
        again.resolved_status = PresenceStatus::Late;

        let outcome = recorder.record(&again).await.unwrap();
        let RecordOutcome::Duplicate(existing) = outcome else {
            panic!("expected Duplicate");
        };
        assert_eq!(existing.id, first.record().id);
        assert_eq!(existing.status, AttendanceStatus::Present);
    }

    #[tokio::test]
    async fn late_status_is_preserved() {
        let recorder = recorder();
        let mut sig = signal("stu-1", "Math");
        sig.resolved_status = PresenceStatus::Late;

        let outcome = recorder.record(&sig).await.unwrap();
        assert_eq!(outcome.record().status, AttendanceStatus::Late);
    }

    #[tokio::test]
    async fn manual_signal_is_stamped_manual() {
        let recorder = recorder();
        let outcome = recorder
            .record_manual(&signal("stu-1", "Math"))
            .await
            .unwrap();
        assert_eq!(outcome.record().source, RecordSource::Manual);
    }

    #[tokio::test]
    async fn same_student_two_subjects_two_records() {
        let recorder = recorder();
        assert!(matches!(
            recorder.record(&signal("stu-1", "Math")).await.unwrap(),
            RecordOutcome::Recorded(_)
        ));
        assert!(matches!(
            recorder.record(&signal("stu-1", "Physics")).await.unwrap(),
            RecordOutcome::Recorded(_)
        ));
    }

    #[tokio::test]
    async fn empty_student_id_rejected() {
        let recorder = recorder();
        let err = recorder.record(&signal("", "Math")).await.unwrap_err();
        assert!(matches!(err, RecorderError::InvalidSignal(_)));
    }

    #[tokio::test]
    async fn blank_subject_rejected() {
        let recorder = recorder();
        let err = recorder.record(&signal("stu-1", "  ")).await.unwrap_err();
        assert!(matches!(err, RecorderError::InvalidSignal(_)));
    }

    #[tokio::test]
    async fn created_record_is_broadcast() {
        let dispatcher = BroadcastDispatcher::new(8);
        let mut rx = dispatcher.subscribe();
        let recorder = AttendanceRecorder::new(
            AttendanceLedger::open_in_memory().unwrap(),
            DayPolicy::default(),
            Arc::new(dispatcher),
        );

        recorder.record(&signal("stu-1", "Math")).await.unwrap();
        let notified = rx.recv().await.unwrap();
        assert_eq!(notified.student_id.as_str(), "stu-1");
    }

    #[tokio::test]
    async fn duplicate_is_not_broadcast() {
        let dispatcher = BroadcastDispatcher::new(8);
        let mut rx = dispatcher.subscribe();
        let recorder = AttendanceRecorder::new(
            AttendanceLedger::open_in_memory().unwrap(),
            DayPolicy::default(),
            Arc::new(dispatcher),
        );

        recorder.record(&signal("stu-1", "Math")).await.unwrap();
        recorder.record(&signal("stu-1", "Math")).await.unwrap();

        // Only the create is notified.
        assert!(rx.recv().await.is_ok());
        assert!(matches!(
            rx.try_recv(),
            Err(tokio::sync::broadcast::error::TryRecvError::Empty)
        ));
    }

    #[tokio::test]
    async fn cross_midnight_signal_lands_on_the_local_day() {
        let recorder = recorder();
        let mut sig = signal("stu-1", "Math");
        // 23:30 UTC Aug 31 = 07:30 Sep 1 in Manila.
        sig.timestamp = Utc.with_ymd_and_hms(2025, 8, 31, 23, 30, 0).unwrap();

        let outcome = recorder.record(&sig).await.unwrap();
        assert_eq!(
            outcome.record().date,
            chrono::NaiveDate::from_ymd_opt(2025, 9, 1).unwrap()
        );
    }
}
