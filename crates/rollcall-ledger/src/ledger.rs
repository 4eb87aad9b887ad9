//! High-level [`AttendanceLedger`] facade.
//!
//! Wraps the connection pool and repository into the four operations the
//! rest of the system is allowed to use. The Recorder and the
//! Reconciliation Engine never touch SQL — every write funnels through
//! [`AttendanceLedger::try_create`], which is where the uniqueness
//! invariant is enforced atomically.

use chrono::NaiveDate;
use tracing::debug;

use rollcall_core::{AttendanceRecord, AttendanceStatus, RecordSource};

use crate::connection::{self, ConnectionConfig, ConnectionPool, PooledConnection};
use crate::errors::{LedgerError, Result};
use crate::migrations;
use crate::repository::RecordRepo;

/// Outcome of a conditional create.
///
/// A duplicate is a normal outcome, not an error: the existing record is
/// returned so callers can surface "already recorded today".
#[derive(Clone, Debug)]
pub enum CreateOutcome {
    /// The record was written; this key had no prior record.
    Created(AttendanceRecord),
    /// A record already existed for the key; nothing was written.
    Exists(AttendanceRecord),
}

impl CreateOutcome {
    /// Whether this call created the record.
    #[must_use]
    pub fn created(&self) -> bool {
        matches!(self, Self::Created(_))
    }

    /// The record now stored for the key, whoever wrote it.
    #[must_use]
    pub fn record(&self) -> &AttendanceRecord {
        match self {
            Self::Created(rec) | Self::Exists(rec) => rec,
        }
    }
}

/// Durable, uniqueness-enforcing attendance store.
#[derive(Clone)]
pub struct AttendanceLedger {
    pool: ConnectionPool,
}

impl AttendanceLedger {
    /// Create a ledger over an existing pool. Callers are responsible for
    /// having run migrations.
    pub fn new(pool: ConnectionPool) -> Self {
        Self { pool }
    }

    /// Open a file-backed ledger and run pending migrations.
    pub fn open_file(path: &str, config: &ConnectionConfig) -> Result<Self> {
        let pool = connection::new_file(path, config)?;
        let conn = pool.get()?;
        let _ = migrations::run_migrations(&conn)?;
        Ok(Self { pool })
    }

    /// Open an in-memory ledger (single connection) with migrations applied.
    pub fn open_in_memory() -> Result<Self> {
        let pool = connection::new_in_memory(&ConnectionConfig::default())?;
        let conn = pool.get()?;
        let _ = migrations::run_migrations(&conn)?;
        Ok(Self { pool })
    }

    /// Get a connection from the pool.
    fn conn(&self) -> Result<PooledConnection> {
        Ok(self.pool.get()?)
    }

    /// Atomically create the record unless one already exists for its
    /// (`student_id`, `subject`, `date`) key.
    ///
    /// Concurrent calls for the same key are serialized by the storage
    /// engine's unique index: exactly one caller observes
    /// [`CreateOutcome::Created`]; every other caller gets
    /// [`CreateOutcome::Exists`] carrying the winner's record.
    pub fn try_create(&self, record: &AttendanceRecord) -> Result<CreateOutcome> {
        validate_record(record)?;
        let conn = self.conn()?;

        if RecordRepo::insert_if_absent(&conn, record)? {
            debug!(
                student = record.student_id.as_str(),
                subject = record.subject,
                date = %record.date,
                status = %record.status,
                "attendance record created"
            );
            return Ok(CreateOutcome::Created(record.clone()));
        }

        match RecordRepo::get(&conn, record.student_id.as_str(), &record.subject, record.date)? {
            Some(existing) => Ok(CreateOutcome::Exists(existing)),
            // Rows are never deleted in normal operation, so losing the
            // conflict and then finding nothing means outside interference.
            None => Err(LedgerError::Internal(format!(
                "record for student {}, subject {}, date {} vanished after insert conflict",
                record.student_id, record.subject, record.date
            ))),
        }
    }

    /// Find the record for a logical key.
    pub fn find(
        &self,
        student_id: &str,
        subject: &str,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>> {
        let conn = self.conn()?;
        RecordRepo::get(&conn, student_id, subject, date)
    }

    /// A section's records for a date, ordered by `recorded_at` ascending.
    pub fn find_by_date_and_section(
        &self,
        date: NaiveDate,
        section: &str,
    ) -> Result<Vec<AttendanceRecord>> {
        let conn = self.conn()?;
        RecordRepo::list_by_date_and_section(&conn, date, section)
    }

    /// All records for a date with a given status.
    pub fn find_by_date_and_status(
        &self,
        date: NaiveDate,
        status: AttendanceStatus,
    ) -> Result<Vec<AttendanceRecord>> {
        let conn = self.conn()?;
        RecordRepo::list_by_date_and_status(&conn, date, status)
    }

    /// Count of records for a date.
    pub fn count_by_date(&self, date: NaiveDate) -> Result<i64> {
        let conn = self.conn()?;
        RecordRepo::count_by_date(&conn, date)
    }

    /// Replace the status and reason of an existing record (teacher
    /// override). Any prior status may be overridden; the record's source
    /// becomes `manual`.
    ///
    /// # Errors
    ///
    /// [`LedgerError::RecordNotFound`] when no record exists for the key.
    pub fn override_status(
        &self,
        student_id: &str,
        subject: &str,
        date: NaiveDate,
        new_status: AttendanceStatus,
        reason: Option<&str>,
    ) -> Result<AttendanceRecord> {
        let conn = self.conn()?;
        let tx = conn.unchecked_transaction()?;

        let changed =
            RecordRepo::update_status(&tx, student_id, subject, date, new_status, reason)?;
        if changed == 0 {
            return Err(LedgerError::not_found(student_id, subject, date));
        }

        let updated = RecordRepo::get(&tx, student_id, subject, date)?.ok_or_else(|| {
            LedgerError::Internal(format!(
                "record for student {student_id}, subject {subject}, date {date} vanished during override"
            ))
        })?;
        tx.commit()?;

        debug!(
            student = student_id,
            subject = subject,
            date = %date,
            status = %new_status,
            "attendance record overridden"
        );
        Ok(updated)
    }

    /// Highest applied schema version (for health reporting).
    pub fn schema_version(&self) -> Result<u32> {
        let conn = self.conn()?;
        migrations::current_version(&conn)
    }

    /// Access the underlying pool.
    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }
}

/// Reject records that are malformed regardless of storage state.
fn validate_record(record: &AttendanceRecord) -> Result<()> {
    if record.student_id.is_empty() {
        return Err(LedgerError::InvalidRecord("empty student id".into()));
    }
    if record.subject.is_empty() {
        return Err(LedgerError::InvalidRecord("empty subject".into()));
    }
    if record.section.is_empty() {
        return Err(LedgerError::InvalidRecord("empty section".into()));
    }
    if record.source == RecordSource::System
        && record.status == AttendanceStatus::Absent
        && record.reason.as_deref().is_none_or(str::is_empty)
    {
        return Err(LedgerError::InvalidRecord(
            "system-written absent record requires a reason".into(),
        ));
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
    use rollcall_core::new_record_id;
    use std::sync::Arc;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 9, 1).unwrap()
    }

    fn record(student: &str, subject: &str, status: AttendanceStatus) -> AttendanceRecord {
        AttendanceRecord {
            id: new_record_id(),
            student_id: student.into(),
            section: "10-A".into(),
            subject: subject.into(),
            date: day(),
            status,
            recorded_at: Utc.with_ymd_and_hms(2025, 9, 1, 0, 12, 0).unwrap(),
            source: RecordSource::Recognition,
            reason: None,
        }
    }

    #[test]
    fn create_then_find() {
        let ledger = AttendanceLedger::open_in_memory().unwrap();
        let rec = record("stu-1", "Math", AttendanceStatus::Present);

        let outcome = ledger.try_create(&rec).unwrap();
        assert!(outcome.created());
        assert_eq!(outcome.record(), &rec);

        let found = ledger.find("stu-1", "Math", day()).unwrap().unwrap();
        assert_eq!(found, rec);
    }

    #[test]
    fn duplicate_create_returns_existing_record() {
        let ledger = AttendanceLedger::open_in_memory().unwrap();
        let first = ledger
            .try_create(&record("stu-1", "Math", AttendanceStatus::Present))
            .unwrap();

        let second = ledger
            .try_create(&record("stu-1", "Math", AttendanceStatus::Late))
            .unwrap();

        assert!(!second.created());
        assert_eq!(second.record().id, first.record().id);
        assert_eq!(second.record().status, AttendanceStatus::Present);
    }

    #[test]
    fn concurrent_creates_for_one_key_elect_a_single_winner() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.db");
        let ledger = Arc::new(
            AttendanceLedger::open_file(path.to_str().unwrap(), &ConnectionConfig::default())
                .unwrap(),
        );

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ledger = Arc::clone(&ledger);
                std::thread::spawn(move || {
                    ledger
                        .try_create(&record("stu-1", "Math", AttendanceStatus::Present))
                        .unwrap()
                })
            })
            .collect();

        let outcomes: Vec<CreateOutcome> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();

        let created: Vec<_> = outcomes.iter().filter(|o| o.created()).collect();
        assert_eq!(created.len(), 1, "exactly one concurrent create must win");

        let winner_id = &created[0].record().id;
        for outcome in &outcomes {
            assert_eq!(&outcome.record().id, winner_id);
        }
        assert_eq!(ledger.count_by_date(day()).unwrap(), 1);
    }

    #[test]
    fn rejects_empty_student_id() {
        let ledger = AttendanceLedger::open_in_memory().unwrap();
        let rec = record("", "Math", AttendanceStatus::Present);
        let err = ledger.try_create(&rec).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidRecord(_)));
    }

    #[test]
    fn rejects_system_absence_without_reason() {
        let ledger = AttendanceLedger::open_in_memory().unwrap();
        let mut rec = record("stu-1", "Math", AttendanceStatus::Absent);
        rec.source = RecordSource::System;
        rec.reason = None;
        let err = ledger.try_create(&rec).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidRecord(_)));
    }

    #[test]
    fn system_absence_with_reason_is_accepted() {
        let ledger = AttendanceLedger::open_in_memory().unwrap();
        let mut rec = record("stu-1", "Math", AttendanceStatus::Absent);
        rec.source = RecordSource::System;
        rec.reason = Some("no scan between 06:00 and 16:00".into());
        assert!(ledger.try_create(&rec).unwrap().created());
    }

    #[test]
    fn override_missing_key_is_not_found() {
        let ledger = AttendanceLedger::open_in_memory().unwrap();
        let err = ledger
            .override_status("ghost", "Math", day(), AttendanceStatus::Present, None)
            .unwrap_err();
        assert!(matches!(err, LedgerError::RecordNotFound(_)));
    }

    #[test]
    fn override_replaces_any_prior_status() {
        let ledger = AttendanceLedger::open_in_memory().unwrap();
        let mut rec = record("stu-1", "Math", AttendanceStatus::Absent);
        rec.source = RecordSource::System;
        rec.reason = Some("no scan between 06:00 and 16:00".into());
        ledger.try_create(&rec).unwrap();

        let updated = ledger
            .override_status(
                "stu-1",
                "Math",
                day(),
                AttendanceStatus::Present,
                Some("verified late arrival"),
            )
            .unwrap();

        assert_eq!(updated.status, AttendanceStatus::Present);
        assert_eq!(updated.source, RecordSource::Manual);
        assert_eq!(updated.reason.as_deref(), Some("verified late arrival"));

        // And back again — overrides are unrestricted by prior status.
        let reverted = ledger
            .override_status("stu-1", "Math", day(), AttendanceStatus::Absent, None)
            .unwrap();
        assert_eq!(reverted.status, AttendanceStatus::Absent);
    }

    #[test]
    fn section_report_is_ordered() {
        let ledger = AttendanceLedger::open_in_memory().unwrap();
        let mut a = record("stu-1", "Math", AttendanceStatus::Present);
        a.recorded_at = Utc.with_ymd_and_hms(2025, 9, 1, 1, 0, 0).unwrap();
        let mut b = record("stu-2", "Math", AttendanceStatus::Late);
        b.recorded_at = Utc.with_ymd_and_hms(2025, 9, 1, 0, 30, 0).unwrap();
        ledger.try_create(&a).unwrap();
        ledger.try_create(&b).unwrap();

        let report = ledger.find_by_date_and_section(day(), "10-A").unwrap();
        assert_eq!(report.len(), 2);
        assert_eq!(report[0].student_id.as_str(), "stu-2");
        assert_eq!(report[1].student_id.as_str(), "stu-1");
    }

    #[test]
    fn schema_version_reports_latest() {
        let ledger = AttendanceLedger::open_in_memory().unwrap();
        assert_eq!(
            ledger.schema_version().unwrap(),
            crate::migrations::latest_version()
        );
    }
}
