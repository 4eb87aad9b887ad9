//! SQL data access layer for attendance records.
//!
//! All methods take a `&Connection` parameter and are stateless — pure
//! functions that translate between Rust types and SQL. The conditional
//! insert is a single `INSERT ... ON CONFLICT DO NOTHING` statement, so
//! uniqueness is decided by the storage engine, never by a read-then-write
//! sequence in this layer.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension, params};

use rollcall_core::{AttendanceRecord, AttendanceStatus, RecordSource, StudentId};

use crate::errors::{LedgerError, Result};

const RECORD_COLUMNS: &str =
    "id, student_id, section, subject, date, status, recorded_at, source, reason";

/// Raw database row shape — not the public API type.
///
/// Conversion to [`AttendanceRecord`] (date/timestamp/enum parsing) happens
/// in [`RecordRow::into_record`]; a row that fails to parse surfaces as
/// [`LedgerError::InvalidRecord`] rather than a panic.
struct RecordRow {
    id: String,
    student_id: String,
    section: String,
    subject: String,
    date: String,
    status: String,
    recorded_at: String,
    source: String,
    reason: Option<String>,
}

impl RecordRow {
    fn map(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            student_id: row.get(1)?,
            section: row.get(2)?,
            subject: row.get(3)?,
            date: row.get(4)?,
            status: row.get(5)?,
            recorded_at: row.get(6)?,
            source: row.get(7)?,
            reason: row.get(8)?,
        })
    }

    fn into_record(self) -> Result<AttendanceRecord> {
        let date = self
            .date
            .parse::<NaiveDate>()
            .map_err(|e| LedgerError::InvalidRecord(format!("bad date {:?}: {e}", self.date)))?;
        let recorded_at = DateTime::parse_from_rfc3339(&self.recorded_at)
            .map_err(|e| {
                LedgerError::InvalidRecord(format!("bad recorded_at {:?}: {e}", self.recorded_at))
            })?
            .with_timezone(&Utc);
        let status = AttendanceStatus::from_sql(&self.status)
            .ok_or_else(|| LedgerError::InvalidRecord(format!("bad status {:?}", self.status)))?;
        let source = RecordSource::from_sql(&self.source)
            .ok_or_else(|| LedgerError::InvalidRecord(format!("bad source {:?}", self.source)))?;

        Ok(AttendanceRecord {
            id: self.id,
            student_id: StudentId::from_string(self.student_id),
            section: self.section,
            subject: self.subject,
            date,
            status,
            recorded_at,
            source,
            reason: self.reason,
        })
    }
}

/// Record repository — stateless, every method takes `&Connection`.
pub struct RecordRepo;

impl RecordRepo {
    /// Conditionally insert a record, returning whether a row was written.
    ///
    /// `false` means a record already exists for the (student, subject,
    /// date) key; nothing was modified.
    pub fn insert_if_absent(conn: &Connection, record: &AttendanceRecord) -> Result<bool> {
        let changed = conn.execute(
            "INSERT INTO attendance_records
             (id, student_id, section, subject, date, status, recorded_at, source, reason)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT (student_id, subject, date) DO NOTHING",
            params![
                record.id,
                record.student_id.as_str(),
                record.section,
                record.subject,
                record.date.to_string(),
                record.status.as_sql(),
                record.recorded_at.to_rfc3339(),
                record.source.as_sql(),
                record.reason,
            ],
        )?;
        Ok(changed > 0)
    }

    /// Get the record for a logical key.
    pub fn get(
        conn: &Connection,
        student_id: &str,
        subject: &str,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>> {
        let row = conn
            .query_row(
                &format!(
                    "SELECT {RECORD_COLUMNS} FROM attendance_records
                     WHERE student_id = ?1 AND subject = ?2 AND date = ?3"
                ),
                params![student_id, subject, date.to_string()],
                RecordRow::map,
            )
            .optional()?;
        row.map(RecordRow::into_record).transpose()
    }

    /// List a section's records for a date, ordered by `recorded_at`
    /// ascending.
    pub fn list_by_date_and_section(
        conn: &Connection,
        date: NaiveDate,
        section: &str,
    ) -> Result<Vec<AttendanceRecord>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {RECORD_COLUMNS} FROM attendance_records
             WHERE date = ?1 AND section = ?2
             ORDER BY recorded_at ASC"
        ))?;
        let rows = stmt
            .query_map(params![date.to_string(), section], RecordRow::map)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        rows.into_iter().map(RecordRow::into_record).collect()
    }

    /// List all records for a date with a given status.
    pub fn list_by_date_and_status(
        conn: &Connection,
        date: NaiveDate,
        status: AttendanceStatus,
    ) -> Result<Vec<AttendanceRecord>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {RECORD_COLUMNS} FROM attendance_records
             WHERE date = ?1 AND status = ?2
             ORDER BY recorded_at ASC"
        ))?;
        let rows = stmt
            .query_map(params![date.to_string(), status.as_sql()], RecordRow::map)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        rows.into_iter().map(RecordRow::into_record).collect()
    }

    /// Count records for a date.
    pub fn count_by_date(conn: &Connection, date: NaiveDate) -> Result<i64> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM attendance_records WHERE date = ?1",
            params![date.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Replace status and reason for an existing record, stamping the
    /// record as manually sourced. Returns the number of rows changed
    /// (0 when no record exists for the key).
    pub fn update_status(
        conn: &Connection,
        student_id: &str,
        subject: &str,
        date: NaiveDate,
        status: AttendanceStatus,
        reason: Option<&str>,
    ) -> Result<usize> {
        let changed = conn.execute(
            "UPDATE attendance_records
             SET status = ?1, reason = ?2, source = ?3
             WHERE student_id = ?4 AND subject = ?5 AND date = ?6",
            params![
                status.as_sql(),
                reason,
                RecordSource::Manual.as_sql(),
                student_id,
                subject,
                date.to_string(),
            ],
        )?;
        Ok(changed)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
