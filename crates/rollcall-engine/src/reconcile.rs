//! Reconciliation engine — the end-of-day "mark absent" sweep.
//!
//! For every roster entry lacking a qualifying presence record, write an
//! `absent` record through the ledger's atomic conditional create. Losing
//! a race against a late-arriving signal is an expected outcome, not a
//! fault; re-running a finished or interrupted sweep produces the same
//! final ledger state. Correctness lives entirely in the ledger's per-key
//! atomic write — the sweep holds no locks and needs none.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use rollcall_core::{
    AttendanceRecord, AttendanceStatus, DayPolicy, Enrollment, RecordSource, StudentId,
    new_record_id,
};
use rollcall_ledger::{AttendanceLedger, CreateOutcome, LedgerError};

use crate::errors::ReconcileError;
use crate::notify::NotificationDispatcher;
use crate::roster::RosterProvider;

/// One roster entry the sweep could not resolve.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepFailure {
    /// Student whose entry failed.
    pub student_id: StudentId,
    /// Section of the failed entry.
    pub section: String,
    /// Subject of the failed entry.
    pub subject: String,
    /// Rendered ledger error.
    pub error: String,
}

/// Run-scoped summary of one reconciliation sweep.
///
/// Returned to the caller instead of accumulating in process-global state,
/// so overlapping runs cannot contaminate each other's counts.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    /// Day the sweep closed out.
    pub date: NaiveDate,
    /// Roster entries examined.
    pub processed: usize,
    /// Absent records newly written by this run.
    pub marked_absent: usize,
    /// Entries skipped on the fast path: a `present` record inside the
    /// scan window.
    pub already_present: usize,
    /// Entries that already had some record for the key (late arrivals,
    /// out-of-window presents, or a concurrent writer winning the race).
    pub already_resolved: usize,
    /// Entries that failed; the sweep continued past each.
    pub failures: Vec<SweepFailure>,
    /// Whether the run was cancelled before exhausting the roster.
    pub cancelled: bool,
}

impl RunSummary {
    fn new(date: NaiveDate) -> Self {
        Self {
            date,
            processed: 0,
            marked_absent: 0,
            already_present: 0,
            already_resolved: 0,
            failures: Vec::new(),
            cancelled: false,
        }
    }

    /// Number of failed entries.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }
}

/// How one roster entry resolved.
enum EntryOutcome {
    MarkedAbsent(AttendanceRecord),
    AlreadyPresent,
    AlreadyResolved,
}

/// The scheduled sweep that guarantees every roster entry one terminal
/// record per day.
pub struct ReconciliationEngine {
    ledger: AttendanceLedger,
    policy: DayPolicy,
    roster: Arc<dyn RosterProvider>,
    dispatcher: Arc<dyn NotificationDispatcher>,
}

impl ReconciliationEngine {
    /// Create an engine.
    pub fn new(
        ledger: AttendanceLedger,
        policy: DayPolicy,
        roster: Arc<dyn RosterProvider>,
        dispatcher: Arc<dyn NotificationDispatcher>,
    ) -> Self {
        Self {
            ledger,
            policy,
            roster,
            dispatcher,
        }
    }

    /// The current school day under this engine's policy.
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.policy.school_day(Utc::now())
    }

    /// Sweep the current school day.
    pub async fn run_today(&self, cancel: &CancellationToken) -> Result<RunSummary, ReconcileError> {
        self.run(self.today(), cancel).await
    }

    /// Sweep `date`: mark every unscanned roster entry absent.
    ///
    /// A roster failure aborts before any write. Per-entry ledger failures
    /// are accumulated in the summary and never abort the run. Cancellation
    /// is honored between entries; entries not yet examined stay unscanned
    /// for a later (idempotent) re-run.
    pub async fn run(
        &self,
        date: NaiveDate,
        cancel: &CancellationToken,
    ) -> Result<RunSummary, ReconcileError> {
        let enrollments = self.roster.active_enrollments(date).await?;
        info!(
            date = %date,
            entries = enrollments.len(),
            "reconciliation sweep starting"
        );

        let mut summary = RunSummary::new(date);

        for enrollment in &enrollments {
            if cancel.is_cancelled() {
                summary.cancelled = true;
                warn!(
                    date = %date,
                    processed = summary.processed,
                    remaining = enrollments.len() - summary.processed,
                    "sweep cancelled; remaining entries left for the next run"
                );
                break;
            }

            summary.processed += 1;
            match self.reconcile_entry(enrollment, date) {
                Ok(EntryOutcome::MarkedAbsent(record)) => {
                    summary.marked_absent += 1;
                    if let Err(err) = self.dispatcher.notify(&record).await {
                        warn!(
                            record_id = record.id,
                            error = %err,
                            "notification dispatch failed for absent record"
                        );
                    }
                }
                Ok(EntryOutcome::AlreadyPresent) => summary.already_present += 1,
                Ok(EntryOutcome::AlreadyResolved) => summary.already_resolved += 1,
                Err(err) => {
                    warn!(
                        student = enrollment.student_id.as_str(),
                        subject = enrollment.subject,
                        error = %err,
                        "sweep entry failed, continuing with remaining roster"
                    );
                    summary.failures.push(SweepFailure {
                        student_id: enrollment.student_id.clone(),
                        section: enrollment.section.clone(),
                        subject: enrollment.subject.clone(),
                        error: err.to_string(),
                    });
                }
            }
        }

        info!(
            date = %date,
            processed = summary.processed,
            marked_absent = summary.marked_absent,
            already_present = summary.already_present,
            already_resolved = summary.already_resolved,
            failures = summary.failure_count(),
            cancelled = summary.cancelled,
            "reconciliation sweep finished"
        );
        Ok(summary)
    }

    fn reconcile_entry(
        &self,
        enrollment: &Enrollment,
        date: NaiveDate,
    ) -> Result<EntryOutcome, LedgerError> {
        if let Some(existing) = self.ledger.find(
            enrollment.student_id.as_str(),
            &enrollment.subject,
            date,
        )? {
            if existing.status == AttendanceStatus::Present
                && self.policy.in_scan_window(existing.recorded_at)
            {
                return Ok(EntryOutcome::AlreadyPresent);
            }
            // Some other record holds the key (late, out-of-window present,
            // absent from an earlier partial run). try_create below settles
            // it without a second read.
        }

        let record = AttendanceRecord {
            id: new_record_id(),
            student_id: enrollment.student_id.clone(),
            section: enrollment.section.clone(),
            subject: enrollment.subject.clone(),
            date,
            status: AttendanceStatus::Absent,
            recorded_at: Utc::now(),
            source: RecordSource::System,
            reason: Some(self.policy.absence_reason()),
        };

        match self.ledger.try_create(&record)? {
            CreateOutcome::Created(created) => Ok(EntryOutcome::MarkedAbsent(created)),
            CreateOutcome::Exists(_) => Ok(EntryOutcome::AlreadyResolved),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
