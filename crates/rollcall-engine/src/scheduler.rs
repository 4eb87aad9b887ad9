//! Daily cutoff scheduler.
//!
//! Sleeps until the next cutoff instant in the policy's time zone, runs the
//! sweep for the day that just closed, and repeats. Because the sweep is
//! idempotent, the scheduler can afford to be simple: a restart after
//! today's cutoff just re-runs today's sweep (catch-up), and an overlapping
//! manual trigger is harmless.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use rollcall_core::DayPolicy;

use crate::reconcile::ReconciliationEngine;

/// Fires the reconciliation sweep once per day at the configured cutoff.
pub struct CutoffScheduler {
    engine: Arc<ReconciliationEngine>,
    policy: DayPolicy,
}

impl CutoffScheduler {
    /// Create a scheduler.
    pub fn new(engine: Arc<ReconciliationEngine>, policy: DayPolicy) -> Self {
        Self { engine, policy }
    }

    /// Run until cancelled.
    ///
    /// If started after today's cutoff, the first sweep fires immediately
    /// (a crashed or restarted process must still close out the day); the
    /// conditional writes make that re-run a no-op when the day is already
    /// complete.
    pub async fn run(&self, cancel: CancellationToken) {
        let now = Utc::now();
        if needs_catch_up(&self.policy, now) {
            let today = self.policy.school_day(now);
            info!(date = %today, "started past cutoff, running catch-up sweep");
            self.sweep(today, &cancel).await;
        }

        loop {
            let now = Utc::now();
            let next = self.policy.next_cutoff(now);
            let delay = (next - now).to_std().unwrap_or_default();
            info!(next = %next, "scheduler sleeping until next cutoff");

            tokio::select! {
                () = cancel.cancelled() => {
                    info!("cutoff scheduler stopping");
                    break;
                }
                () = tokio::time::sleep(delay) => {
                    self.sweep(self.policy.school_day(next), &cancel).await;
                }
            }
        }
    }

    async fn sweep(&self, date: NaiveDate, cancel: &CancellationToken) {
        match self.engine.run(date, cancel).await {
            Ok(summary) => info!(
                date = %date,
                processed = summary.processed,
                marked_absent = summary.marked_absent,
                failures = summary.failure_count(),
                "scheduled sweep finished"
            ),
            Err(err) => warn!(
                date = %date,
                error = %err,
                "scheduled sweep failed; next cutoff will retry"
            ),
        }
    }
}

/// Whether the local clock is already past today's cutoff.
fn needs_catch_up(policy: &DayPolicy, now: DateTime<Utc>) -> bool {
    policy.local_time(now) >= policy.cutoff
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rollcall_ledger::AttendanceLedger;

    use crate::notify::NoopDispatcher;
    use crate::roster::StaticRoster;

    fn scheduler() -> CutoffScheduler {
        let engine = ReconciliationEngine::new(
            AttendanceLedger::open_in_memory().unwrap(),
            DayPolicy::default(),
            Arc::new(StaticRoster::default()),
            Arc::new(NoopDispatcher),
        );
        CutoffScheduler::new(Arc::new(engine), DayPolicy::default())
    }

    #[test]
    fn catch_up_when_past_cutoff() {
        let policy = DayPolicy::default();
        // 09:00 UTC = 17:00 Manila, past the 16:01 cutoff.
        let evening = Utc.with_ymd_and_hms(2025, 9, 1, 9, 0, 0).unwrap();
        assert!(needs_catch_up(&policy, evening));
    }

    #[test]
    fn no_catch_up_during_the_school_day() {
        let policy = DayPolicy::default();
        // 02:00 UTC = 10:00 Manila, mid-window.
        let morning = Utc.with_ymd_and_hms(2025, 9, 1, 2, 0, 0).unwrap();
        assert!(!needs_catch_up(&policy, morning));
    }

    #[tokio::test]
    async fn cancellation_stops_the_loop() {
        let scheduler = scheduler();
        let cancel = CancellationToken::new();
        cancel.cancel();

        // Must return promptly instead of sleeping toward the next cutoff.
        tokio::time::timeout(std::time::Duration::from_secs(5), scheduler.run(cancel))
            .await
            .expect("scheduler did not honor cancellation");
    }
}
