//! Scan-window and school-day time policy.
//!
//! All attendance dates are calendar days in one canonical time zone — a
//! signal's UTC timestamp is normalized through [`DayPolicy::school_day`]
//! before it ever reaches storage. The scan window bounds when a presence
//! signal counts for a day; the cutoff is when the reconciliation sweep for
//! that day may run.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::errors::{CoreError, Result};

/// Time-of-day interval during which a presence signal is valid for a date.
///
/// Bounds are inclusive on both ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanWindow {
    /// First valid local time of day.
    pub start: NaiveTime,
    /// Last valid local time of day.
    pub end: NaiveTime,
}

impl ScanWindow {
    /// Create a window, validating that `start` precedes `end`.
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self> {
        if start >= end {
            return Err(CoreError::InvalidWindow(format!(
                "start {} is not before end {}",
                start.format("%H:%M"),
                end.format("%H:%M")
            )));
        }
        Ok(Self { start, end })
    }

    /// Whether a local time of day falls inside the window (inclusive).
    #[must_use]
    pub fn contains(&self, time: NaiveTime) -> bool {
        time >= self.start && time <= self.end
    }
}

/// Canonical-zone day policy: scan window plus reconciliation cutoff.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayPolicy {
    /// Canonical school time zone.
    pub timezone: Tz,
    /// Scan window for the day.
    pub window: ScanWindow,
    /// Local time of day after which the reconciliation sweep runs.
    pub cutoff: NaiveTime,
}

impl DayPolicy {
    /// Create a policy, validating that the cutoff does not precede the
    /// window end (a sweep before the window closes would mark students
    /// absent while they can still legitimately scan in).
    pub fn new(timezone: Tz, window: ScanWindow, cutoff: NaiveTime) -> Result<Self> {
        if cutoff < window.end {
            return Err(CoreError::InvalidPolicy(format!(
                "cutoff {} precedes scan window end {}",
                cutoff.format("%H:%M"),
                window.end.format("%H:%M")
            )));
        }
        Ok(Self {
            timezone,
            window,
            cutoff,
        })
    }

    /// The school day a timestamp belongs to, in the canonical zone.
    #[must_use]
    pub fn school_day(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.timezone).date_naive()
    }

    /// Local time of day for a timestamp, in the canonical zone.
    #[must_use]
    pub fn local_time(&self, at: DateTime<Utc>) -> NaiveTime {
        at.with_timezone(&self.timezone).time()
    }

    /// Whether a timestamp falls inside the scan window of its own day.
    #[must_use]
    pub fn in_scan_window(&self, at: DateTime<Utc>) -> bool {
        self.window.contains(self.local_time(at))
    }

    /// Reason string stamped on system-written absent records.
    #[must_use]
    pub fn absence_reason(&self) -> String {
        format!(
            "no scan between {} and {}",
            self.window.start.format("%H:%M"),
            self.window.end.format("%H:%M")
        )
    }

    /// The next instant, strictly after `after`, at which the local clock
    /// reads the cutoff time.
    ///
    /// Days whose cutoff falls inside a DST gap are skipped; an ambiguous
    /// cutoff (clock rolled back) resolves to the earlier instant.
    #[must_use]
    pub fn next_cutoff(&self, after: DateTime<Utc>) -> DateTime<Utc> {
        let local = after.with_timezone(&self.timezone);
        let mut day = local.date_naive();
        if local.time() >= self.cutoff {
            day = day.succ_opt().unwrap_or(day);
        }
        for _ in 0..3 {
            if let Some(dt) = self
                .timezone
                .from_local_datetime(&day.and_time(self.cutoff))
                .earliest()
            {
                return dt.with_timezone(&Utc);
            }
            match day.succ_opt() {
                Some(next) => day = next,
                None => break,
            }
        }
        after + Duration::days(1)
    }
}

impl Default for DayPolicy {
    /// 06:00–16:00 scan window, 16:01 cutoff, Asia/Manila.
    fn default() -> Self {
        Self {
            timezone: chrono_tz::Asia::Manila,
            window: ScanWindow {
                start: NaiveTime::from_hms_opt(6, 0, 0).unwrap_or_default(),
                end: NaiveTime::from_hms_opt(16, 0, 0).unwrap_or_default(),
            },
            cutoff: NaiveTime::from_hms_opt(16, 1, 0).unwrap_or_default(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn window_rejects_inverted_bounds() {
        assert!(ScanWindow::new(t(16, 0), t(6, 0)).is_err());
        assert!(ScanWindow::new(t(6, 0), t(6, 0)).is_err());
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let w = ScanWindow::new(t(6, 0), t(16, 0)).unwrap();
        assert!(w.contains(t(6, 0)));
        assert!(w.contains(t(16, 0)));
        assert!(w.contains(t(11, 30)));
        assert!(!w.contains(t(5, 59)));
        assert!(!w.contains(t(16, 1)));
    }

    #[test]
    fn policy_rejects_cutoff_before_window_end() {
        let w = ScanWindow::new(t(6, 0), t(16, 0)).unwrap();
        assert!(DayPolicy::new(chrono_tz::Asia::Manila, w, t(15, 0)).is_err());
        assert!(DayPolicy::new(chrono_tz::Asia::Manila, w, t(16, 0)).is_ok());
    }

    #[test]
    fn school_day_normalizes_across_utc_midnight() {
        let policy = DayPolicy::default();
        // 23:30 UTC on Aug 31 is 07:30 on Sep 1 in Manila (+08:00).
        let at = Utc.with_ymd_and_hms(2025, 8, 31, 23, 30, 0).unwrap();
        assert_eq!(
            policy.school_day(at),
            NaiveDate::from_ymd_opt(2025, 9, 1).unwrap()
        );
        assert!(policy.in_scan_window(at));
    }

    #[test]
    fn signal_outside_window_detected() {
        let policy = DayPolicy::default();
        // 21:00 UTC = 05:00 Manila, before the window opens.
        let at = Utc.with_ymd_and_hms(2025, 8, 31, 21, 0, 0).unwrap();
        assert!(!policy.in_scan_window(at));
    }

    #[test]
    fn absence_reason_names_the_window() {
        let policy = DayPolicy::default();
        assert_eq!(policy.absence_reason(), "no scan between 06:00 and 16:00");
    }

    #[test]
    fn next_cutoff_same_day_before_cutoff() {
        let policy = DayPolicy::default();
        // 00:00 UTC = 08:00 Manila, cutoff 16:01 Manila = 08:01 UTC.
        let after = Utc.with_ymd_and_hms(2025, 9, 1, 0, 0, 0).unwrap();
        let cutoff = policy.next_cutoff(after);
        assert_eq!(cutoff, Utc.with_ymd_and_hms(2025, 9, 1, 8, 1, 0).unwrap());
    }

    #[test]
    fn next_cutoff_rolls_to_next_day_after_cutoff() {
        let policy = DayPolicy::default();
        // 09:00 UTC = 17:00 Manila, past cutoff — next fire is tomorrow.
        let after = Utc.with_ymd_and_hms(2025, 9, 1, 9, 0, 0).unwrap();
        let cutoff = policy.next_cutoff(after);
        assert_eq!(cutoff, Utc.with_ymd_and_hms(2025, 9, 2, 8, 1, 0).unwrap());
    }

    #[test]
    fn next_cutoff_is_strictly_in_the_future() {
        let policy = DayPolicy::default();
        // Exactly at the cutoff instant: next fire is tomorrow, not now.
        let at_cutoff = Utc.with_ymd_and_hms(2025, 9, 1, 8, 1, 0).unwrap();
        let next = policy.next_cutoff(at_cutoff);
        assert!(next > at_cutoff);
        assert_eq!(next, Utc.with_ymd_and_hms(2025, 9, 2, 8, 1, 0).unwrap());
    }

    #[test]
    fn default_policy_is_valid() {
        let policy = DayPolicy::default();
        assert!(DayPolicy::new(policy.timezone, policy.window, policy.cutoff).is_ok());
    }
}
