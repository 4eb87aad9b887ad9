//! Notification dispatch seam.
//!
//! Delivery is best-effort and fire-and-forget from the core's
//! perspective: a dispatch failure never blocks, fails, or rolls back an
//! attendance write, and the core never retries delivery. Reliability is
//! the dispatcher implementation's own concern.

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::debug;

use rollcall_core::AttendanceRecord;

use crate::errors::DispatchError;

/// Receives newly created attendance records for downstream delivery.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    /// Deliver one record notification.
    async fn notify(&self, record: &AttendanceRecord) -> Result<(), DispatchError>;
}

/// Fan-out dispatcher over a `tokio::sync::broadcast` channel.
///
/// Subscribers (e.g. the HTTP layer, a push-delivery worker) attach via
/// [`BroadcastDispatcher::subscribe`]. Having no subscribers is a normal
/// condition, not a delivery failure.
#[derive(Clone, Debug)]
pub struct BroadcastDispatcher {
    tx: broadcast::Sender<AttendanceRecord>,
}

impl BroadcastDispatcher {
    /// Create a dispatcher with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to record notifications.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<AttendanceRecord> {
        self.tx.subscribe()
    }

    /// Current subscriber count.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for BroadcastDispatcher {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl NotificationDispatcher for BroadcastDispatcher {
    async fn notify(&self, record: &AttendanceRecord) -> Result<(), DispatchError> {
        match self.tx.send(record.clone()) {
            Ok(receivers) => {
                debug!(
                    record_id = record.id,
                    receivers, "attendance notification broadcast"
                );
                Ok(())
            }
            // send() only fails when no receiver exists; nothing to deliver
            // to is not a delivery failure.
            Err(_) => Ok(()),
        }
    }
}

/// Dispatcher that drops everything (tests, notification-disabled deploys).
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopDispatcher;

#[async_trait]
impl NotificationDispatcher for NoopDispatcher {
    async fn notify(&self, _record: &AttendanceRecord) -> Result<(), DispatchError> {
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use rollcall_core::{AttendanceStatus, RecordSource, new_record_id};

    fn record() -> AttendanceRecord {
        AttendanceRecord {
            id: new_record_id(),
            student_id: "stu-1".into(),
            section: "10-A".into(),
            subject: "Math".into(),
            date: NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(),
            status: AttendanceStatus::Present,
            recorded_at: Utc.with_ymd_and_hms(2025, 9, 1, 0, 12, 0).unwrap(),
            source: RecordSource::Recognition,
            reason: None,
        }
    }

    #[tokio::test]
    async fn broadcast_reaches_subscribers() {
        let dispatcher = BroadcastDispatcher::new(8);
        let mut rx = dispatcher.subscribe();

        let rec = record();
        dispatcher.notify(&rec).await.unwrap();

        let received = rx.recv().await.unwrap();
        assert_eq!(received.id, rec.id);
    }

    #[tokio::test]
    async fn broadcast_without_subscribers_is_ok() {
        let dispatcher = BroadcastDispatcher::new(8);
        assert_eq!(dispatcher.receiver_count(), 0);
        dispatcher.notify(&record()).await.unwrap();
    }

    #[tokio::test]
    async fn multiple_subscribers_each_receive() {
        let dispatcher = BroadcastDispatcher::new(8);
        let mut rx1 = dispatcher.subscribe();
        let mut rx2 = dispatcher.subscribe();

        dispatcher.notify(&record()).await.unwrap();

        assert!(rx1.recv().await.is_ok());
        assert!(rx2.recv().await.is_ok());
    }

    #[tokio::test]
    async fn noop_accepts_everything() {
        NoopDispatcher.notify(&record()).await.unwrap();
    }
}
