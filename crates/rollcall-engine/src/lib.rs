//! # rollcall-engine
//!
//! The write paths of the attendance system.
//!
//! - **Recorder** ([`AttendanceRecorder`]): turns one externally resolved
//!   presence signal into a ledger write and a notification. Duplicates are
//!   a normal outcome, surfaced with the existing record attached.
//! - **Reconciliation** ([`ReconciliationEngine`]): the end-of-day sweep
//!   that marks every unscanned roster entry absent. Idempotent and safe to
//!   re-run — every write funnels through the ledger's atomic conditional
//!   create, so the scheduler needs no locking.
//! - **Scheduler** ([`CutoffScheduler`]): fires the sweep once per day at
//!   the configured cutoff, with cooperative cancellation.
//! - **Collaborator seams**: [`RosterProvider`] and
//!   [`NotificationDispatcher`] traits for the external roster and the
//!   best-effort notification fan-out.

#![deny(unsafe_code)]

pub mod errors;
pub mod notify;
pub mod reconcile;
pub mod recorder;
pub mod roster;
pub mod scheduler;

pub use errors::{DispatchError, ReconcileError, RecorderError, RosterError};
pub use notify::{BroadcastDispatcher, NoopDispatcher, NotificationDispatcher};
pub use reconcile::{ReconciliationEngine, RunSummary, SweepFailure};
pub use recorder::{AttendanceRecorder, RecordOutcome};
pub use roster::{RosterProvider, StaticRoster};
pub use scheduler::CutoffScheduler;
