//! # rollcall-core
//!
//! Foundation types and shared vocabulary for the Rollcall attendance system.
//!
//! This crate provides what every other Rollcall crate depends on:
//!
//! - **Attendance vocabulary**: [`AttendanceRecord`], [`AttendanceStatus`],
//!   [`RecordSource`] — the single entity the system stores, plus its
//!   provenance and terminal-status enums
//! - **Signals**: [`PresenceSignal`] with a typed [`PresenceStatus`] so an
//!   `absent` value can never be submitted as a live signal
//! - **Roster vocabulary**: [`Enrollment`] as returned by roster providers
//! - **Branded IDs**: [`StudentId`] newtype and prefixed record IDs
//! - **Time policy**: [`ScanWindow`] and [`DayPolicy`] — school-day
//!   normalization in a canonical time zone, window containment, cutoff math
//! - **Errors**: [`CoreError`] via `thiserror`

#![deny(unsafe_code)]

pub mod errors;
pub mod ids;
pub mod policy;
pub mod types;

pub use errors::{CoreError, Result};
pub use ids::{StudentId, new_record_id};
pub use policy::{DayPolicy, ScanWindow};
pub use types::{
    AttendanceRecord, AttendanceStatus, Enrollment, PresenceSignal, PresenceStatus, RecordSource,
};
