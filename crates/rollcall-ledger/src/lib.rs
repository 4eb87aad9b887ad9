//! # rollcall-ledger
//!
//! Durable, uniqueness-enforcing store for attendance records.
//!
//! The ledger is the only component permitted to write attendance state.
//! Its central guarantee: at most one record exists per
//! (`student_id`, `subject`, `date`), enforced by a `UNIQUE` index and an
//! atomic conditional insert — never by check-then-insert.
//!
//! - **Connection pool**: `r2d2` over `rusqlite` with WAL mode and
//!   per-connection pragmas
//! - **Migrations**: version-tracked, transactional, idempotent
//! - **Repository**: stateless SQL layer, every method takes `&Connection`
//! - **Facade**: [`AttendanceLedger`] — `try_create`, `find`,
//!   `find_by_date_and_section`, `override_status`, reporting helpers

#![deny(unsafe_code)]

pub mod connection;
pub mod errors;
pub mod ledger;
pub mod migrations;
pub mod repository;

pub use connection::{ConnectionConfig, ConnectionPool, PooledConnection};
pub use errors::{LedgerError, Result};
pub use ledger::{AttendanceLedger, CreateOutcome};
