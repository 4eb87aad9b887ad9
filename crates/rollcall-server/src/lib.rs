//! # rollcall-server
//!
//! Axum HTTP ingress for the Rollcall attendance service.
//!
//! - `POST /api/signals` — presence signal intake (recognition clients)
//! - `POST /api/signals/manual` — teacher-entered presence
//! - `POST /api/override` — teacher override of an existing record
//! - `GET /api/attendance` — per-section day report
//! - `POST /api/reconcile/run` — manual sweep trigger
//! - `GET /health` — liveness, uptime, schema version
//!
//! Graceful shutdown via `tokio::signal` + `CancellationToken`.

#![deny(unsafe_code)]

pub mod config;
pub mod health;
pub mod server;
pub mod shutdown;

pub use config::ServerConfig;
pub use server::{AppState, RollcallServer};
pub use shutdown::ShutdownCoordinator;
