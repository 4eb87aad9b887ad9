//! `RollcallServer` — Axum HTTP ingress.
//!
//! Maps the domain outcomes onto HTTP: a duplicate signal is `409` with
//! the existing record attached ("already recorded today"), an invalid
//! signal is `400`, a missing override key is `404`, and a retryable
//! storage fault is `503` so clients drive the retry themselves.

use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use rollcall_core::{AttendanceStatus, PresenceSignal, StudentId};
use rollcall_engine::{
    AttendanceRecorder, BroadcastDispatcher, ReconcileError, ReconciliationEngine, RecordOutcome,
    RecorderError,
};
use rollcall_ledger::{AttendanceLedger, LedgerError};

use crate::config::ServerConfig;
use crate::health;
use crate::shutdown::ShutdownCoordinator;

/// Shared state accessible from Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Signal write path.
    pub recorder: Arc<AttendanceRecorder>,
    /// Sweep engine (manual trigger).
    pub engine: Arc<ReconciliationEngine>,
    /// Ledger for reads and overrides.
    pub ledger: AttendanceLedger,
    /// Notification fan-out.
    pub broadcast: Arc<BroadcastDispatcher>,
    /// Shutdown coordinator.
    pub shutdown: Arc<ShutdownCoordinator>,
    /// When the server started.
    pub start_time: Instant,
}

/// The main Rollcall HTTP server.
pub struct RollcallServer {
    config: ServerConfig,
    state: AppState,
}

impl RollcallServer {
    /// Create a new server over the assembled components.
    pub fn new(
        config: ServerConfig,
        recorder: Arc<AttendanceRecorder>,
        engine: Arc<ReconciliationEngine>,
        ledger: AttendanceLedger,
        broadcast: Arc<BroadcastDispatcher>,
    ) -> Self {
        Self {
            config,
            state: AppState {
                recorder,
                engine,
                ledger,
                broadcast,
                shutdown: Arc::new(ShutdownCoordinator::new()),
                start_time: Instant::now(),
            },
        }
    }

    /// Build the Axum router with all routes.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(health_handler))
            .route("/api/signals", post(signal_handler))
            .route("/api/signals/manual", post(manual_signal_handler))
            .route("/api/override", post(override_handler))
            .route("/api/attendance", get(report_handler))
            .route("/api/reconcile/run", post(reconcile_handler))
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .with_state(self.state.clone())
    }

    /// Bind and serve until the token is cancelled.
    pub async fn serve(&self, cancel: CancellationToken) -> std::io::Result<()> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        info!(addr = %listener.local_addr()?, "rollcall server listening");
        axum::serve(listener, self.router())
            .with_graceful_shutdown(cancel.cancelled_owned())
            .await
    }

    /// Get the shutdown coordinator.
    pub fn shutdown(&self) -> &Arc<ShutdownCoordinator> {
        &self.state.shutdown
    }

    /// Get the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// GET /health
async fn health_handler(State(state): State<AppState>) -> Response {
    match state.ledger.schema_version() {
        Ok(version) => Json(health::health_check(state.start_time, version)).into_response(),
        Err(err) => error_response(StatusCode::SERVICE_UNAVAILABLE, &err.to_string()),
    }
}

/// POST /api/signals — recognition-sourced presence intake.
async fn signal_handler(
    State(state): State<AppState>,
    Json(signal): Json<PresenceSignal>,
) -> Response {
    signal_response(state.recorder.record(&signal).await)
}

/// POST /api/signals/manual — teacher-entered presence intake.
async fn manual_signal_handler(
    State(state): State<AppState>,
    Json(signal): Json<PresenceSignal>,
) -> Response {
    signal_response(state.recorder.record_manual(&signal).await)
}

fn signal_response(result: Result<RecordOutcome, RecorderError>) -> Response {
    match result {
        Ok(RecordOutcome::Recorded(record)) => (
            StatusCode::CREATED,
            Json(json!({"outcome": "recorded", "record": record})),
        )
            .into_response(),
        Ok(RecordOutcome::Duplicate(existing)) => (
            StatusCode::CONFLICT,
            Json(json!({
                "outcome": "duplicate",
                "message": "already recorded today",
                "record": existing,
            })),
        )
            .into_response(),
        Err(RecorderError::InvalidSignal(msg)) => error_response(StatusCode::BAD_REQUEST, &msg),
        Err(RecorderError::Storage(err)) => ledger_error_response(&err),
    }
}

/// Teacher override request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OverrideRequest {
    student_id: StudentId,
    subject: String,
    date: NaiveDate,
    new_status: AttendanceStatus,
    reason: Option<String>,
}

/// POST /api/override
async fn override_handler(
    State(state): State<AppState>,
    Json(req): Json<OverrideRequest>,
) -> Response {
    match state.ledger.override_status(
        req.student_id.as_str(),
        &req.subject,
        req.date,
        req.new_status,
        req.reason.as_deref(),
    ) {
        Ok(record) => Json(record).into_response(),
        Err(err) => ledger_error_response(&err),
    }
}

/// Report query: one section, one day.
#[derive(Debug, Deserialize)]
struct ReportQuery {
    date: NaiveDate,
    section: String,
}

/// GET /api/attendance?date=YYYY-MM-DD&section=10-A
async fn report_handler(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Response {
    match state
        .ledger
        .find_by_date_and_section(query.date, &query.section)
    {
        Ok(records) => Json(records).into_response(),
        Err(err) => ledger_error_response(&err),
    }
}

/// Sweep trigger query; defaults to the current school day.
#[derive(Debug, Default, Deserialize)]
struct SweepQuery {
    date: Option<NaiveDate>,
}

/// POST /api/reconcile/run
async fn reconcile_handler(
    State(state): State<AppState>,
    Query(query): Query<SweepQuery>,
) -> Response {
    let date = query.date.unwrap_or_else(|| state.engine.today());
    match state.engine.run(date, &state.shutdown.token()).await {
        Ok(summary) => Json(summary).into_response(),
        Err(ReconcileError::Roster(err)) => {
            error_response(StatusCode::SERVICE_UNAVAILABLE, &err.to_string())
        }
    }
}

fn ledger_error_response(err: &LedgerError) -> Response {
    match err {
        LedgerError::RecordNotFound(_) => error_response(StatusCode::NOT_FOUND, &err.to_string()),
        LedgerError::InvalidRecord(_) => error_response(StatusCode::BAD_REQUEST, &err.to_string()),
        _ if err.is_retryable() => {
            error_response(StatusCode::SERVICE_UNAVAILABLE, &err.to_string())
        }
        _ => error_response(StatusCode::INTERNAL_SERVER_ERROR, &err.to_string()),
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({"error": message}))).into_response()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
