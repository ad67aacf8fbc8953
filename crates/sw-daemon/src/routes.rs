//! Axum router and all HTTP handlers for sw-daemon.
//!
//! `build_router` is the single entry point; `main.rs` calls it and attaches
//! middleware layers, and the scenario tests in `tests/` drive it directly.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use anyhow::Context;
use sw_artifacts::read_report;
use sw_schemas::{JobStatus, StoreReportRow};
use tracing::{error, info};
use uuid::Uuid;

use crate::{
    api_types::{ErrorResponse, HealthResponse, ReportListResponse, ReportResponse, TriggerReportResponse},
    state::AppState,
};

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the complete application router wired to the given shared state.
///
/// Middleware layers (CORS, tracing) are **not** applied here.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/health", get(health))
        .route("/v1/report/trigger", post(trigger_report))
        .route("/v1/report/:report_id", get(get_report))
        .route("/v1/reports", get(list_reports))
        .with_state(state)
}

fn error_response(status: StatusCode, msg: impl Into<String>) -> Response {
    (status, Json(ErrorResponse { error: msg.into() })).into_response()
}

// ---------------------------------------------------------------------------
// GET /v1/health
// ---------------------------------------------------------------------------

pub(crate) async fn health(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            ok: true,
            service: st.build.service.clone(),
            version: st.build.version.clone(),
        }),
    )
}

// ---------------------------------------------------------------------------
// POST /v1/report/trigger
// ---------------------------------------------------------------------------

/// Accepts the request and returns the job id; processing runs in the
/// background.
pub(crate) async fn trigger_report(State(st): State<Arc<AppState>>) -> Response {
    match st.reports.submit_report() {
        Ok(report_id) => {
            info!(job_id = %report_id, "report/trigger");
            (StatusCode::ACCEPTED, Json(TriggerReportResponse { report_id })).into_response()
        }
        Err(err) => {
            error!(error = %format!("{err:#}"), "report/trigger failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, format!("{err:#}"))
        }
    }
}

// ---------------------------------------------------------------------------
// GET /v1/report/:report_id
// ---------------------------------------------------------------------------

pub(crate) async fn get_report(
    State(st): State<Arc<AppState>>,
    Path(report_id): Path<String>,
) -> Response {
    let Ok(id) = Uuid::parse_str(&report_id) else {
        return error_response(StatusCode::BAD_REQUEST, format!("invalid report_id: {report_id}"));
    };
    let Some(snap) = st.reports.get_report(id) else {
        return error_response(StatusCode::NOT_FOUND, format!("report not found: {id}"));
    };

    let mut resp = ReportResponse::from(snap);
    if resp.job_status == JobStatus::Completed {
        if let Some(location) = resp.output_location.clone() {
            match load_rows(PathBuf::from(location)).await {
                Ok(rows) => resp.rows = Some(rows),
                Err(err) => {
                    error!(job_id = %id, error = %format!("{err:#}"), "report/get: artifact unreadable");
                    return error_response(StatusCode::INTERNAL_SERVER_ERROR, format!("{err:#}"));
                }
            }
        }
    }
    (StatusCode::OK, Json(resp)).into_response()
}

async fn load_rows(path: PathBuf) -> anyhow::Result<Vec<StoreReportRow>> {
    tokio::task::spawn_blocking(move || read_report(&path))
        .await
        .context("report read task panicked")?
}

// ---------------------------------------------------------------------------
// GET /v1/reports
// ---------------------------------------------------------------------------

pub(crate) async fn list_reports(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    let reports = st
        .reports
        .registry()
        .list()
        .into_iter()
        .map(ReportResponse::from)
        .collect();
    (StatusCode::OK, Json(ReportListResponse { reports }))
}
