//! Request and response types for all sw-daemon HTTP endpoints.
//!
//! These types are `Serialize + Deserialize` so they can be JSON-encoded
//! by Axum and decoded by tests. No business logic lives here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sw_report::{JobProgress, JobSnapshot};
use sw_schemas::{JobStatus, ReportStatus, StoreReportRow};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// /v1/health
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub service: String,
    pub version: String,
}

// ---------------------------------------------------------------------------
// /v1/report/trigger
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerReportResponse {
    pub report_id: Uuid,
}

// ---------------------------------------------------------------------------
// /v1/report/:report_id  /v1/reports
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportResponse {
    pub report_id: Uuid,
    /// Running | Complete | Error
    pub status: ReportStatus,
    pub job_status: JobStatus,
    /// Numeric lifecycle code, 1..=5.
    pub job_status_code: i16,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub progress: JobProgress,
    /// Present only once Complete.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_location: Option<String>,
    /// Report rows, filled in by `GET /v1/report/:report_id` once Complete.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows: Option<Vec<StoreReportRow>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<JobSnapshot> for ReportResponse {
    fn from(s: JobSnapshot) -> Self {
        Self {
            report_id: s.job.id,
            status: s.job.status.public_status(),
            job_status: s.job.status,
            job_status_code: s.job.status.code(),
            created_at: s.job.created_at,
            completed_at: s.job.completed_at,
            progress: s.progress,
            output_location: s.job.output_location,
            rows: None,
            error: s.error,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportListResponse {
    pub reports: Vec<ReportResponse>,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
