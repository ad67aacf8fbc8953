//! sw-schemas
//!
//! Shared data model for the storewatch workspace. Plain data only: no IO,
//! no wall clock, no pipeline logic.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type StoreId = String;

// ---------------------------------------------------------------------------
// Store status
// ---------------------------------------------------------------------------

/// Status reported by a single poll of a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreStatus {
    Active,
    Inactive,
}

impl StoreStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreStatus::Active => "active",
            StoreStatus::Inactive => "inactive",
        }
    }

    /// Case-insensitive parse of the polling table value.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Some(StoreStatus::Active),
            "inactive" => Some(StoreStatus::Inactive),
            _ => None,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, StoreStatus::Active)
    }
}

// ---------------------------------------------------------------------------
// Source rows
// ---------------------------------------------------------------------------

/// One timestamped status sample for a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollingObservation {
    pub store_id: StoreId,
    pub timestamp_utc: DateTime<Utc>,
    pub status: StoreStatus,
}

/// Opening hours of a store for one weekday, in store-local time.
///
/// `weekday` uses 0 = Monday .. 6 = Sunday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessHoursRule {
    pub store_id: StoreId,
    pub weekday: u8,
    pub start_time_local: NaiveTime,
    pub end_time_local: NaiveTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreTimezoneRecord {
    pub store_id: StoreId,
    pub timezone_name: String,
}

// ---------------------------------------------------------------------------
// Derived rows
// ---------------------------------------------------------------------------

/// A polling observation projected into the store's local wall clock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalizedObservation {
    pub observation: PollingObservation,
    pub local_timestamp: NaiveDateTime,
    pub local_date: NaiveDate,
    /// 0 = Monday .. 6 = Sunday.
    pub weekday: u8,
}

impl LocalizedObservation {
    pub fn time_of_day(&self) -> NaiveTime {
        self.local_timestamp.time()
    }

    /// Whole seconds since local midnight; sub-second parts are dropped.
    pub fn seconds_of_day(&self) -> i64 {
        seconds_of_day(self.time_of_day())
    }

    pub fn status(&self) -> StoreStatus {
        self.observation.status
    }
}

/// Wall-clock seconds since midnight for `t`, truncating fractions.
pub fn seconds_of_day(t: NaiveTime) -> i64 {
    i64::from(t.hour()) * 3600 + i64::from(t.minute()) * 60 + i64::from(t.second())
}

/// Uptime/downtime attributed to one store on one local calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayExtrapolationResult {
    pub store_id: StoreId,
    pub weekday: u8,
    pub date: NaiveDate,
    pub uptime_seconds: i64,
    pub downtime_seconds: i64,
    /// Attribution of the final interval of the day only.
    pub uptime_last_hour_seconds: i64,
    pub downtime_last_hour_seconds: i64,
}

/// One output row of the report. Field names double as the CSV header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreReportRow {
    pub store_id: StoreId,
    #[serde(rename = "uptime_last_hour(in minutes)")]
    pub uptime_last_hour_minutes: f64,
    #[serde(rename = "uptime_last_day(in hours)")]
    pub uptime_last_day_hours: f64,
    #[serde(rename = "uptime_last_week(in hours)")]
    pub uptime_last_week_hours: f64,
    #[serde(rename = "downtime_last_hour(in minutes)")]
    pub downtime_last_hour_minutes: f64,
    #[serde(rename = "downtime_last_day(in hours)")]
    pub downtime_last_day_hours: f64,
    #[serde(rename = "downtime_last_week(in hours)")]
    pub downtime_last_week_hours: f64,
}

/// Column order of the report artifact.
pub const REPORT_COLUMNS: [&str; 7] = [
    "store_id",
    "uptime_last_hour(in minutes)",
    "uptime_last_day(in hours)",
    "uptime_last_week(in hours)",
    "downtime_last_hour(in minutes)",
    "downtime_last_day(in hours)",
    "downtime_last_week(in hours)",
];

// ---------------------------------------------------------------------------
// Report jobs
// ---------------------------------------------------------------------------

/// Lifecycle of a report job.
///
/// Received -> SentForProcessing -> Processing -> Completed | Error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Received,
    SentForProcessing,
    Processing,
    Completed,
    Error,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Received => "RECEIVED",
            JobStatus::SentForProcessing => "SENT_FOR_PROCESSING",
            JobStatus::Processing => "PROCESSING",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Error => "ERROR",
        }
    }

    /// Numeric lifecycle code used by the request table.
    pub fn code(&self) -> i16 {
        match self {
            JobStatus::Received => 1,
            JobStatus::SentForProcessing => 2,
            JobStatus::Processing => 3,
            JobStatus::Completed => 4,
            JobStatus::Error => 5,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Error)
    }

    /// Whether `self -> next` is a legal lifecycle step.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Received, JobStatus::SentForProcessing)
                | (JobStatus::SentForProcessing, JobStatus::Processing)
                | (JobStatus::Processing, JobStatus::Completed)
                | (JobStatus::Processing, JobStatus::Error)
                // A job can fail before the pipeline picks it up.
                | (JobStatus::Received, JobStatus::Error)
                | (JobStatus::SentForProcessing, JobStatus::Error)
        )
    }

    pub fn public_status(&self) -> ReportStatus {
        match self {
            JobStatus::Completed => ReportStatus::Complete,
            JobStatus::Error => ReportStatus::Error,
            _ => ReportStatus::Running,
        }
    }
}

/// Coarse status shown to report consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportStatus {
    Running,
    Complete,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportJob {
    pub id: Uuid,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Set only once the job is Completed.
    pub output_location: Option<String>,
}

impl ReportJob {
    pub fn new(id: Uuid, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            status: JobStatus::Received,
            created_at,
            completed_at: None,
            output_location: None,
        }
    }
}
