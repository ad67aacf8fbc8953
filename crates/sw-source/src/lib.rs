//! Data-access boundary for the report pipeline.
//!
//! The engine only ever sees [`StoreDataSource`]. Concrete sources:
//! - [`HttpStoreDataSource`]: the store data-access service over HTTP
//! - [`CsvDirSource`]: a directory holding the raw CSV exports
//! - [`MemoryStoreDataSource`]: in-process rows, for tests and embedding
//!
//! Any of them can be wrapped in [`RetryingSource`] for per-call timeouts
//! and bounded exponential backoff.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, NaiveTime, Utc};
use sw_schemas::{BusinessHoursRule, PollingObservation, StoreId};

mod csv_dir;
mod http;
mod memory;
mod retry;

pub use csv_dir::{CsvDirSource, MENU_HOURS_FILE, STORE_STATUS_FILE, TIMEZONES_FILE};
pub use http::HttpStoreDataSource;
pub use memory::MemoryStoreDataSource;
pub use retry::{RetryPolicy, RetryingSource};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Network failure or a 5xx from upstream.
    #[error("transport error: {0}")]
    Transport(String),
    #[error("{op} timed out after {timeout_ms}ms")]
    Timeout { op: &'static str, timeout_ms: u64 },
    /// Upstream answered, but with an application-level failure.
    #[error("source api error code={code:?}: {message}")]
    Api { code: Option<i64>, message: String },
    #[error("decode error: {0}")]
    Decode(String),
    #[error("io error: {0}")]
    Io(String),
}

impl SourceError {
    /// Whether another attempt could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, SourceError::Transport(_) | SourceError::Timeout { .. })
    }
}

// ---------------------------------------------------------------------------
// Source trait
// ---------------------------------------------------------------------------

/// The four reads the report pipeline needs.
///
/// "Not found" is never an error: a store without a timezone record yields
/// `Ok(None)`, one without hours or polls yields an empty `Vec`.
#[async_trait::async_trait]
pub trait StoreDataSource: Send + Sync {
    fn source_name(&self) -> &'static str;

    async fn list_store_ids(&self) -> Result<Vec<StoreId>, SourceError>;

    async fn get_timezone(&self, store_id: &str) -> Result<Option<String>, SourceError>;

    /// Rules in source order; the first rule for a weekday wins downstream.
    async fn get_business_hours(&self, store_id: &str) -> Result<Vec<BusinessHoursRule>, SourceError>;

    async fn get_observations(&self, store_id: &str) -> Result<Vec<PollingObservation>, SourceError>;
}

// ---------------------------------------------------------------------------
// Source selection
// ---------------------------------------------------------------------------

/// Where a report run reads its rows from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSpec {
    CsvDir(PathBuf),
    Http { base_url: String, order_by: String },
}

impl SourceSpec {
    /// Open the source. Network sources get wrapped in [`RetryingSource`];
    /// a CSV directory is read once, up front, and has nothing to retry.
    pub fn open(&self, policy: RetryPolicy) -> Result<Arc<dyn StoreDataSource>, SourceError> {
        match self {
            SourceSpec::CsvDir(dir) => Ok(Arc::new(CsvDirSource::open(dir)?)),
            SourceSpec::Http { base_url, order_by } => Ok(Arc::new(RetryingSource::new(
                HttpStoreDataSource::new_with_order(base_url.clone(), order_by.clone()),
                policy,
            ))),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            SourceSpec::CsvDir(dir) => format!("csv:{}", dir.display()),
            SourceSpec::Http { base_url, .. } => format!("http:{base_url}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Shared decoding helpers
// ---------------------------------------------------------------------------

/// Parse a poll timestamp.
///
/// Accepts RFC 3339, the raw export form `2023-01-22 12:09:39.388884 UTC`,
/// and naive ISO datetimes (taken as UTC).
pub fn parse_timestamp_utc(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    let naive = s.strip_suffix("UTC").map(str::trim_end).unwrap_or(s);
    NaiveDateTime::parse_from_str(naive, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(naive, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
        .map(|n| n.and_utc())
}

/// Parse a local wall-clock time such as `09:00:00` or `09:00`.
pub fn parse_local_time(raw: &str) -> Option<NaiveTime> {
    let s = raw.trim();
    NaiveTime::parse_from_str(s, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .ok()
}

pub(crate) fn decode_weekday(store_id: &str, day: i64) -> Result<u8, SourceError> {
    u8::try_from(day)
        .ok()
        .filter(|d| *d <= 6)
        .ok_or_else(|| SourceError::Decode(format!("store {store_id}: weekday {day} out of range 0..=6")))
}
