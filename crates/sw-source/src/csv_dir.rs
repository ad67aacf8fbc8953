//! Directory of raw CSV exports.
//!
//! | File               | Columns                                               | Required |
//! |--------------------|-------------------------------------------------------|----------|
//! | `store_status.csv` | `store_id,status,timestamp_utc`                       | yes      |
//! | `menu_hours.csv`   | `store_id,day,start_time_local,end_time_local`        | no       |
//! | `timezones.csv`    | `store_id,timezone_str`                               | no       |
//!
//! `day` is 0 = Monday .. 6 = Sunday. Columns are matched by header name, so
//! their order in the file does not matter. Everything is loaded up front.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use sw_schemas::{BusinessHoursRule, PollingObservation, StoreId, StoreStatus};
use tracing::info;

use crate::memory::MemoryStoreDataSource;
use crate::{decode_weekday, parse_local_time, parse_timestamp_utc, SourceError, StoreDataSource};

pub const STORE_STATUS_FILE: &str = "store_status.csv";
pub const MENU_HOURS_FILE: &str = "menu_hours.csv";
pub const TIMEZONES_FILE: &str = "timezones.csv";

#[derive(Debug, Deserialize)]
struct StatusRecord {
    store_id: String,
    status: String,
    timestamp_utc: String,
}

#[derive(Debug, Deserialize)]
struct HoursRecord {
    store_id: String,
    day: i64,
    start_time_local: String,
    end_time_local: String,
}

#[derive(Debug, Deserialize)]
struct TimezoneRecord {
    store_id: String,
    timezone_str: String,
}

#[derive(Debug, Clone)]
pub struct CsvDirSource {
    rows: MemoryStoreDataSource,
}

impl CsvDirSource {
    /// Load all three files from `dir`. Optional files may be absent.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, SourceError> {
        let dir = dir.as_ref();
        let status = open_file(&dir.join(STORE_STATUS_FILE))?
            .ok_or_else(|| SourceError::Io(format!("missing {}", dir.join(STORE_STATUS_FILE).display())))?;
        let hours = open_file(&dir.join(MENU_HOURS_FILE))?;
        let timezones = open_file(&dir.join(TIMEZONES_FILE))?;

        let src = Self::from_readers(status, hours, timezones)?;
        info!(
            dir = %dir.display(),
            observations = src.rows.observation_count(),
            "csv source loaded"
        );
        Ok(src)
    }

    pub fn from_readers<R: Read>(
        status: R,
        hours: Option<R>,
        timezones: Option<R>,
    ) -> Result<Self, SourceError> {
        let mut rows = MemoryStoreDataSource::new();

        for (i, rec) in csv::Reader::from_reader(status).deserialize::<StatusRecord>().enumerate() {
            let rec = rec.map_err(|e| csv_error(STORE_STATUS_FILE, i, e))?;
            rows.push_observation(decode_status(i, rec)?);
        }

        if let Some(r) = hours {
            for (i, rec) in csv::Reader::from_reader(r).deserialize::<HoursRecord>().enumerate() {
                let rec = rec.map_err(|e| csv_error(MENU_HOURS_FILE, i, e))?;
                rows.push_hours(decode_hours(i, rec)?);
            }
        }

        if let Some(r) = timezones {
            for (i, rec) in csv::Reader::from_reader(r).deserialize::<TimezoneRecord>().enumerate() {
                let rec = rec.map_err(|e| csv_error(TIMEZONES_FILE, i, e))?;
                rows.set_timezone(rec.store_id.trim(), rec.timezone_str.trim().to_string());
            }
        }

        Ok(Self { rows })
    }
}

fn open_file(path: &Path) -> Result<Option<File>, SourceError> {
    match File::open(path) {
        Ok(f) => Ok(Some(f)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(SourceError::Io(format!("open {}: {e}", path.display()))),
    }
}

fn csv_error(file: &str, row: usize, e: csv::Error) -> SourceError {
    SourceError::Decode(format!("{file} row {}: {e}", row + 1))
}

fn decode_status(row: usize, rec: StatusRecord) -> Result<PollingObservation, SourceError> {
    let status = StoreStatus::parse(&rec.status).ok_or_else(|| {
        SourceError::Decode(format!("{STORE_STATUS_FILE} row {}: bad status '{}'", row + 1, rec.status))
    })?;
    let timestamp_utc = parse_timestamp_utc(&rec.timestamp_utc).ok_or_else(|| {
        SourceError::Decode(format!(
            "{STORE_STATUS_FILE} row {}: bad timestamp '{}'",
            row + 1,
            rec.timestamp_utc
        ))
    })?;
    Ok(PollingObservation {
        store_id: rec.store_id.trim().to_string(),
        timestamp_utc,
        status,
    })
}

fn decode_hours(row: usize, rec: HoursRecord) -> Result<BusinessHoursRule, SourceError> {
    let store_id = rec.store_id.trim().to_string();
    let weekday = decode_weekday(&store_id, rec.day)?;
    let bad_time = |raw: &str| {
        SourceError::Decode(format!("{MENU_HOURS_FILE} row {}: bad time '{raw}'", row + 1))
    };
    let start_time_local = parse_local_time(&rec.start_time_local).ok_or_else(|| bad_time(&rec.start_time_local))?;
    let end_time_local = parse_local_time(&rec.end_time_local).ok_or_else(|| bad_time(&rec.end_time_local))?;
    Ok(BusinessHoursRule {
        store_id,
        weekday,
        start_time_local,
        end_time_local,
    })
}

#[async_trait::async_trait]
impl StoreDataSource for CsvDirSource {
    fn source_name(&self) -> &'static str {
        "csv_dir"
    }

    async fn list_store_ids(&self) -> Result<Vec<StoreId>, SourceError> {
        self.rows.list_store_ids().await
    }

    async fn get_timezone(&self, store_id: &str) -> Result<Option<String>, SourceError> {
        self.rows.get_timezone(store_id).await
    }

    async fn get_business_hours(&self, store_id: &str) -> Result<Vec<BusinessHoursRule>, SourceError> {
        self.rows.get_business_hours(store_id).await
    }

    async fn get_observations(&self, store_id: &str) -> Result<Vec<PollingObservation>, SourceError> {
        self.rows.get_observations(store_id).await
    }
}
