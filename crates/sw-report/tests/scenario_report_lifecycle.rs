//! Report job lifecycle end to end over an in-memory source.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveTime, Utc};
use sw_report::{JobRegistry, OrchestratorSettings, ReportOrchestrator, ReportService};
use sw_schemas::{BusinessHoursRule, JobStatus, PollingObservation, StoreStatus, StoreTimezoneRecord};
use sw_source::{MemoryStoreDataSource, StoreDataSource};
use sw_uptime::TimezoneResolver;

fn poll(store: &str, ts: &str, status: StoreStatus) -> PollingObservation {
    PollingObservation {
        store_id: store.to_string(),
        timestamp_utc: ts.parse::<DateTime<Utc>>().unwrap(),
        status,
    }
}

fn source() -> MemoryStoreDataSource {
    MemoryStoreDataSource::from_rows(
        vec![
            // "b": 24x7 in UTC.
            poll("b", "2023-01-23T08:00:00Z", StoreStatus::Inactive),
            poll("b", "2023-01-23T10:00:00Z", StoreStatus::Active),
            // "a": business hours in Chicago; 18:00Z is 12:00 local.
            poll("a", "2023-01-23T18:00:00Z", StoreStatus::Active),
        ],
        vec![BusinessHoursRule {
            store_id: "a".to_string(),
            weekday: 0,
            start_time_local: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time_local: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
        }],
        vec![
            StoreTimezoneRecord {
                store_id: "a".to_string(),
                timezone_name: "America/Chicago".to_string(),
            },
            StoreTimezoneRecord {
                store_id: "b".to_string(),
                timezone_name: "UTC".to_string(),
            },
        ],
    )
}

fn settings(dir: &Path) -> OrchestratorSettings {
    OrchestratorSettings {
        resolver: TimezoneResolver::default(),
        concurrency: 4,
        output_dir: dir.to_path_buf(),
        config_hash: "test".to_string(),
    }
}

#[tokio::test]
async fn run_report_completes_with_sorted_rows() {
    let tmp = tempfile::tempdir().unwrap();
    let svc = ReportService::new(Arc::new(source()), settings(tmp.path()));

    let outcome = svc.run_report().await.unwrap();
    assert_eq!(outcome.stores_seen, 2);
    assert_eq!(outcome.rows_written, 2);

    let snap = svc.get_report(outcome.job_id).unwrap();
    assert_eq!(snap.job.status, JobStatus::Completed);
    assert_eq!(
        snap.job.output_location.as_deref(),
        Some(outcome.report_path.display().to_string().as_str())
    );
    assert_eq!(snap.progress.processed, 2);
    assert_eq!(snap.progress.total, 2);

    let rows = sw_artifacts::read_report(&outcome.report_path).unwrap();
    assert_eq!(rows[0].store_id, "a");
    assert_eq!(rows[0].uptime_last_day_hours, 3.0);
    assert_eq!(rows[1].store_id, "b");
    assert_eq!(rows[1].downtime_last_day_hours, 8.0);
    assert_eq!(rows[1].uptime_last_day_hours, 2.0);
}

#[tokio::test]
async fn submit_returns_immediately_and_finishes_in_background() {
    let tmp = tempfile::tempdir().unwrap();
    let svc = ReportService::new(Arc::new(source()), settings(tmp.path()));

    let job_id = svc.submit_report().unwrap();
    assert!(svc.get_report(job_id).is_some());

    let mut status = JobStatus::Received;
    for _ in 0..200 {
        status = svc.get_report(job_id).unwrap().job.status;
        if status.is_terminal() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(status, JobStatus::Completed);
    assert!(tmp.path().join(format!("{job_id}.csv")).exists());
}

#[tokio::test]
async fn store_with_no_usable_polls_is_omitted() {
    let tmp = tempfile::tempdir().unwrap();
    let mut src = source();
    // Only poll falls outside Monday 09:00-17:00.
    src.push_observation(poll("c", "2023-01-23T03:00:00Z", StoreStatus::Active));
    src.push_hours(BusinessHoursRule {
        store_id: "c".to_string(),
        weekday: 0,
        start_time_local: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        end_time_local: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
    });

    let svc = ReportService::new(Arc::new(src), settings(tmp.path()));
    let outcome = svc.run_report().await.unwrap();

    assert_eq!(outcome.stores_seen, 3);
    assert_eq!(outcome.rows_written, 2);
    let rows = sw_artifacts::read_report(&outcome.report_path).unwrap();
    assert!(rows.iter().all(|r| r.store_id != "c"));
}

#[tokio::test]
async fn orchestrator_refuses_job_not_sent_for_processing() {
    let tmp = tempfile::tempdir().unwrap();
    let registry = JobRegistry::new();
    let source: Arc<dyn StoreDataSource> = Arc::new(source());
    let orch = ReportOrchestrator::new(source, Arc::new(registry.clone()), settings(tmp.path()));

    let job = registry.create();
    assert!(orch.run(job.id).await.is_err());
    assert_eq!(registry.status(job.id), Some(JobStatus::Received));
    assert!(!tmp.path().join(format!("{}.csv", job.id)).exists());
}

#[tokio::test]
async fn rerun_produces_identical_rows() {
    let tmp = tempfile::tempdir().unwrap();
    let svc = ReportService::new(Arc::new(source()), settings(tmp.path()));

    let a = svc.run_report().await.unwrap();
    let b = svc.run_report().await.unwrap();
    assert_ne!(a.job_id, b.job_id);
    assert_eq!(
        sw_artifacts::read_report(&a.report_path).unwrap(),
        sw_artifacts::read_report(&b.report_path).unwrap()
    );
}
