use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use futures_util::stream::{self, StreamExt};
use sw_artifacts::{write_report, WriteReportArgs};
use sw_config::PipelineConfig;
use sw_schemas::StoreReportRow;
use sw_source::{SourceError, StoreDataSource};
use sw_uptime::{compute_store_row, TimezoneResolver};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::lifecycle::JobLifecycle;

#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub resolver: TimezoneResolver,
    /// Stores processed at once. Zero is treated as one.
    pub concurrency: usize,
    pub output_dir: PathBuf,
    /// Recorded in the artifact manifest.
    pub config_hash: String,
}

impl OrchestratorSettings {
    pub fn from_config(cfg: &PipelineConfig, config_hash: impl Into<String>) -> Result<Self> {
        Ok(Self {
            resolver: cfg.timezone_resolver()?,
            concurrency: cfg.concurrency,
            output_dir: cfg.output_dir.clone(),
            config_hash: config_hash.into(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportOutcome {
    pub job_id: Uuid,
    pub report_path: PathBuf,
    pub stores_seen: usize,
    pub rows_written: usize,
    pub elapsed_ms: u64,
}

/// Run the per-store pipeline for one store.
///
/// `Ok(None)` means the store has nothing to report and is left out.
pub async fn process_store(
    source: &dyn StoreDataSource,
    resolver: &TimezoneResolver,
    store_id: &str,
) -> Result<Option<StoreReportRow>, SourceError> {
    let started = Instant::now();

    let tz_name = source.get_timezone(store_id).await?;
    let tz = resolver.resolve(store_id, tz_name.as_deref());
    let hours = source.get_business_hours(store_id).await?;
    let observations = source.get_observations(store_id).await?;

    let row = compute_store_row(store_id, tz, &hours, &observations);

    debug!(
        store_id = %store_id,
        timezone = tz.name(),
        rules = hours.len(),
        polls = observations.len(),
        has_row = row.is_some(),
        elapsed_ms = elapsed_ms(started),
        "store processed"
    );
    Ok(row)
}

pub struct ReportOrchestrator {
    source: Arc<dyn StoreDataSource>,
    lifecycle: Arc<dyn JobLifecycle>,
    settings: OrchestratorSettings,
}

impl ReportOrchestrator {
    pub fn new(
        source: Arc<dyn StoreDataSource>,
        lifecycle: Arc<dyn JobLifecycle>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            source,
            lifecycle,
            settings,
        }
    }

    /// Take a job from `SentForProcessing` to `Completed` or `Error`.
    ///
    /// Any store failure aborts the whole run; no artifact is written and
    /// the job ends in `Error`.
    pub async fn run(&self, job_id: Uuid) -> Result<ReportOutcome> {
        self.lifecycle
            .on_job_start(job_id)
            .with_context(|| format!("start job {job_id}"))?;
        info!(job_id = %job_id, source = self.source.source_name(), "report processing started");

        let started = Instant::now();
        match self.execute(job_id, started).await {
            Ok(outcome) => {
                let location = outcome.report_path.display().to_string();
                self.lifecycle
                    .on_job_complete(job_id, &location)
                    .with_context(|| format!("complete job {job_id}"))?;
                info!(
                    job_id = %job_id,
                    stores = outcome.stores_seen,
                    rows = outcome.rows_written,
                    elapsed_ms = outcome.elapsed_ms,
                    report = %location,
                    "report completed"
                );
                Ok(outcome)
            }
            Err(err) => {
                error!(job_id = %job_id, elapsed_ms = elapsed_ms(started), error = %format!("{err:#}"), "report failed");
                if let Err(e) = self.lifecycle.on_job_error(job_id, &format!("{err:#}")) {
                    error!(job_id = %job_id, error = %e, "could not record job error");
                }
                Err(err)
            }
        }
    }

    async fn execute(&self, job_id: Uuid, started: Instant) -> Result<ReportOutcome> {
        let ComputedRows { stores_seen, rows } = self.compute_rows(job_id).await?;
        let rows_written = rows.len();

        let output_dir = self.settings.output_dir.clone();
        let config_hash = self.settings.config_hash.clone();
        let written = tokio::task::spawn_blocking(move || {
            write_report(WriteReportArgs {
                output_dir: &output_dir,
                job_id,
                config_hash: &config_hash,
                rows: &rows,
            })
        })
        .await
        .context("artifact writer task failed")??;

        Ok(ReportOutcome {
            job_id,
            report_path: written.report_path,
            stores_seen,
            rows_written,
            elapsed_ms: elapsed_ms(started),
        })
    }

    /// Every store's row, sorted by store id. Stores without data are omitted.
    pub async fn compute_rows(&self, job_id: Uuid) -> Result<ComputedRows> {
        let store_ids = self
            .source
            .list_store_ids()
            .await
            .context("list stores failed")?;
        let total = store_ids.len();
        info!(job_id = %job_id, stores = total, "store directory loaded");

        let resolver = self.settings.resolver;
        let source = &self.source;
        let mut results = stream::iter(store_ids)
            .map(|store_id| async move {
                process_store(source.as_ref(), &resolver, &store_id)
                    .await
                    .with_context(|| format!("store {store_id} failed"))
            })
            .buffer_unordered(self.settings.concurrency.max(1));

        let mut rows = Vec::with_capacity(total);
        let mut processed = 0;
        while let Some(res) = results.next().await {
            let row = res?;
            processed += 1;
            self.lifecycle.on_job_progress(job_id, processed, total);
            rows.extend(row);
        }

        rows.sort_by(|a, b| a.store_id.cmp(&b.store_id));
        Ok(ComputedRows {
            stores_seen: total,
            rows,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComputedRows {
    pub stores_seen: usize,
    pub rows: Vec<StoreReportRow>,
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
