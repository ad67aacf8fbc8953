use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use sw_schemas::{StoreReportRow, REPORT_COLUMNS};
use uuid::Uuid;

pub const MANIFEST_SCHEMA_VERSION: i32 = 1;

/// Sidecar written next to every report CSV.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportManifest {
    pub schema_version: i32,
    pub job_id: Uuid,
    pub config_hash: String,
    pub row_count: usize,
    pub created_at_utc: DateTime<Utc>,
    pub report_csv: String,
}

pub struct WriteReportArgs<'a> {
    pub output_dir: &'a Path, // e.g. ./reports
    pub job_id: Uuid,
    pub config_hash: &'a str,
    pub rows: &'a [StoreReportRow],
}

#[derive(Debug)]
pub struct WriteReportResult {
    pub report_path: PathBuf,
    pub manifest_path: PathBuf,
}

pub fn report_path(output_dir: &Path, job_id: Uuid) -> PathBuf {
    output_dir.join(format!("{job_id}.csv"))
}

pub fn manifest_path(output_dir: &Path, job_id: Uuid) -> PathBuf {
    output_dir.join(format!("{job_id}.manifest.json"))
}

/// Write `<output_dir>/<job_id>.csv` plus its manifest.
///
/// Rows are written in the order given. The header is always present, even
/// for an empty report. Both files land via rename from a temp sibling, so a
/// reader never sees a half-written artifact.
pub fn write_report(args: WriteReportArgs<'_>) -> Result<WriteReportResult> {
    fs::create_dir_all(args.output_dir)
        .with_context(|| format!("create output dir failed: {}", args.output_dir.display()))?;

    let report_path = report_path(args.output_dir, args.job_id);
    write_atomically(&report_path, &render_csv(args.rows)?)?;

    let manifest = ReportManifest {
        schema_version: MANIFEST_SCHEMA_VERSION,
        job_id: args.job_id,
        config_hash: args.config_hash.to_string(),
        row_count: args.rows.len(),
        created_at_utc: Utc::now(),
        report_csv: format!("{}.csv", args.job_id),
    };
    let manifest_path = manifest_path(args.output_dir, args.job_id);
    let json = serde_json::to_string_pretty(&manifest).context("serialize manifest failed")?;
    write_atomically(&manifest_path, format!("{json}\n").as_bytes())?;

    Ok(WriteReportResult {
        report_path,
        manifest_path,
    })
}

fn render_csv(rows: &[StoreReportRow]) -> Result<Vec<u8>> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    wtr.write_record(REPORT_COLUMNS).context("write csv header failed")?;
    for row in rows {
        wtr.serialize(row)
            .with_context(|| format!("write csv row failed: store_id={}", row.store_id))?;
    }
    wtr.into_inner().context("flush csv failed")
}

fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("artifact path has no file name: {}", path.display()))?;
    let tmp = path.with_file_name(format!(".{file_name}.tmp"));

    fs::write(&tmp, bytes).with_context(|| format!("write temp artifact failed: {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("rename artifact failed: {}", path.display()))?;
    Ok(())
}

/// Read a report back. Used by tests and the CLI summary.
pub fn read_report(path: &Path) -> Result<Vec<StoreReportRow>> {
    let mut rdr = csv::Reader::from_path(path).with_context(|| format!("open report csv: {}", path.display()))?;
    let mut out = Vec::new();
    for rec in rdr.deserialize() {
        out.push(rec.with_context(|| format!("parse report csv: {}", path.display()))?);
    }
    Ok(out)
}
