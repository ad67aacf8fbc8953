//! Typed view of the merged config consumed by the report pipeline.
//!
//! Shape (every key optional; defaults shown):
//!
//! ```yaml
//! pipeline:
//!   default_timezone: America/Chicago
//!   concurrency: 8
//! output:
//!   dir: reports
//! source:
//!   das_url: http://127.0.0.1:8000   # no default
//!   order_by: asc
//!   retry:
//!     max_attempts: 3
//!     initial_backoff_ms: 1000
//!     max_backoff_ms: 4000
//!     timeout_ms: 10000
//! ```

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sw_uptime::{parse_timezone, TimezoneResolver, FALLBACK_TIMEZONE};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub default_timezone: String,
    pub concurrency: usize,
    pub output_dir: PathBuf,
    pub das_url: Option<String>,
    pub order_by: String,
    pub retry: RetryConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub timeout_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 1_000,
            max_backoff_ms: 4_000,
            timeout_ms: 10_000,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            default_timezone: FALLBACK_TIMEZONE.to_string(),
            concurrency: 8,
            output_dir: PathBuf::from("reports"),
            das_url: None,
            order_by: "asc".to_string(),
            retry: RetryConfig::default(),
        }
    }
}

// Raw YAML sections. Kept private so the public struct stays flat.

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawDoc {
    pipeline: RawPipeline,
    output: RawOutput,
    source: RawSource,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawPipeline {
    default_timezone: Option<String>,
    concurrency: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawOutput {
    dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSource {
    das_url: Option<String>,
    order_by: Option<String>,
    retry: Option<RetryConfig>,
}

impl PipelineConfig {
    pub fn from_json(config_json: &Value) -> Result<Self> {
        let raw: RawDoc =
            serde_json::from_value(config_json.clone()).context("pipeline config shape invalid")?;
        let d = PipelineConfig::default();

        let cfg = PipelineConfig {
            default_timezone: raw.pipeline.default_timezone.unwrap_or(d.default_timezone),
            concurrency: raw.pipeline.concurrency.unwrap_or(d.concurrency),
            output_dir: raw.output.dir.unwrap_or(d.output_dir),
            das_url: raw.source.das_url.or(d.das_url),
            order_by: raw.source.order_by.unwrap_or(d.order_by),
            retry: raw.source.retry.unwrap_or(d.retry),
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if parse_timezone(&self.default_timezone).is_none() {
            bail!(
                "CONFIG_INVALID pipeline.default_timezone='{}' is not an IANA timezone",
                self.default_timezone
            );
        }
        if self.concurrency == 0 {
            bail!("CONFIG_INVALID pipeline.concurrency must be >= 1");
        }
        if !matches!(self.order_by.as_str(), "asc" | "desc") {
            bail!("CONFIG_INVALID source.order_by must be 'asc' or 'desc'");
        }
        if self.retry.max_attempts == 0 {
            bail!("CONFIG_INVALID source.retry.max_attempts must be >= 1");
        }
        if self.retry.timeout_ms == 0 {
            bail!("CONFIG_INVALID source.retry.timeout_ms must be > 0");
        }
        if self.retry.max_backoff_ms < self.retry.initial_backoff_ms {
            bail!("CONFIG_INVALID source.retry.max_backoff_ms must be >= initial_backoff_ms");
        }
        Ok(())
    }

    pub fn default_tz(&self) -> Result<Tz> {
        parse_timezone(&self.default_timezone)
            .with_context(|| format!("unknown default timezone: {}", self.default_timezone))
    }

    pub fn timezone_resolver(&self) -> Result<TimezoneResolver> {
        Ok(TimezoneResolver::new(self.default_tz()?))
    }
}
