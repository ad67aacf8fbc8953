//! Process wiring from environment variables.
//!
//! | Variable          | Meaning                                            |
//! |-------------------|----------------------------------------------------|
//! | `SW_DAEMON_ADDR`  | bind address, default `127.0.0.1:8899`             |
//! | `SW_CONFIG`       | comma-separated YAML layers, base first            |
//! | `SW_DATA_DIR`     | read a CSV directory instead of the HTTP service   |
//! | `SW_DAS_URL`      | data-access service URL, overrides `source.das_url`|

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use sw_config::{load_layered_yaml, report_unused_keys, LoadedConfig, PipelineConfig, UnusedKeyPolicy};
use sw_report::{OrchestratorSettings, ReportService};
use sw_source::{RetryPolicy, SourceSpec};
use tracing::{info, warn};

use crate::state::AppState;

pub const DEFAULT_ADDR: ([u8; 4], u16) = ([127, 0, 0, 1], 8899);

#[derive(Debug, Clone, Default)]
pub struct DaemonEnv {
    pub addr: Option<String>,
    pub config_paths: Option<String>,
    pub data_dir: Option<String>,
    pub das_url: Option<String>,
}

impl DaemonEnv {
    pub fn from_process_env() -> Self {
        let var = |k: &str| std::env::var(k).ok().filter(|v| !v.trim().is_empty());
        Self {
            addr: var("SW_DAEMON_ADDR"),
            config_paths: var("SW_CONFIG"),
            data_dir: var("SW_DATA_DIR"),
            das_url: var("SW_DAS_URL"),
        }
    }

    pub fn bind_addr(&self) -> SocketAddr {
        self.addr
            .as_deref()
            .and_then(|a| a.parse().ok())
            .unwrap_or_else(|| SocketAddr::from(DEFAULT_ADDR))
    }

    pub fn load_config(&self) -> Result<LoadedConfig> {
        let paths: Vec<&str> = self
            .config_paths
            .as_deref()
            .map(|s| s.split(',').map(str::trim).filter(|p| !p.is_empty()).collect())
            .unwrap_or_default();
        let loaded = load_layered_yaml(&paths).context("load daemon config")?;

        let report = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Warn)?;
        if !report.is_clean() {
            warn!(unused = ?report.unused_leaf_pointers, "config has unused keys");
        }
        Ok(loaded)
    }

    /// A data directory wins over any URL; the env URL wins over config.
    pub fn source_spec(&self, cfg: &PipelineConfig) -> Result<SourceSpec> {
        if let Some(dir) = &self.data_dir {
            return Ok(SourceSpec::CsvDir(PathBuf::from(dir)));
        }
        let Some(base_url) = self.das_url.clone().or_else(|| cfg.das_url.clone()) else {
            bail!("no data source: set SW_DATA_DIR, SW_DAS_URL or source.das_url");
        };
        Ok(SourceSpec::Http {
            base_url,
            order_by: cfg.order_by.clone(),
        })
    }

    pub fn build_state(&self) -> Result<AppState> {
        let loaded = self.load_config()?;
        let cfg = loaded.pipeline()?;
        let spec = self.source_spec(&cfg)?;
        let source = spec
            .open(RetryPolicy::from(&cfg.retry))
            .with_context(|| format!("open source {}", spec.describe()))?;
        let settings = OrchestratorSettings::from_config(&cfg, loaded.config_hash.clone())?;

        info!(
            source = %spec.describe(),
            config_hash = %loaded.config_hash,
            output_dir = %cfg.output_dir.display(),
            concurrency = cfg.concurrency,
            "report service ready"
        );
        Ok(AppState::new(ReportService::new(source, settings)))
    }
}
