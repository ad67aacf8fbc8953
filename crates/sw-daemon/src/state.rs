//! Shared runtime state for sw-daemon.
//!
//! Handlers receive `State<Arc<AppState>>` from Axum. Job state itself lives
//! in the [`ReportService`] registry.

use serde::{Deserialize, Serialize};
use sw_report::ReportService;

/// Static build metadata included in health responses.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BuildInfo {
    pub service: String,
    pub version: String,
}

impl Default for BuildInfo {
    fn default() -> Self {
        Self {
            service: "sw-daemon".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub build: BuildInfo,
    pub reports: ReportService,
}

impl AppState {
    pub fn new(reports: ReportService) -> Self {
        Self {
            build: BuildInfo::default(),
            reports,
        }
    }
}
