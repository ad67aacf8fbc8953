//! sw-report
//!
//! Drives one report job from submission to a CSV artifact:
//! - [`JobRegistry`] owns job state and rejects illegal lifecycle steps
//! - [`ReportOrchestrator`] fans the per-store pipeline out over a source
//! - [`ReportService`] ties both together behind submit / get

mod lifecycle;
mod orchestrator;
mod registry;
mod service;

pub use lifecycle::{JobError, JobLifecycle};
pub use orchestrator::{process_store, ComputedRows, OrchestratorSettings, ReportOrchestrator, ReportOutcome};
pub use registry::{JobProgress, JobRegistry, JobSnapshot};
pub use service::ReportService;
