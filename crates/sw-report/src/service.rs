use std::sync::Arc;

use anyhow::{Context, Result};
use sw_schemas::JobStatus;
use sw_source::StoreDataSource;
use tracing::info;
use uuid::Uuid;

use crate::orchestrator::{OrchestratorSettings, ReportOrchestrator, ReportOutcome};
use crate::registry::{JobRegistry, JobSnapshot};

/// Submission front-end: owns the registry and a shared orchestrator.
#[derive(Clone)]
pub struct ReportService {
    registry: JobRegistry,
    orchestrator: Arc<ReportOrchestrator>,
}

impl ReportService {
    pub fn new(source: Arc<dyn StoreDataSource>, settings: OrchestratorSettings) -> Self {
        let registry = JobRegistry::new();
        let orchestrator = Arc::new(ReportOrchestrator::new(
            source,
            Arc::new(registry.clone()),
            settings,
        ));
        Self {
            registry,
            orchestrator,
        }
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    fn enqueue(&self) -> Result<Uuid> {
        let job = self.registry.create();
        self.registry
            .transition(job.id, JobStatus::SentForProcessing)
            .with_context(|| format!("enqueue job {}", job.id))?;
        Ok(job.id)
    }

    /// Create a job and start it in the background. Returns immediately.
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit_report(&self) -> Result<Uuid> {
        let job_id = self.enqueue()?;
        let orchestrator = self.orchestrator.clone();
        tokio::spawn(async move {
            // Failures are already recorded on the job and logged.
            let _ = orchestrator.run(job_id).await;
        });
        info!(job_id = %job_id, "report job submitted");
        Ok(job_id)
    }

    /// Create a job and run it to completion on the current task.
    pub async fn run_report(&self) -> Result<ReportOutcome> {
        let job_id = self.enqueue()?;
        self.orchestrator.run(job_id).await
    }

    pub fn get_report(&self, job_id: Uuid) -> Option<JobSnapshot> {
        self.registry.get(job_id)
    }
}
