use sw_schemas::JobStatus;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JobError {
    #[error("job not found: {0}")]
    NotFound(Uuid),
    #[error("job {job_id}: invalid transition {} -> {}", .from.as_str(), .to.as_str())]
    InvalidTransition {
        job_id: Uuid,
        from: JobStatus,
        to: JobStatus,
    },
}

/// Callbacks the orchestrator fires while it owns a job.
///
/// Start, complete and error move the job through its lifecycle and can be
/// refused. Progress is advisory.
pub trait JobLifecycle: Send + Sync {
    fn on_job_start(&self, job_id: Uuid) -> Result<(), JobError>;

    fn on_job_progress(&self, job_id: Uuid, processed: usize, total: usize);

    fn on_job_complete(&self, job_id: Uuid, artifact_location: &str) -> Result<(), JobError>;

    fn on_job_error(&self, job_id: Uuid, message: &str) -> Result<(), JobError>;
}
