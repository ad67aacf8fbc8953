//! In-memory job registry.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use sw_schemas::{JobStatus, ReportJob};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::lifecycle::{JobError, JobLifecycle};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobProgress {
    pub processed: usize,
    pub total: usize,
}

/// Point-in-time copy of a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub job: ReportJob,
    pub progress: JobProgress,
    pub error: Option<String>,
}

/// Cheap to clone; all clones share the same jobs.
#[derive(Clone, Default)]
pub struct JobRegistry {
    jobs: Arc<RwLock<HashMap<Uuid, JobSnapshot>>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new job in `Received`.
    pub fn create(&self) -> ReportJob {
        let job = ReportJob::new(Uuid::new_v4(), Utc::now());
        self.jobs.write().insert(
            job.id,
            JobSnapshot {
                job: job.clone(),
                progress: JobProgress::default(),
                error: None,
            },
        );
        info!(job_id = %job.id, "report job received");
        job
    }

    pub fn get(&self, job_id: Uuid) -> Option<JobSnapshot> {
        self.jobs.read().get(&job_id).cloned()
    }

    pub fn status(&self, job_id: Uuid) -> Option<JobStatus> {
        self.jobs.read().get(&job_id).map(|s| s.job.status)
    }

    /// Oldest first.
    pub fn list(&self) -> Vec<JobSnapshot> {
        let mut all: Vec<JobSnapshot> = self.jobs.read().values().cloned().collect();
        all.sort_by_key(|s| (s.job.created_at, s.job.id));
        all
    }

    /// Move a job to `next`, applying `f` to the snapshot under the same lock.
    fn transition_with(
        &self,
        job_id: Uuid,
        next: JobStatus,
        f: impl FnOnce(&mut JobSnapshot),
    ) -> Result<ReportJob, JobError> {
        let mut jobs = self.jobs.write();
        let snap = jobs.get_mut(&job_id).ok_or(JobError::NotFound(job_id))?;
        let from = snap.job.status;
        if !from.can_transition_to(next) {
            warn!(job_id = %job_id, from = from.as_str(), to = next.as_str(), "rejected job transition");
            return Err(JobError::InvalidTransition {
                job_id,
                from,
                to: next,
            });
        }
        snap.job.status = next;
        if next.is_terminal() {
            snap.job.completed_at = Some(Utc::now());
        }
        f(snap);
        debug!(job_id = %job_id, from = from.as_str(), to = next.as_str(), "job transition");
        Ok(snap.job.clone())
    }

    pub fn transition(&self, job_id: Uuid, next: JobStatus) -> Result<ReportJob, JobError> {
        self.transition_with(job_id, next, |_| {})
    }
}

impl JobLifecycle for JobRegistry {
    fn on_job_start(&self, job_id: Uuid) -> Result<(), JobError> {
        self.transition(job_id, JobStatus::Processing).map(|_| ())
    }

    fn on_job_progress(&self, job_id: Uuid, processed: usize, total: usize) {
        if let Some(snap) = self.jobs.write().get_mut(&job_id) {
            snap.progress = JobProgress { processed, total };
        }
    }

    fn on_job_complete(&self, job_id: Uuid, artifact_location: &str) -> Result<(), JobError> {
        let location = artifact_location.to_string();
        self.transition_with(job_id, JobStatus::Completed, move |snap| {
            snap.job.output_location = Some(location);
        })
        .map(|_| ())
    }

    fn on_job_error(&self, job_id: Uuid, message: &str) -> Result<(), JobError> {
        let message = message.to_string();
        self.transition_with(job_id, JobStatus::Error, move |snap| {
            snap.job.output_location = None;
            snap.error = Some(message);
        })
        .map(|_| ())
    }
}
