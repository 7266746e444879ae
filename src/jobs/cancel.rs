//! Job cancellation

use serde_json::json;
use tracing::{info, warn};

use crate::error::{JobError, Result};
use crate::jobs::models::CancelOutcome;
use crate::jobs::JobResource;

impl JobResource {
    /// Ask the server to cancel a job.
    ///
    /// A job that is no longer cancelable answers "method not allowed"; that
    /// is reported as `changed: false`, or as an error when
    /// `fail_if_not_running` is set.
    pub async fn cancel(&self, job_id: u64, fail_if_not_running: bool) -> Result<CancelOutcome> {
        let path = format!("/jobs/{}/cancel/", job_id);

        match self.transport.post(&path, &json!({})).await {
            Ok(_) => {
                info!(job_id, "Cancellation accepted");
                Ok(CancelOutcome { changed: true })
            }
            Err(JobError::MethodNotAllowed(_)) if fail_if_not_running => {
                warn!(job_id, "Cancellation rejected, job is not running");
                Err(JobError::tool("Job not running."))
            }
            Err(JobError::MethodNotAllowed(_)) => {
                info!(job_id, "Job is not running, nothing to cancel");
                Ok(CancelOutcome { changed: false })
            }
            Err(e) => Err(e),
        }
    }
}
