//! One-shot job status lookup

use serde_json::Value;

use crate::error::{JobError, Result};
use crate::jobs::models::{JobSummary, StatusReport};
use crate::jobs::JobResource;

impl JobResource {
    /// Fetch a job once.
    ///
    /// Without `detail` only `{elapsed, failed, status}` is kept; with it the
    /// payload is returned as the server sent it.
    pub async fn status(&self, job_id: u64, detail: bool) -> Result<StatusReport> {
        let body = self.fetch_job(job_id).await?;

        if detail {
            return match body {
                Value::Object(map) => Ok(StatusReport::Detail(map)),
                other => Err(JobError::unexpected(format!(
                    "job {} returned a non-object payload: {}",
                    job_id, other
                ))),
            };
        }

        let summary: JobSummary = serde_json::from_value(body)?;
        Ok(StatusReport::Summary(summary))
    }
}
