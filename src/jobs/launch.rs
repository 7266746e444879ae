//! Launching jobs from templates

use std::collections::BTreeMap;
use std::time::Duration;

use serde_json::{json, Value};
use tracing::{debug, info};

use crate::api::Transport;
use crate::error::{JobError, Result};
use crate::jobs::models::{id_field, JobTemplate, LaunchMetadata, LaunchOutcome, LaunchRequest};
use crate::jobs::monitor::MonitorOptions;
use crate::jobs::secrets::collect_secrets;
use crate::jobs::variables::{resolve_extra_vars, ExtraVarsInput};
use crate::jobs::{describe_not_found, JobResource};

/// Launch parameters
#[derive(Debug)]
pub struct LaunchOptions {
    /// Call-time extra variables; take precedence over everything else
    pub extra_vars: Option<ExtraVarsInput>,
    /// Suppress the extra-variables editor
    pub no_input: bool,
    /// Poll the new job to completion
    pub monitor: bool,
    /// Monitoring timeout
    pub timeout: Option<Duration>,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            extra_vars: None,
            no_input: true,
            monitor: false,
            timeout: None,
        }
    }
}

impl LaunchOptions {
    pub fn with_extra_vars(mut self, extra_vars: ExtraVarsInput) -> Self {
        self.extra_vars = Some(extra_vars);
        self
    }

    pub fn with_no_input(mut self, no_input: bool) -> Self {
        self.no_input = no_input;
        self
    }

    pub fn with_monitor(mut self, monitor: bool, timeout: Option<Duration>) -> Self {
        self.monitor = monitor;
        self.timeout = timeout;
        self
    }
}

/// Where a launch is submitted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchEndpoint {
    /// The template's own launch sub-resource
    Direct { url: String },
    /// Older servers: a job record created up front, then started
    Legacy { job_id: u64, start_url: String },
}

impl LaunchEndpoint {
    /// The template's launch link, when the server advertises one
    pub fn direct(template: &JobTemplate) -> Option<Self> {
        template.launch_url().map(|url| LaunchEndpoint::Direct {
            url: url.to_string(),
        })
    }

    /// Create a job record from the template on servers without a launch link.
    ///
    /// `extra_vars` is bound to the new record.
    pub async fn create_job(
        transport: &dyn Transport,
        template: &JobTemplate,
        extra_vars: Option<&str>,
    ) -> Result<Self> {
        debug!(template_id = template.id, "No launch link, creating job record");
        let mut body = json!({ "job_template": template.id });
        if let Some(extra_vars) = extra_vars {
            body["extra_vars"] = json!(extra_vars);
        }

        let created = transport.post("/jobs/", &body).await?;
        let job_id = id_field(&created, "id").ok_or_else(|| {
            JobError::unexpected("job creation response did not include an id")
        })?;

        Ok(LaunchEndpoint::Legacy {
            job_id,
            start_url: format!("/jobs/{}/start/", job_id),
        })
    }

    pub fn url(&self) -> &str {
        match self {
            LaunchEndpoint::Direct { url } => url,
            LaunchEndpoint::Legacy { start_url, .. } => start_url,
        }
    }

    /// Identify the started job from the submission response
    pub fn job_id_from(&self, response: &Value) -> Result<u64> {
        match self {
            LaunchEndpoint::Direct { .. } => id_field(response, "job")
                .or_else(|| id_field(response, "id"))
                .ok_or_else(|| JobError::unexpected("launch response did not include a job id")),
            LaunchEndpoint::Legacy { job_id, .. } => {
                Ok(id_field(response, "id").unwrap_or(*job_id))
            }
        }
    }
}

impl JobResource {
    /// Launch a job from a template.
    ///
    /// Returns `{changed: true, id}`; with `monitor` set the final status of
    /// the job is included as well.
    pub async fn launch(&self, template_id: u64, options: LaunchOptions) -> Result<LaunchOutcome> {
        let template = self.fetch_template(template_id).await?;
        let LaunchOptions {
            extra_vars,
            no_input,
            monitor,
            timeout,
        } = options;

        // without a launch link the variables are bound when the job record is created
        let (endpoint, metadata, extra_vars) = match LaunchEndpoint::direct(&template) {
            Some(endpoint) => {
                let metadata = self.fetch_launch_metadata(&endpoint).await?;
                let defaults = template.with_launch_defaults(&metadata);
                let extra_vars =
                    resolve_extra_vars(&defaults, extra_vars, no_input, self.editor.as_ref())?;
                (endpoint, metadata, extra_vars)
            }
            None => {
                let extra_vars =
                    resolve_extra_vars(&template, extra_vars, no_input, self.editor.as_ref())?;
                let endpoint = LaunchEndpoint::create_job(
                    self.transport.as_ref(),
                    &template,
                    extra_vars.as_deref(),
                )
                .await?;
                let metadata = self.fetch_launch_metadata(&endpoint).await?;
                (endpoint, metadata, extra_vars)
            }
        };

        let passwords = if metadata.passwords_needed_to_start.is_empty() {
            BTreeMap::new()
        } else {
            collect_secrets(self.secrets.as_ref(), &metadata.passwords_needed_to_start)?
        };

        let request = LaunchRequest {
            extra_vars,
            passwords,
        };
        debug!(template_id, request = ?request, "Submitting launch");
        let response = self
            .transport
            .post(endpoint.url(), &serde_json::to_value(&request)?)
            .await?;
        let job_id = endpoint.job_id_from(&response)?;

        info!(template_id, job_id, template = %template.name, "Launched job");

        let mut outcome = LaunchOutcome {
            changed: true,
            id: job_id,
            status: None,
        };
        if monitor {
            let options = MonitorOptions::default().with_timeout(timeout);
            outcome.status = Some(self.monitor(job_id, options).await?);
        }
        Ok(outcome)
    }

    async fn fetch_template(&self, template_id: u64) -> Result<JobTemplate> {
        let body = self
            .transport
            .get(&format!("/job_templates/{}/", template_id))
            .await
            .map_err(|e| {
                describe_not_found(e, || format!("job template {} does not exist", template_id))
            })?;
        Ok(serde_json::from_value(body)?)
    }

    async fn fetch_launch_metadata(&self, endpoint: &LaunchEndpoint) -> Result<LaunchMetadata> {
        match self.transport.get(endpoint.url()).await? {
            Value::Null => Ok(LaunchMetadata::default()),
            body => Ok(serde_json::from_value(body)?),
        }
    }
}
