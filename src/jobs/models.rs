//! Data models exchanged with the job-management server

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A reusable, named configuration from which jobs are launched
#[derive(Debug, Clone, Deserialize)]
pub struct JobTemplate {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub ask_variables_on_launch: bool,
    /// Default extra variables, kept as opaque text
    #[serde(default, deserialize_with = "opaque_text")]
    pub extra_vars: Option<String>,
    /// Named sub-resource URLs
    #[serde(default)]
    pub related: BTreeMap<String, Value>,
}

impl JobTemplate {
    /// The dedicated launch sub-resource, absent on older servers
    pub fn launch_url(&self) -> Option<&str> {
        self.related
            .get("launch")
            .and_then(Value::as_str)
            .filter(|url| !url.is_empty())
    }

    /// Fill in variable defaults the template leaves unset from launch metadata
    pub fn with_launch_defaults(&self, metadata: &LaunchMetadata) -> JobTemplate {
        let mut merged = self.clone();
        merged.ask_variables_on_launch |= metadata.ask_variables_on_launch.unwrap_or(false);
        if merged.extra_vars.is_none() {
            merged.extra_vars = metadata.extra_vars.clone();
        }
        merged
    }
}

/// Server-reported requirements for launching a template
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LaunchMetadata {
    #[serde(default)]
    pub passwords_needed_to_start: Vec<String>,
    #[serde(default)]
    pub ask_variables_on_launch: Option<bool>,
    #[serde(default, deserialize_with = "opaque_text")]
    pub extra_vars: Option<String>,
}

/// Payload submitted to start a job
#[derive(Clone, Default, Serialize)]
pub struct LaunchRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_vars: Option<String>,
    /// Secret field name to solicited value
    #[serde(flatten)]
    pub passwords: BTreeMap<String, String>,
}

impl std::fmt::Debug for LaunchRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LaunchRequest")
            .field("extra_vars", &self.extra_vars)
            .field("passwords", &self.passwords.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Coarse classification of a job's lifecycle position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// Not yet finished (new, pending, waiting, running, ...)
    Active,
    Successful,
    Failed,
    /// Finished without success and without the failed flag (e.g. canceled)
    OtherTerminal,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, JobState::Active)
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobState::Active => write!(f, "active"),
            JobState::Successful => write!(f, "successful"),
            JobState::Failed => write!(f, "failed"),
            JobState::OtherTerminal => write!(f, "other-terminal"),
        }
    }
}

/// The `{elapsed, failed, status}` view of a job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSummary {
    #[serde(default)]
    pub elapsed: f64,
    #[serde(default)]
    pub failed: bool,
    pub status: String,
}

impl JobSummary {
    pub fn state(&self) -> JobState {
        if self.failed {
            return JobState::Failed;
        }
        match self.status.as_str() {
            "successful" => JobState::Successful,
            "failed" => JobState::Failed,
            "error" | "canceled" => JobState::OtherTerminal,
            _ => JobState::Active,
        }
    }
}

/// Result of a status lookup
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StatusReport {
    Summary(JobSummary),
    /// The job payload exactly as the server returned it
    Detail(Map<String, Value>),
}

/// Result of a launch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LaunchOutcome {
    pub changed: bool,
    pub id: u64,
    /// Final status when the launch was monitored
    #[serde(flatten)]
    pub status: Option<JobSummary>,
}

/// Result of a cancellation request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CancelOutcome {
    pub changed: bool,
}

/// Read an identifier field that servers send either as a number or a numeric string
pub fn id_field(body: &Value, field: &str) -> Option<u64> {
    match body.get(field)? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Accept extra variables as text, or re-encode structured values as JSON text.
/// Empty text counts as absent.
fn opaque_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.is_empty() => None,
        Some(Value::String(s)) => Some(s),
        Some(Value::Object(map)) if map.is_empty() => None,
        Some(other) => Some(other.to_string()),
    })
}
