//! Job lifecycle: launch from a template, monitor, inspect and cancel
//!
//! [`JobResource`] owns the collaborators every operation needs (transport,
//! editor, secret prompt, sleeper, TTY predicate and progress output) so each
//! one can be replaced with a deterministic stand-in.

pub mod cancel;
pub mod launch;
pub mod models;
pub mod monitor;
pub mod render;
pub mod secrets;
pub mod status;
pub mod variables;

use std::io::{IsTerminal, Write};
use std::sync::Arc;

use serde_json::Value;

use crate::api::Transport;
use crate::error::{JobError, Result};

pub use launch::{LaunchEndpoint, LaunchOptions};
pub use models::{
    CancelOutcome, JobState, JobSummary, JobTemplate, LaunchMetadata, LaunchOutcome,
    LaunchRequest, StatusReport,
};
pub use monitor::{BackoffPolicy, MonitorOptions, PollState, Sleeper, TokioSleeper};
pub use render::{select_renderer, LineRenderer, ProgressRenderer, TtyRenderer};
pub use secrets::{SecretPrompt, TerminalSecretPrompt};
pub use variables::{Editor, ExtraVarsInput, TerminalEditor};

/// Produces the writer progress is rendered to
pub type OutputFactory = Arc<dyn Fn() -> Box<dyn Write + Send> + Send + Sync>;

/// Predicate deciding whether progress output is an interactive terminal
pub type TtyPredicate = Arc<dyn Fn() -> bool + Send + Sync>;

/// Entry point for job operations against one server
#[derive(Clone)]
pub struct JobResource {
    transport: Arc<dyn Transport>,
    editor: Arc<dyn Editor>,
    secrets: Arc<dyn SecretPrompt>,
    sleeper: Arc<dyn Sleeper>,
    is_tty: TtyPredicate,
    output: OutputFactory,
}

impl JobResource {
    /// Create a resource with terminal collaborators and progress on stderr
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            editor: Arc::new(TerminalEditor::default()),
            secrets: Arc::new(TerminalSecretPrompt),
            sleeper: Arc::new(TokioSleeper),
            is_tty: Arc::new(|| std::io::stderr().is_terminal()),
            output: Arc::new(|| Box::new(std::io::stderr())),
        }
    }

    pub fn with_editor(mut self, editor: Arc<dyn Editor>) -> Self {
        self.editor = editor;
        self
    }

    pub fn with_secret_prompt(mut self, secrets: Arc<dyn SecretPrompt>) -> Self {
        self.secrets = secrets;
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Replace the TTY predicate; it is evaluated once per monitor call
    pub fn with_tty_predicate<F>(mut self, predicate: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        self.is_tty = Arc::new(predicate);
        self
    }

    pub fn with_output<F>(mut self, output: F) -> Self
    where
        F: Fn() -> Box<dyn Write + Send> + Send + Sync + 'static,
    {
        self.output = Arc::new(output);
        self
    }

    async fn fetch_job(&self, job_id: u64) -> Result<Value> {
        self.transport
            .get(&job_path(job_id))
            .await
            .map_err(|e| describe_not_found(e, || format!("job {} does not exist", job_id)))
    }
}

impl std::fmt::Debug for JobResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobResource").finish_non_exhaustive()
    }
}

pub(crate) fn job_path(job_id: u64) -> String {
    format!("/jobs/{}/", job_id)
}

/// Give a bare 404 a message naming the missing resource
pub(crate) fn describe_not_found<F>(err: JobError, describe: F) -> JobError
where
    F: FnOnce() -> String,
{
    match err {
        JobError::NotFound(_) => JobError::not_found(describe()),
        other => other,
    }
}
