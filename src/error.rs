//! Error types for job lifecycle operations

use thiserror::Error;

/// Main error type for launching, monitoring and cancelling jobs
#[derive(Debug, Error)]
pub enum JobError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Job {job_id} failed with status '{status}'")]
    JobFailure { job_id: u64, status: String },

    #[error("Monitoring job {job_id} aborted due to timeout after {seconds:.2}s")]
    Timeout { job_id: u64, seconds: f64 },

    #[error("{0}")]
    Tool(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),

    #[error("Server error: {status} - {message}")]
    Server { status: u16, message: String },

    #[error("HTTP status error: {status} - {message}")]
    HttpStatus { status: u16, message: String },

    #[error("API request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("JSON serialization/deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Prompt failed: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}

/// Result type alias for job operations
pub type Result<T> = std::result::Result<T, JobError>;

impl JobError {
    /// Create a new not-found error
    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a new job failure error
    pub fn job_failure<S: Into<String>>(job_id: u64, status: S) -> Self {
        Self::JobFailure {
            job_id,
            status: status.into(),
        }
    }

    /// Create a new timeout error
    pub fn timeout(job_id: u64, seconds: f64) -> Self {
        Self::Timeout { job_id, seconds }
    }

    /// Create a new generic tool error
    pub fn tool<S: Into<String>>(message: S) -> Self {
        Self::Tool(message.into())
    }

    /// Create a new configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a new unexpected-response error
    pub fn unexpected<S: Into<String>>(message: S) -> Self {
        Self::UnexpectedResponse(message.into())
    }

    /// Map a non-success HTTP status onto the matching error variant
    pub fn from_status<S: Into<String>>(status: u16, message: S) -> Self {
        let message = message.into();
        match status {
            400 => Self::BadRequest(message),
            401 => Self::Auth(message),
            403 => Self::Forbidden(message),
            404 => Self::NotFound(message),
            405 => Self::MethodNotAllowed(message),
            500..=599 => Self::Server { status, message },
            _ => Self::HttpStatus { status, message },
        }
    }

    /// Whether this error originated in the HTTP layer
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::BadRequest(_)
                | Self::Auth(_)
                | Self::Forbidden(_)
                | Self::NotFound(_)
                | Self::MethodNotAllowed(_)
                | Self::Server { .. }
                | Self::HttpStatus { .. }
                | Self::Request(_)
        )
    }

    /// Process exit code the command line reports for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::BadRequest(_) => 40,
            Self::Auth(_) => 41,
            Self::Forbidden(_) => 43,
            Self::NotFound(_) => 44,
            Self::MethodNotAllowed(_) => 45,
            Self::Server { .. } | Self::HttpStatus { .. } => 50,
            Self::Timeout { .. } => 98,
            Self::JobFailure { .. } => 99,
            Self::Request(_) => 120,
            Self::Tool(_)
            | Self::Json(_)
            | Self::Io(_)
            | Self::Prompt(_)
            | Self::Configuration { .. }
            | Self::UnexpectedResponse(_) => 1,
        }
    }
}
