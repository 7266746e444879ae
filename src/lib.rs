//! jobctl - launch and follow automation jobs on a job-management server
//!
//! The library exposes the job lifecycle operations (launch, monitor, status,
//! cancel) over an injectable HTTP transport; the `jobctl` binary wires them to
//! a command line.

pub mod api;
pub mod config;
pub mod error;
pub mod jobs;
pub mod logging;

// Re-export commonly used types
pub use api::{HttpTransport, Transport};
pub use config::ClientConfig;
pub use error::{JobError, Result};
pub use jobs::{JobResource, LaunchOptions, MonitorOptions};
