//! HTTP access to the job-management server

pub mod transport;

pub use transport::{HttpTransport, Transport};
