//! Client configuration loaded from `JOBCTL_*` environment variables

use std::time::Duration;

use url::Url;

use crate::error::{JobError, Result};

const DEFAULT_HOST: &str = "http://127.0.0.1";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings for the job-management server
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub host: Url,
    pub username: Option<String>,
    pub password: Option<String>,
    pub verify_ssl: bool,
    pub request_timeout: Duration,
}

impl ClientConfig {
    /// Build the configuration from `JOBCTL_*` environment variables.
    ///
    /// Call `dotenv().ok()` first if a `.env` file should be honoured.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`] but reading through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = parse_host(
            &lookup("JOBCTL_HOST").unwrap_or_else(|| DEFAULT_HOST.to_owned()),
        )?;

        let verify_ssl = match lookup("JOBCTL_VERIFY_SSL") {
            Some(raw) => parse_bool(&raw).ok_or_else(|| {
                JobError::configuration(format!("JOBCTL_VERIFY_SSL must be true or false, got '{}'", raw))
            })?,
            None => true,
        };

        let request_timeout = match lookup("JOBCTL_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| {
                    JobError::configuration(format!("JOBCTL_TIMEOUT_SECS must be a number, got '{}'", raw))
                })?,
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        Ok(Self {
            host,
            username: lookup("JOBCTL_USERNAME").filter(|v| !v.is_empty()),
            password: lookup("JOBCTL_PASSWORD").filter(|v| !v.is_empty()),
            verify_ssl,
            request_timeout,
        })
    }

    /// Replace the host, accepting a bare hostname as well as a full URL
    pub fn with_host(mut self, host: &str) -> Result<Self> {
        self.host = parse_host(host)?;
        Ok(self)
    }
}

/// Parse a server host; a missing scheme means `https://`
pub fn parse_host(raw: &str) -> Result<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(JobError::configuration("host must not be empty"));
    }

    let candidate = if raw.contains("://") {
        raw.to_owned()
    } else {
        format!("https://{}", raw)
    };

    let url = Url::parse(&candidate)
        .map_err(|e| JobError::configuration(format!("invalid host '{}': {}", raw, e)))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(JobError::configuration(format!(
            "unsupported scheme '{}' in host '{}'",
            other, raw
        ))),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
