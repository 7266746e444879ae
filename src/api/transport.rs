//! Request contract consumed by the job operations, plus its reqwest implementation

use async_trait::async_trait;
use reqwest::{Client, Method, Response};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::config::ClientConfig;
use crate::error::{JobError, Result};

const API_PREFIX: &str = "/api/v1";

/// Minimal HTTP surface the job operations need.
///
/// Implementations return the parsed JSON body of a 2xx response (`Value::Null`
/// for an empty body) and map every other status onto a [`JobError`].
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, path: &str) -> Result<Value>;

    async fn post(&self, path: &str, body: &Value) -> Result<Value>;
}

/// Transport backed by a reqwest client
#[derive(Debug, Clone)]
pub struct HttpTransport {
    /// Server base URL
    host: Url,
    /// HTTP client for making requests
    client: Client,
    /// Optional basic-auth credentials
    credentials: Option<(String, String)>,
}

impl HttpTransport {
    /// Create a transport from client configuration
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .danger_accept_invalid_certs(!config.verify_ssl)
            .build()
            .map_err(JobError::from)?;

        let credentials = match (&config.username, &config.password) {
            (Some(user), Some(pass)) => Some((user.clone(), pass.clone())),
            (Some(user), None) => Some((user.clone(), String::new())),
            _ => None,
        };

        Ok(Self {
            host: config.host.clone(),
            client,
            credentials,
        })
    }

    /// Resolve an endpoint path against the configured host.
    ///
    /// Absolute URLs pass through, `/api/...` paths (as found in `related`
    /// links) attach to the host, anything else gets the API version prefix.
    pub fn url_for(&self, path: &str) -> Result<Url> {
        if path.starts_with("http://") || path.starts_with("https://") {
            return Url::parse(path)
                .map_err(|e| JobError::unexpected(format!("invalid URL '{}': {}", path, e)));
        }

        let path = if path.starts_with('/') {
            path.to_owned()
        } else {
            format!("/{}", path)
        };
        let full_path = if path.starts_with("/api/") {
            path
        } else {
            format!("{}{}", API_PREFIX, path)
        };

        let base = self.host.as_str().trim_end_matches('/');
        Url::parse(&format!("{}{}", base, full_path))
            .map_err(|e| JobError::unexpected(format!("invalid URL '{}': {}", full_path, e)))
    }

    async fn send(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value> {
        let url = self.url_for(path)?;
        debug!(method = %method, url = %url, "Sending request");

        let mut request = self.client.request(method.clone(), url.clone());
        if let Some((user, pass)) = &self.credentials {
            request = request.basic_auth(user, Some(pass));
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        debug!(method = %method, url = %url, status = response.status().as_u16(), "Received response");
        Self::into_json(response).await
    }

    async fn into_json(response: Response) -> Result<Value> {
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = if text.trim().is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("Unknown error")
                    .to_string()
            } else {
                text
            };
            return Err(JobError::from_status(status.as_u16(), message));
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, path: &str) -> Result<Value> {
        self.send(Method::GET, path, None).await
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value> {
        self.send(Method::POST, path, Some(body)).await
    }
}
