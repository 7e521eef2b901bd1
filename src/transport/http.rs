use reqwest::Proxy;
use std::time::Duration;

use crate::config::{AuthScheme, ProviderConfig};
use crate::drivers::DriverRequest;
use crate::Result;

/// Status and body of a completed HTTP exchange, whatever the status.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

/// Thin reqwest wrapper: one POST per call, auth attached per [`AuthScheme`].
pub struct HttpTransport {
    client: reqwest::Client,
    api_key: Option<String>,
    auth: AuthScheme,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("auth", &self.auth)
            .field("has_api_key", &self.api_key.is_some())
            .finish()
    }
}

impl HttpTransport {
    pub fn new(config: &ProviderConfig, api_key: Option<String>, auth: AuthScheme) -> Result<Self> {
        // The whole-call deadline is enforced by the client; only connecting is bounded here.
        let mut builder = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.timeout_secs.clamp(1, 30)))
            .pool_idle_timeout(Some(Duration::from_secs(90)));

        if let Some(proxy_url) = &config.proxy_url {
            let proxy = Proxy::all(proxy_url)
                .map_err(|e| crate::Error::Transport(TransportError::Other(e.to_string())))?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| crate::Error::Transport(TransportError::Other(e.to_string())))?;

        Ok(Self {
            client,
            api_key,
            auth,
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// POST the driver request as JSON and read the whole body.
    ///
    /// Any HTTP status is returned as a [`RawResponse`]. Failures before a response
    /// arrives are connection errors; a body that breaks off after the status line
    /// is [`TransportError::Body`] and keeps the status.
    pub async fn post_json(
        &self,
        request: &DriverRequest,
        client_request_id: Option<&str>,
    ) -> std::result::Result<RawResponse, TransportError> {
        let mut req = self.client.post(&request.url).json(&request.body);

        if let Some(key) = &self.api_key {
            req = match &self.auth {
                AuthScheme::Bearer => req.bearer_auth(key),
                AuthScheme::Header { name } => req.header(name.as_str(), key.as_str()),
                AuthScheme::Query { name } => req.query(&[(name.as_str(), key.as_str())]),
            };
        }

        for (k, v) in &request.headers {
            req = req.header(k.as_str(), v.as_str());
        }

        if let Some(id) = client_request_id {
            // Correlation id for log linkage; providers ignore it.
            req = req.header("x-ai-synth-request-id", id);
        }

        let response = req.send().await.map_err(TransportError::from_reqwest)?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Body {
                status,
                reason: e.to_string(),
            })?;

        Ok(RawResponse { status, body })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Other(String),

    #[error("failed to read response body (HTTP {status}): {reason}")]
    Body { status: u16, reason: String },
}

impl TransportError {
    fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout
        } else if e.is_connect() {
            TransportError::Connect(e.to_string())
        } else {
            TransportError::Http(e)
        }
    }
}
