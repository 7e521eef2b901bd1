use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::client::error_classification::{failure_from_status, failure_from_transport};
use crate::client::policy::{Decision, RetryPolicy};
use crate::drivers::ProviderDriver;
use crate::transport::HttpTransport;
use crate::types::{CompletionFailure, CompletionRequest, CompletionResult};

/// One blocking (awaited) completion round-trip.
///
/// Implementations never panic or return errors for I/O trouble: every outcome is a
/// [`CompletionResult`]. Endpoint and credentials are bound at construction.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> CompletionResult;
}

#[async_trait]
impl<T: CompletionClient + ?Sized> CompletionClient for Arc<T> {
    async fn complete(&self, request: &CompletionRequest) -> CompletionResult {
        (**self).complete(request).await
    }
}

/// HTTP-backed [`CompletionClient`] for one configured provider.
#[derive(Debug)]
pub struct HttpCompletionClient {
    pub(crate) driver: Box<dyn ProviderDriver>,
    pub(crate) transport: HttpTransport,
    pub(crate) base_url: String,
    pub(crate) policy: RetryPolicy,
    pub(crate) attempt_timeout: Duration,
}

impl HttpCompletionClient {
    pub fn provider_id(&self) -> &str {
        self.driver.provider_id()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// A single HTTP attempt, no retry.
    async fn attempt(&self, request: &CompletionRequest, request_id: &str) -> CompletionResult {
        let driver_request = self
            .driver
            .build_request(&self.base_url, request)
            .map_err(|e| CompletionFailure::invalid_request(e.to_string()))?;

        let raw = match tokio::time::timeout(
            self.attempt_timeout,
            self.transport.post_json(&driver_request, Some(request_id)),
        )
        .await
        {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) => return Err(failure_from_transport(&e)),
            Err(_) => {
                return Err(CompletionFailure::transport(format!(
                    "request timed out after {}s",
                    self.attempt_timeout.as_secs()
                )))
            }
        };

        if raw.status != 200 {
            return Err(failure_from_status(self.driver.as_ref(), raw.status, &raw.body));
        }

        let body: serde_json::Value = serde_json::from_str(&raw.body).map_err(|e| {
            CompletionFailure::contract(format!("response body is not valid JSON: {}", e))
        })?;
        let parsed = self
            .driver
            .parse_response(&body)
            .map_err(|e| CompletionFailure::contract(e.to_string()))?;

        if let Some(usage) = &parsed.usage {
            debug!(
                request_id,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                finish_reason = parsed.finish_reason.as_deref().unwrap_or("unknown"),
                "completion usage"
            );
        }

        parsed.content.ok_or_else(|| {
            CompletionFailure::contract(format!(
                "response is missing the expected text field ({})",
                self.driver.api_style()
            ))
        })
    }
}

#[async_trait]
impl CompletionClient for HttpCompletionClient {
    async fn complete(&self, request: &CompletionRequest) -> CompletionResult {
        let request_id = Uuid::new_v4().to_string();
        let mut attempt = 0u32;

        loop {
            debug!(
                request_id = %request_id,
                provider = self.driver.provider_id(),
                model = request.model(),
                temperature = request.temperature(),
                max_tokens = request.max_tokens(),
                attempt,
                "sending completion request"
            );

            let failure = match self.attempt(request, &request_id).await {
                Ok(text) => return Ok(text),
                Err(f) => f,
            };

            match self.policy.decide(attempt, &failure) {
                Decision::Retry { delay } => {
                    warn!(
                        request_id = %request_id,
                        kind = %failure.kind,
                        status = ?failure.status,
                        reason = %failure.reason,
                        "transient completion failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Decision::Fail => return Err(failure),
            }
        }
    }
}
