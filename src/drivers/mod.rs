//! Provider 驱动抽象层: 通过 trait 实现多厂商 API 适配
//!
//! Provider driver abstraction layer. Each vendor API style has one driver that turns a
//! [`CompletionRequest`] into an HTTP request body and pulls the generated text back out
//! of the response. The driver is chosen once, from [`ApiStyle`], when the client is
//! built; the request path never branches on provider names.

pub mod anthropic;
pub mod gemini;

use serde_json::Value;
use std::collections::HashMap;

use crate::config::{ApiStyle, AuthScheme};
use crate::error::Error;
use crate::types::CompletionRequest;

pub use anthropic::AnthropicDriver;
pub use gemini::GeminiDriver;

/// Unified HTTP request representation for provider communication.
#[derive(Debug, Clone)]
pub struct DriverRequest {
    /// Full target URL.
    pub url: String,
    /// Extra headers the vendor requires (auth is added by the transport).
    pub headers: HashMap<String, String>,
    /// JSON request body.
    pub body: Value,
}

/// Unified chat response from provider.
#[derive(Debug, Clone)]
pub struct DriverResponse {
    /// Extracted text content; `None` when the expected field is missing.
    pub content: Option<String>,
    /// Finish reason normalized to `stop` / `length` / vendor value.
    pub finish_reason: Option<String>,
    /// Token usage statistics.
    pub usage: Option<UsageInfo>,
}

/// Token usage information.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsageInfo {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

/// Core trait for provider-specific API adaptation.
///
/// Object-safe; the client holds a `Box<dyn ProviderDriver>`.
pub trait ProviderDriver: Send + Sync + std::fmt::Debug {
    /// Provider identifier (from config).
    fn provider_id(&self) -> &str;

    /// API style this driver implements.
    fn api_style(&self) -> ApiStyle;

    /// Where the API key goes unless the config overrides it.
    fn default_auth(&self) -> AuthScheme;

    /// Build a provider-specific HTTP request.
    fn build_request(
        &self,
        base_url: &str,
        request: &CompletionRequest,
    ) -> Result<DriverRequest, Error>;

    /// Parse a 200 response body into unified format.
    fn parse_response(&self, body: &Value) -> Result<DriverResponse, Error>;

    /// Vendor error message from a non-200 body (`{"error": {"message": ...}}`).
    fn parse_error_message(&self, body: &Value) -> Option<String> {
        body.pointer("/error/message")
            .and_then(|v| v.as_str())
            .map(String::from)
            .or_else(|| {
                body.get("error")
                    .and_then(|v| v.as_str())
                    .map(String::from)
            })
    }
}

/// OpenAI-compatible driver: OpenAI, Groq, xAI, DeepSeek, Hugging Face router, etc.
#[derive(Debug)]
pub struct OpenAiDriver {
    provider_id: String,
}

impl OpenAiDriver {
    pub fn new(provider_id: impl Into<String>) -> Self {
        Self {
            provider_id: provider_id.into(),
        }
    }
}

impl ProviderDriver for OpenAiDriver {
    fn provider_id(&self) -> &str {
        &self.provider_id
    }

    fn api_style(&self) -> ApiStyle {
        ApiStyle::OpenAiCompatible
    }

    fn default_auth(&self) -> AuthScheme {
        AuthScheme::Bearer
    }

    fn build_request(
        &self,
        base_url: &str,
        request: &CompletionRequest,
    ) -> Result<DriverRequest, Error> {
        let messages: Vec<Value> = request
            .messages()
            .iter()
            .map(|m| serde_json::json!({ "role": m.role.as_str(), "content": m.content }))
            .collect();

        let body = serde_json::json!({
            "model": request.model(),
            "messages": messages,
            "temperature": request.temperature(),
            "max_tokens": request.max_tokens(),
            "stream": false,
        });

        Ok(DriverRequest {
            url: format!("{}/chat/completions", base_url),
            headers: HashMap::new(),
            body,
        })
    }

    fn parse_response(&self, body: &Value) -> Result<DriverResponse, Error> {
        let content = body
            .pointer("/choices/0/message/content")
            .and_then(|v| v.as_str())
            .map(String::from);
        let finish_reason = body
            .pointer("/choices/0/finish_reason")
            .and_then(|v| v.as_str())
            .map(String::from);
        let usage = body.get("usage").map(|u| UsageInfo {
            prompt_tokens: u["prompt_tokens"].as_u64().unwrap_or(0),
            completion_tokens: u["completion_tokens"].as_u64().unwrap_or(0),
            total_tokens: u["total_tokens"].as_u64().unwrap_or(0),
        });

        Ok(DriverResponse {
            content,
            finish_reason,
            usage,
        })
    }
}

/// Factory function to create the driver for an API style.
pub fn create_driver(api_style: ApiStyle, provider_id: &str) -> Box<dyn ProviderDriver> {
    match api_style {
        ApiStyle::OpenAiCompatible => Box::new(OpenAiDriver::new(provider_id)),
        ApiStyle::AnthropicMessages => Box::new(AnthropicDriver::new(provider_id)),
        ApiStyle::GeminiGenerate => Box::new(GeminiDriver::new(provider_id)),
    }
}
