//! Gemini Generate API 驱动: 实现 Google Gemini 特有的请求/响应格式转换
//!
//! Google Gemini generateContent API driver. Key differences:
//! - Uses `contents` instead of `messages`, with `parts` instead of `content`.
//! - Roles: `user` and `model` (not `assistant`). System uses `system_instruction`.
//! - `generationConfig` wraps temperature and `maxOutputTokens`.
//! - Response: `candidates[0].content.parts[0].text`.
//! - API key is passed as `?key=` query parameter, not in headers.

use serde_json::Value;
use std::collections::HashMap;

use crate::config::{ApiStyle, AuthScheme};
use crate::error::{Error, ErrorContext};
use crate::types::{CompletionRequest, Message, MessageRole};

use super::{DriverRequest, DriverResponse, ProviderDriver, UsageInfo};

/// Google Gemini generateContent API driver.
#[derive(Debug)]
pub struct GeminiDriver {
    provider_id: String,
}

impl GeminiDriver {
    pub fn new(provider_id: impl Into<String>) -> Self {
        Self {
            provider_id: provider_id.into(),
        }
    }

    /// Separate system instructions from conversation contents.
    fn split_messages(messages: &[Message]) -> (Option<Value>, Vec<Value>) {
        let mut system_parts: Vec<&str> = Vec::new();
        let mut contents: Vec<Value> = Vec::new();

        for m in messages {
            let role = match m.role {
                MessageRole::System => {
                    system_parts.push(&m.content);
                    continue;
                }
                MessageRole::User => "user",
                MessageRole::Assistant => "model",
            };
            contents.push(serde_json::json!({
                "role": role,
                "parts": [{ "text": m.content }],
            }));
        }

        let system_instruction = if system_parts.is_empty() {
            None
        } else {
            Some(serde_json::json!({
                "parts": [{ "text": system_parts.join("\n\n") }]
            }))
        };

        (system_instruction, contents)
    }
}

impl ProviderDriver for GeminiDriver {
    fn provider_id(&self) -> &str {
        &self.provider_id
    }

    fn api_style(&self) -> ApiStyle {
        ApiStyle::GeminiGenerate
    }

    fn default_auth(&self) -> AuthScheme {
        AuthScheme::Query { name: "key".into() }
    }

    fn build_request(
        &self,
        base_url: &str,
        request: &CompletionRequest,
    ) -> Result<DriverRequest, Error> {
        let (system_instruction, contents) = Self::split_messages(request.messages());
        if contents.is_empty() {
            return Err(Error::validation_with_context(
                "Gemini requires at least one user or assistant turn",
                ErrorContext::new()
                    .with_field_path("request.messages")
                    .with_source("gemini_driver"),
            ));
        }

        let mut body = serde_json::json!({
            "contents": contents,
            "generationConfig": {
                "temperature": request.temperature(),
                "maxOutputTokens": request.max_tokens(),
            },
        });
        if let Some(sys) = system_instruction {
            body["system_instruction"] = sys;
        }

        Ok(DriverRequest {
            url: format!(
                "{}/v1beta/models/{}:generateContent",
                base_url,
                request.model()
            ),
            headers: HashMap::new(),
            body,
        })
    }

    fn parse_response(&self, body: &Value) -> Result<DriverResponse, Error> {
        // A blocked prompt returns 200 with no candidates and a block reason.
        if let Some(reason) = body
            .pointer("/promptFeedback/blockReason")
            .and_then(|v| v.as_str())
        {
            return Err(Error::validation_with_context(
                format!("prompt blocked by provider: {}", reason),
                ErrorContext::new()
                    .with_field_path("promptFeedback.blockReason")
                    .with_source("gemini_driver"),
            ));
        }

        let content = body
            .pointer("/candidates/0/content/parts/0/text")
            .and_then(|v| v.as_str())
            .map(String::from);

        let finish_reason = body
            .pointer("/candidates/0/finishReason")
            .and_then(|v| v.as_str())
            .map(|r| match r {
                "STOP" => "stop".to_string(),
                "MAX_TOKENS" => "length".to_string(),
                other => other.to_lowercase(),
            });

        let usage = body.get("usageMetadata").map(|u| UsageInfo {
            prompt_tokens: u["promptTokenCount"].as_u64().unwrap_or(0),
            completion_tokens: u["candidatesTokenCount"].as_u64().unwrap_or(0),
            total_tokens: u["totalTokenCount"].as_u64().unwrap_or(0),
        });

        Ok(DriverResponse {
            content,
            finish_reason,
            usage,
        })
    }
}
