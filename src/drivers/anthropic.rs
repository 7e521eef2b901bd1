//! Anthropic Messages API 驱动: 实现 Anthropic 特有的请求/响应格式转换
//!
//! Anthropic Messages API driver. Handles the key differences from OpenAI:
//! - System messages are a top-level `system` parameter, not part of `messages`.
//! - Content uses typed blocks: `[{"type": "text", "text": "..."}]`.
//! - Response text lives in `content[].text` instead of `choices[0].message.content`.
//! - `max_tokens` is required, not optional.
//! - The key goes in `x-api-key` and every request carries `anthropic-version`.

use serde_json::Value;
use std::collections::HashMap;

use crate::config::{ApiStyle, AuthScheme};
use crate::error::Error;
use crate::types::{CompletionRequest, Message, MessageRole};

use super::{DriverRequest, DriverResponse, ProviderDriver, UsageInfo};

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic Messages API driver.
#[derive(Debug)]
pub struct AnthropicDriver {
    provider_id: String,
}

impl AnthropicDriver {
    pub fn new(provider_id: impl Into<String>) -> Self {
        Self {
            provider_id: provider_id.into(),
        }
    }

    /// Extract system message and non-system messages separately.
    fn split_system_messages(messages: &[Message]) -> (Option<String>, Vec<Value>) {
        let mut system_parts: Vec<&str> = Vec::new();
        let mut turns: Vec<Value> = Vec::new();

        for m in messages {
            match m.role {
                MessageRole::System => system_parts.push(&m.content),
                MessageRole::User | MessageRole::Assistant => {
                    turns.push(serde_json::json!({
                        "role": m.role.as_str(),
                        "content": [{ "type": "text", "text": m.content }],
                    }));
                }
            }
        }

        let system = if system_parts.is_empty() {
            None
        } else {
            Some(system_parts.join("\n\n"))
        };

        (system, turns)
    }
}

impl ProviderDriver for AnthropicDriver {
    fn provider_id(&self) -> &str {
        &self.provider_id
    }

    fn api_style(&self) -> ApiStyle {
        ApiStyle::AnthropicMessages
    }

    fn default_auth(&self) -> AuthScheme {
        AuthScheme::Header {
            name: "x-api-key".into(),
        }
    }

    fn build_request(
        &self,
        base_url: &str,
        request: &CompletionRequest,
    ) -> Result<DriverRequest, Error> {
        let (system, msgs) = Self::split_system_messages(request.messages());

        let mut body = serde_json::json!({
            "model": request.model(),
            "messages": msgs,
            "max_tokens": request.max_tokens(),
            "temperature": request.temperature(),
        });
        if let Some(sys) = system {
            body["system"] = Value::String(sys);
        }

        let mut headers = HashMap::new();
        headers.insert("anthropic-version".into(), ANTHROPIC_VERSION.into());

        Ok(DriverRequest {
            url: format!("{}/v1/messages", base_url),
            headers,
            body,
        })
    }

    fn parse_response(&self, body: &Value) -> Result<DriverResponse, Error> {
        // Join every text block; thinking/tool blocks are skipped.
        let texts: Vec<&str> = body
            .get("content")
            .and_then(|c| c.as_array())
            .map(|blocks| {
                blocks
                    .iter()
                    .filter(|b| b.get("type").and_then(|t| t.as_str()) == Some("text"))
                    .filter_map(|b| b.get("text").and_then(|t| t.as_str()))
                    .collect()
            })
            .unwrap_or_default();
        let content = if texts.is_empty() {
            None
        } else {
            Some(texts.concat())
        };

        let finish_reason = body
            .get("stop_reason")
            .and_then(|v| v.as_str())
            .map(|r| match r {
                "end_turn" => "stop".to_string(),
                "max_tokens" => "length".to_string(),
                other => other.to_string(),
            });

        let usage = body.get("usage").map(|u| {
            let input = u["input_tokens"].as_u64().unwrap_or(0);
            let output = u["output_tokens"].as_u64().unwrap_or(0);
            UsageInfo {
                prompt_tokens: input,
                completion_tokens: output,
                total_tokens: input + output,
            }
        });

        Ok(DriverResponse {
            content,
            finish_reason,
            usage,
        })
    }
}
