//! Validated, immutable completion request.

use serde::Serialize;

use crate::error::{Error, ErrorContext};
use crate::types::message::Message;
use crate::Result;

/// Sampling temperature used when the caller does not set one.
pub const DEFAULT_TEMPERATURE: f64 = 0.7;
/// Output limit used when the caller does not set one.
pub const DEFAULT_MAX_TOKENS: u32 = 2000;

/// A chat-completion request: message history, model and sampling parameters.
///
/// Construction validates every field; afterwards the value cannot be mutated.
/// The `with_*` methods return modified copies, which is how the fan-out and the
/// synthesizer derive their own sampling settings from the caller's request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    messages: Vec<Message>,
    model: String,
    temperature: f64,
    max_tokens: u32,
}

impl CompletionRequest {
    pub fn builder(model: impl Into<String>) -> CompletionRequestBuilder {
        CompletionRequestBuilder::new(model)
    }

    /// Shorthand for a request with default sampling.
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Result<Self> {
        Self::builder(model).messages(messages).build()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    /// Copy with a different temperature. Out-of-range values are clamped to `[0, 1]`.
    pub fn with_temperature(&self, temperature: f64) -> Self {
        Self {
            temperature: clamp_temperature(temperature),
            ..self.clone()
        }
    }

    /// Copy with a different output limit (at least 1).
    pub fn with_max_tokens(&self, max_tokens: u32) -> Self {
        Self {
            max_tokens: max_tokens.max(1),
            ..self.clone()
        }
    }

    /// Copy targeting a different model.
    pub fn with_model(&self, model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..self.clone()
        }
    }
}

pub(crate) fn clamp_temperature(t: f64) -> f64 {
    if t.is_nan() {
        return DEFAULT_TEMPERATURE;
    }
    t.clamp(0.0, 1.0)
}

/// Builder for [`CompletionRequest`].
#[derive(Debug, Clone)]
pub struct CompletionRequestBuilder {
    messages: Vec<Message>,
    model: String,
    temperature: f64,
    max_tokens: u32,
}

impl CompletionRequestBuilder {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            messages: Vec::new(),
            model: model.into(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn messages(mut self, messages: Vec<Message>) -> Self {
        self.messages = messages;
        self
    }

    pub fn message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    pub fn temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn build(self) -> Result<CompletionRequest> {
        if self.messages.is_empty() {
            return Err(Error::validation_with_context(
                "request must contain at least one message",
                ErrorContext::new()
                    .with_field_path("request.messages")
                    .with_source("request_validator"),
            ));
        }
        if self.model.trim().is_empty() {
            return Err(Error::validation_with_context(
                "model identifier must not be empty",
                ErrorContext::new()
                    .with_field_path("request.model")
                    .with_source("request_validator"),
            ));
        }
        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(Error::validation_with_context(
                "temperature out of range",
                ErrorContext::new()
                    .with_field_path("request.temperature")
                    .with_details(format!("got {}, expected 0.0..=1.0", self.temperature))
                    .with_source("request_validator"),
            ));
        }
        if self.max_tokens == 0 {
            return Err(Error::validation_with_context(
                "max_tokens must be greater than zero",
                ErrorContext::new()
                    .with_field_path("request.max_tokens")
                    .with_source("request_validator"),
            ));
        }

        Ok(CompletionRequest {
            messages: self.messages,
            model: self.model,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        })
    }
}
