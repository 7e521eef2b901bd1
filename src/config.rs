//! 配置模块：提供商端点、凭据与 Best-of-N 调优参数。
//!
//! Runtime configuration.
//!
//! Configuration is resolved once at startup (YAML file, then environment overrides)
//! and passed into the client and pipeline constructors. Nothing in the request path
//! reads the environment.
//!
//! ```yaml
//! provider:
//!   id: groq
//!   api_style: openai_compatible
//!   base_url: https://router.huggingface.co/v1
//!   model: openai/gpt-oss-120b:groq
//!   api_key_env: HF_TOKEN
//!   timeout_secs: 120
//! best_of_n:
//!   default_candidates: 5
//!   candidate_temperature: 0.9
//!   synthesis_temperature: 0.2
//! ```

use keyring::Entry;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, ErrorContext};
use crate::Result;

/// Keyring service name for stored API keys.
pub const KEYRING_SERVICE: &str = "ai-synth";
/// Hard ceiling on candidates per run.
pub const MAX_CANDIDATES_LIMIT: usize = 10;
/// Hard ceiling on retries per completion call.
pub const MAX_RETRIES_LIMIT: u32 = 1;

/// Vendor request/response shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiStyle {
    /// `/chat/completions` (OpenAI, Groq, xAI, DeepSeek, Hugging Face router, ...)
    #[serde(
        rename = "openai_compatible",
        alias = "openai",
        alias = "groq",
        alias = "grok",
        alias = "xai"
    )]
    OpenAiCompatible,
    /// Anthropic `/v1/messages`
    #[serde(alias = "anthropic", alias = "claude")]
    AnthropicMessages,
    /// Google `models/{model}:generateContent`
    #[serde(alias = "gemini", alias = "google")]
    GeminiGenerate,
}

impl ApiStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiStyle::OpenAiCompatible => "openai_compatible",
            ApiStyle::AnthropicMessages => "anthropic_messages",
            ApiStyle::GeminiGenerate => "gemini_generate",
        }
    }

    /// Parse the config/env spelling, accepting a few common aliases.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai_compatible" | "openai" | "groq" | "grok" | "xai" => {
                Some(ApiStyle::OpenAiCompatible)
            }
            "anthropic_messages" | "anthropic" | "claude" => Some(ApiStyle::AnthropicMessages),
            "gemini_generate" | "gemini" | "google" => Some(ApiStyle::GeminiGenerate),
            _ => None,
        }
    }

    /// Public endpoint used when no base URL is configured.
    pub fn default_base_url(&self) -> &'static str {
        match self {
            ApiStyle::OpenAiCompatible => "https://api.openai.com/v1",
            ApiStyle::AnthropicMessages => "https://api.anthropic.com",
            ApiStyle::GeminiGenerate => "https://generativelanguage.googleapis.com",
        }
    }
}

impl fmt::Display for ApiStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the API key is attached to a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthScheme {
    /// `Authorization: Bearer <key>`
    Bearer,
    /// `<name>: <key>`
    Header { name: String },
    /// `?<name>=<key>`
    Query { name: String },
}

/// Provider endpoint and transport settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider identifier; also the keyring user and the `{ID}_API_KEY` env prefix.
    pub id: String,
    pub api_style: ApiStyle,
    #[serde(default)]
    pub base_url: Option<String>,
    pub model: String,
    /// Inline key. Prefer the keyring or an env var.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    /// Name of the env var holding the key (e.g. `HF_TOKEN`).
    #[serde(default)]
    pub api_key_env: Option<String>,
    /// Overrides the driver's default auth placement.
    #[serde(default)]
    pub auth: Option<AuthScheme>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub proxy_url: Option<String>,
    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_timeout_secs() -> u64 {
    120
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("id", &self.id)
            .field("api_style", &self.api_style)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_key_env", &self.api_key_env)
            .field("auth", &self.auth)
            .field("timeout_secs", &self.timeout_secs)
            .field("proxy_url", &self.proxy_url)
            .field("retry", &self.retry)
            .finish()
    }
}

impl ProviderConfig {
    pub fn new(id: impl Into<String>, api_style: ApiStyle, model: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            api_style,
            base_url: None,
            model: model.into(),
            api_key: None,
            api_key_env: None,
            auth: None,
            timeout_secs: default_timeout_secs(),
            proxy_url: None,
            retry: RetryConfig::default(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_api_key_env(mut self, var: impl Into<String>) -> Self {
        self.api_key_env = Some(var.into());
        self
    }

    pub fn with_auth(mut self, auth: AuthScheme) -> Self {
        self.auth = Some(auth);
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Configured base URL without a trailing slash, or the style's public default.
    pub fn resolved_base_url(&self) -> String {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.api_style.default_base_url())
            .trim_end_matches('/')
            .to_string()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    /// Resolve the API key: inline value, OS keyring, `api_key_env`, then `{ID}_API_KEY`.
    pub fn resolve_api_key(&self) -> Option<String> {
        if let Some(key) = self.api_key.as_ref().filter(|k| !k.is_empty()) {
            return Some(key.clone());
        }

        if let Ok(entry) = Entry::new(KEYRING_SERVICE, &self.id) {
            if let Ok(key) = entry.get_password() {
                return Some(key);
            }
        }

        if let Some(var) = &self.api_key_env {
            if let Ok(key) = env::var(var) {
                if !key.is_empty() {
                    return Some(key);
                }
            }
        }

        let env_var = format!("{}_API_KEY", self.id.to_uppercase().replace('-', "_"));
        env::var(env_var).ok().filter(|k| !k.is_empty())
    }

    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(config_error("model must not be empty", "provider.model", None));
        }
        let base = self.resolved_base_url();
        let parsed = url::Url::parse(&base).map_err(|e| {
            config_error(
                "base_url is not a valid URL",
                "provider.base_url",
                Some(format!("{}: {}", base, e)),
            )
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(config_error(
                "base_url must use http or https",
                "provider.base_url",
                Some(base),
            ));
        }
        if let Some(proxy) = &self.proxy_url {
            url::Url::parse(proxy).map_err(|e| {
                config_error(
                    "proxy_url is not a valid URL",
                    "provider.proxy_url",
                    Some(e.to_string()),
                )
            })?;
        }
        if self.retry.max_retries > MAX_RETRIES_LIMIT {
            return Err(config_error(
                "at most one retry is allowed",
                "provider.retry.max_retries",
                Some(format!("got {}", self.retry.max_retries)),
            ));
        }
        Ok(())
    }
}

/// Bounded retry for transient failures (timeouts, 5xx). Off by default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default)]
    pub max_retries: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub delay_ms: u64,
}

fn default_retry_delay_ms() -> u64 {
    500
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 0,
            delay_ms: default_retry_delay_ms(),
        }
    }
}

impl RetryConfig {
    pub fn once(delay_ms: u64) -> Self {
        Self {
            max_retries: 1,
            delay_ms,
        }
    }
}

/// Fan-out and synthesis tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BestOfNConfig {
    pub default_candidates: usize,
    pub max_candidates: usize,
    pub candidate_temperature: f64,
    pub candidate_max_tokens: u32,
    pub synthesis_temperature: f64,
    pub synthesis_max_tokens: u32,
    /// Model for the synthesis call; the request's model when unset.
    pub synthesis_model: Option<String>,
    /// Temperature for standard (single-call) mode.
    pub standard_temperature: f64,
}

impl Default for BestOfNConfig {
    fn default() -> Self {
        Self {
            default_candidates: 5,
            max_candidates: MAX_CANDIDATES_LIMIT,
            candidate_temperature: 0.9,
            candidate_max_tokens: 2000,
            synthesis_temperature: 0.2,
            synthesis_max_tokens: 3000,
            synthesis_model: None,
            standard_temperature: 0.7,
        }
    }
}

impl BestOfNConfig {
    /// Clamp a requested candidate count into `[1, max_candidates]`.
    pub fn clamp_candidates(&self, n: usize) -> usize {
        n.clamp(1, self.max_candidates.clamp(1, MAX_CANDIDATES_LIMIT))
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_CANDIDATES_LIMIT).contains(&self.max_candidates) {
            return Err(config_error(
                "max_candidates out of range",
                "best_of_n.max_candidates",
                Some(format!(
                    "got {}, expected 1..={}",
                    self.max_candidates, MAX_CANDIDATES_LIMIT
                )),
            ));
        }
        if self.default_candidates == 0 || self.default_candidates > self.max_candidates {
            return Err(config_error(
                "default_candidates must be within 1..=max_candidates",
                "best_of_n.default_candidates",
                Some(format!("got {}", self.default_candidates)),
            ));
        }
        for (field, t) in [
            ("best_of_n.candidate_temperature", self.candidate_temperature),
            ("best_of_n.synthesis_temperature", self.synthesis_temperature),
            ("best_of_n.standard_temperature", self.standard_temperature),
        ] {
            if !(0.0..=1.0).contains(&t) {
                return Err(config_error(
                    "temperature out of range",
                    field,
                    Some(format!("got {}, expected 0.0..=1.0", t)),
                ));
            }
        }
        if self.candidate_temperature <= self.synthesis_temperature {
            return Err(config_error(
                "candidate_temperature must be greater than synthesis_temperature",
                "best_of_n.candidate_temperature",
                Some(format!(
                    "{} <= {}",
                    self.candidate_temperature, self.synthesis_temperature
                )),
            ));
        }
        if self.candidate_max_tokens == 0 || self.synthesis_max_tokens == 0 {
            return Err(config_error(
                "token limits must be greater than zero",
                "best_of_n",
                None,
            ));
        }
        if self.synthesis_max_tokens < self.candidate_max_tokens {
            return Err(config_error(
                "synthesis_max_tokens must be at least candidate_max_tokens",
                "best_of_n.synthesis_max_tokens",
                Some(format!(
                    "{} < {}",
                    self.synthesis_max_tokens, self.candidate_max_tokens
                )),
            ));
        }
        Ok(())
    }
}

/// Top-level configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthConfig {
    pub provider: ProviderConfig,
    #[serde(default)]
    pub best_of_n: BestOfNConfig,
}

impl SynthConfig {
    pub fn new(provider: ProviderConfig) -> Self {
        Self {
            provider,
            best_of_n: BestOfNConfig::default(),
        }
    }

    pub fn from_yaml_str(s: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(s)?)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            config_error(
                "failed to read config file",
                "config",
                Some(format!("{}: {}", path.display(), e)),
            )
        })?;
        Self::from_yaml_str(&raw)
    }

    /// Build a config purely from the environment (`AI_SYNTH_API_STYLE`, `AI_SYNTH_MODEL`, ...).
    pub fn from_env() -> Result<Self> {
        let style = env::var("AI_SYNTH_API_STYLE").unwrap_or_else(|_| "openai_compatible".into());
        let api_style = ApiStyle::parse(&style).ok_or_else(|| {
            config_error(
                "unknown api style",
                "AI_SYNTH_API_STYLE",
                Some(style.clone()),
            )
        })?;
        let model = env::var("AI_SYNTH_MODEL").map_err(|_| {
            config_error("AI_SYNTH_MODEL is not set", "AI_SYNTH_MODEL", None)
        })?;
        let id = env::var("AI_SYNTH_PROVIDER").unwrap_or_else(|_| "openai".into());
        let mut cfg = Self::new(ProviderConfig::new(id, api_style, model));
        cfg.apply_env_overrides()?;
        Ok(cfg)
    }

    /// Overlay environment variables onto loaded values.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|k| env::var(k).ok())
    }

    pub(crate) fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(style) = lookup("AI_SYNTH_API_STYLE") {
            self.provider.api_style = ApiStyle::parse(&style).ok_or_else(|| {
                config_error("unknown api style", "AI_SYNTH_API_STYLE", Some(style))
            })?;
        }
        if let Some(url) = lookup("AI_SYNTH_BASE_URL") {
            self.provider.base_url = Some(url);
        }
        if let Some(model) = lookup("AI_SYNTH_MODEL") {
            self.provider.model = model;
        }
        if let Some(secs) = lookup("AI_HTTP_TIMEOUT_SECS").and_then(|s| s.parse::<u64>().ok()) {
            self.provider.timeout_secs = secs;
        }
        if let Some(proxy) = lookup("AI_PROXY_URL") {
            self.provider.proxy_url = Some(proxy);
        }
        if let Some(n) = lookup("AI_SYNTH_CANDIDATES").and_then(|s| s.parse::<usize>().ok()) {
            self.best_of_n.default_candidates = n;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.provider.validate()?;
        self.best_of_n.validate()
    }
}

fn config_error(msg: &str, field: &str, details: Option<String>) -> Error {
    let mut ctx = ErrorContext::new()
        .with_field_path(field)
        .with_source("config_loader");
    if let Some(d) = details {
        ctx = ctx.with_details(d);
    }
    Error::configuration_with_context(msg, ctx)
}
