use tracing::warn;

use crate::client::core::HttpCompletionClient;
use crate::client::policy::RetryPolicy;
use crate::config::ProviderConfig;
use crate::drivers::create_driver;
use crate::transport::HttpTransport;
use crate::Result;

/// Builder for [`HttpCompletionClient`].
///
/// Keep this surface area small and predictable.
pub struct CompletionClientBuilder {
    config: ProviderConfig,
    api_key: Option<String>,
    /// Override base URL (primarily for testing with mock servers)
    base_url_override: Option<String>,
}

impl CompletionClientBuilder {
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            config,
            api_key: None,
            base_url_override: None,
        }
    }

    /// Use this key instead of resolving one from the keyring or environment.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Override the configured base URL.
    pub fn base_url_override(mut self, base_url: impl Into<String>) -> Self {
        self.base_url_override = Some(base_url.into());
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<HttpCompletionClient> {
        let mut config = self.config;
        if let Some(url) = self.base_url_override {
            config.base_url = Some(url);
        }
        config.validate()?;

        let driver = create_driver(config.api_style, &config.id);
        let auth = config.auth.clone().unwrap_or_else(|| driver.default_auth());

        let api_key = self.api_key.or_else(|| config.resolve_api_key());
        if api_key.is_none() {
            warn!(
                provider = %config.id,
                "no API key found (keyring, api_key_env, {}_API_KEY); sending unauthenticated requests",
                config.id.to_uppercase()
            );
        }

        let transport = HttpTransport::new(&config, api_key, auth)?;

        Ok(HttpCompletionClient {
            driver,
            transport,
            base_url: config.resolved_base_url(),
            policy: RetryPolicy::new(&config.retry),
            attempt_timeout: config.timeout(),
        })
    }
}
