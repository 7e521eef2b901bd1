use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::client::CompletionClient;
use crate::config::BestOfNConfig;
use crate::types::{CandidateSet, CompletionRequest};

/// Issues N independent completion calls for the same input and waits for all of them.
pub struct FanOutExecutor {
    client: Arc<dyn CompletionClient>,
    config: BestOfNConfig,
}

impl FanOutExecutor {
    /// Fails when `config` does not pass [`BestOfNConfig::validate`].
    pub fn new(client: Arc<dyn CompletionClient>, config: BestOfNConfig) -> crate::Result<Self> {
        config.validate()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &BestOfNConfig {
        &self.config
    }

    /// Generate `n` candidates at `temperature`.
    ///
    /// `n` is clamped to `max_candidates`; the returned set always has exactly the
    /// effective `n` entries, in launch order, whatever mix of successes and
    /// failures the branches produced.
    ///
    /// # Panics
    ///
    /// Panics if `n == 0`.
    pub async fn generate_candidates(
        &self,
        request: &CompletionRequest,
        n: usize,
        temperature: f64,
    ) -> CandidateSet {
        assert!(n > 0, "candidate count must be at least 1");
        let effective = self.config.clamp_candidates(n);
        if effective != n {
            warn!(requested = n, effective, "candidate count clamped");
        }

        let branch_request = request
            .with_temperature(temperature)
            .with_max_tokens(self.config.candidate_max_tokens);

        let branches = (0..effective).map(|_| self.client.complete(&branch_request));
        let results = join_all(branches).await;

        for (index, result) in results.iter().enumerate() {
            match result {
                Ok(text) => debug!(index, chars = text.len(), "candidate succeeded"),
                Err(failure) => warn!(
                    index,
                    kind = %failure.kind,
                    status = ?failure.status,
                    reason = %failure.reason,
                    "candidate failed"
                ),
            }
        }

        CandidateSet::new(results)
    }
}
