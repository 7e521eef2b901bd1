use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use uuid::Uuid;

use crate::client::{CompletionClient, CompletionClientBuilder};
use crate::config::{BestOfNConfig, SynthConfig};
use crate::pipeline::fan_out::FanOutExecutor;
use crate::pipeline::synthesize::Synthesizer;
use crate::telemetry::{noop_sink, RunCompleted, RunEvent, RunSink, RunStarted};
use crate::types::{CandidateSet, CompletionRequest, CompletionResult};
use crate::Result;

/// How a prompt should be answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseMode {
    /// One completion call at the request's own temperature.
    Standard,
    /// Best-of-N: `candidates` concurrent calls merged by one synthesis call.
    Pro { candidates: usize },
}

/// Everything a run produced.
#[derive(Debug, Clone, Serialize)]
pub struct BestOfNOutcome {
    pub run_id: Uuid,
    pub final_answer: CompletionResult,
    /// Empty in standard mode.
    pub candidates: CandidateSet,
    #[serde(serialize_with = "serialize_millis")]
    pub elapsed: Duration,
}

impl BestOfNOutcome {
    pub fn is_success(&self) -> bool {
        self.final_answer.is_ok()
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed.as_millis() as u64
    }
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

/// Fan-out followed by synthesis.
pub struct BestOfN {
    client: Arc<dyn CompletionClient>,
    fan_out: FanOutExecutor,
    synthesizer: Synthesizer,
    config: BestOfNConfig,
    sink: Arc<dyn RunSink>,
}

impl BestOfN {
    /// Rejects a config whose temperatures or token limits are inverted.
    pub fn new(client: Arc<dyn CompletionClient>, config: BestOfNConfig) -> Result<Self> {
        Ok(Self {
            fan_out: FanOutExecutor::new(client.clone(), config.clone())?,
            synthesizer: Synthesizer::new(client.clone(), config.clone())?,
            client,
            config,
            sink: noop_sink(),
        })
    }

    /// Build the HTTP client described by `config` and wrap it.
    pub fn from_config(config: &SynthConfig) -> Result<Self> {
        config.validate()?;
        let client = CompletionClientBuilder::new(config.provider.clone()).build()?;
        Self::new(Arc::new(client), config.best_of_n.clone())
    }

    pub fn with_sink(mut self, sink: Arc<dyn RunSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn config(&self) -> &BestOfNConfig {
        &self.config
    }

    pub fn fan_out(&self) -> &FanOutExecutor {
        &self.fan_out
    }

    pub fn synthesizer(&self) -> &Synthesizer {
        &self.synthesizer
    }

    /// Generate `n` candidates, then merge them.
    ///
    /// Synthesis always runs after the fan-out; with zero successes it resolves to a
    /// `NoCandidates` failure without a network call. Elapsed time covers both phases.
    ///
    /// # Panics
    ///
    /// Panics if `n == 0`.
    pub async fn best_of_n(&self, request: &CompletionRequest, n: usize) -> BestOfNOutcome {
        assert!(n > 0, "candidate count must be at least 1");
        let run_id = Uuid::new_v4();
        let effective = self.config.clamp_candidates(n);
        let started = Instant::now();

        self.report(RunEvent::Started(RunStarted::new(
            run_id,
            effective,
            request.model(),
        )))
        .await;

        let candidates = self
            .fan_out
            .generate_candidates(request, effective, self.config.candidate_temperature)
            .await;
        let final_answer = self.synthesizer.synthesize(request, &candidates).await;
        let elapsed = started.elapsed();

        info!(
            run_id = %run_id,
            n = effective,
            succeeded = candidates.success_count(),
            elapsed_ms = elapsed.as_millis() as u64,
            synthesized = final_answer.is_ok(),
            "best-of-n complete"
        );

        let mut completed = RunCompleted::new(run_id, elapsed.as_millis() as u64);
        completed.candidates_generated = candidates.len();
        completed.candidates_succeeded = candidates.success_count();
        completed.candidate_hashes = candidates.success_hashes();
        completed.synthesized = final_answer.is_ok();
        completed.failure_reason = final_answer.as_ref().err().map(|f| f.reason.clone());
        self.report(RunEvent::Completed(completed)).await;

        BestOfNOutcome {
            run_id,
            final_answer,
            candidates,
            elapsed,
        }
    }

    /// [`best_of_n`](Self::best_of_n) with the configured default candidate count.
    pub async fn best_of_default(&self, request: &CompletionRequest) -> BestOfNOutcome {
        self.best_of_n(request, self.config.default_candidates.max(1))
            .await
    }

    /// Answer in the given mode.
    pub async fn respond(&self, request: &CompletionRequest, mode: ResponseMode) -> BestOfNOutcome {
        match mode {
            ResponseMode::Pro { candidates } => self.best_of_n(request, candidates).await,
            ResponseMode::Standard => {
                let started = Instant::now();
                let final_answer = self.client.complete(request).await;
                BestOfNOutcome {
                    run_id: Uuid::new_v4(),
                    final_answer,
                    candidates: CandidateSet::empty(),
                    elapsed: started.elapsed(),
                }
            }
        }
    }

    async fn report(&self, event: RunEvent) {
        let name = event.name();
        if let Err(e) = self.sink.report(event).await {
            warn!(event = name, error = %e, "run sink rejected event");
        }
    }
}
