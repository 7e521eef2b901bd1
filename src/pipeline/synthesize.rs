use std::fmt::Write as _;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::client::CompletionClient;
use crate::config::BestOfNConfig;
use crate::types::{
    CandidateSet, CompletionFailure, CompletionRequest, CompletionResult, Message,
};

/// System instruction for the synthesis call.
pub const SYNTHESIS_INSTRUCTION: &str = "You are an expert editor. Synthesize ONE best answer \
from the candidate answers provided, merging strengths, correcting errors, and removing \
repetition. Do not mention the candidates or the synthesis process. Be decisive and clear.";

/// Merge step output; same shape as a single completion.
pub type SynthesisResult = CompletionResult;

/// The successful candidates of one fan-out, ready to be merged.
///
/// Only constructible from a set with at least one success.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisRequest {
    model: String,
    candidates: Vec<String>,
}

impl SynthesisRequest {
    /// `None` when no candidate succeeded.
    pub fn from_candidates(model: impl Into<String>, set: &CandidateSet) -> Option<Self> {
        let candidates: Vec<String> = set.successes().map(str::to_owned).collect();
        if candidates.is_empty() {
            return None;
        }
        Some(Self {
            model: model.into(),
            candidates,
        })
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    /// User turn carrying the numbered candidates, 1-based in original order.
    pub fn prompt(&self) -> String {
        let mut out = format!(
            "You are given {} candidate answers delimited by tags.\n\n",
            self.candidates.len()
        );
        for (i, text) in self.candidates.iter().enumerate() {
            let _ = write!(out, "<candidate id=\"{}\">\n{}\n</candidate>\n", i + 1, text);
        }
        out.push_str("\nReturn the single best final answer.");
        out
    }

    /// Build the synthesis call with the given sampling settings.
    pub fn to_completion_request(
        &self,
        temperature: f64,
        max_tokens: u32,
    ) -> crate::Result<CompletionRequest> {
        CompletionRequest::builder(self.model.clone())
            .message(Message::system(SYNTHESIS_INSTRUCTION))
            .message(Message::user(self.prompt()))
            .temperature(temperature)
            .max_tokens(max_tokens)
            .build()
    }
}

/// Merges successful candidates with one low-temperature completion call.
pub struct Synthesizer {
    client: Arc<dyn CompletionClient>,
    config: BestOfNConfig,
}

impl Synthesizer {
    pub fn new(client: Arc<dyn CompletionClient>, config: BestOfNConfig) -> crate::Result<Self> {
        config.validate()?;
        Ok(Self { client, config })
    }

    /// Merge `candidates` into one answer.
    ///
    /// Returns a `NoCandidates` failure without any call when nothing succeeded;
    /// otherwise exactly one completion call is made and its result returned as is.
    pub async fn synthesize(
        &self,
        request: &CompletionRequest,
        candidates: &CandidateSet,
    ) -> SynthesisResult {
        let model = self
            .config
            .synthesis_model
            .as_deref()
            .unwrap_or_else(|| request.model());

        let Some(synthesis) = SynthesisRequest::from_candidates(model, candidates) else {
            warn!(
                candidates = candidates.len(),
                "every candidate failed, skipping synthesis"
            );
            return Err(CompletionFailure::no_candidates());
        };

        let call = synthesis
            .to_completion_request(
                self.config.synthesis_temperature,
                self.config.synthesis_max_tokens,
            )
            .map_err(|e| CompletionFailure::invalid_request(e.to_string()))?;

        debug!(
            merged = synthesis.candidates().len(),
            model = call.model(),
            temperature = call.temperature(),
            "synthesizing candidates"
        );
        self.client.complete(&call).await
    }
}
