//! # ai-synth
//!
//! 并发生成多个候选答案，再由一次低温度调用合成为单一最佳答案（Best-of-N / Pro Mode）。
//!
//! Best-of-N response synthesis over chat-completion APIs.
//!
//! ## Overview
//!
//! A request is answered either directly (standard mode) or by sampling N candidates
//! concurrently at a high temperature and merging the successful ones with a final
//! low-temperature synthesis call (pro mode). Failed candidate calls are values, not
//! errors: one bad branch never takes down the others, and synthesis is skipped only
//! when nothing succeeded.
//!
//! Three vendor wire formats are supported: OpenAI-compatible chat completions,
//! Anthropic Messages and Gemini `generateContent`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ai_synth::{BestOfN, CompletionRequest, Message, SynthConfig};
//!
//! #[tokio::main]
//! async fn main() -> ai_synth::Result<()> {
//!     let config = SynthConfig::from_env()?;
//!     let pipeline = BestOfN::from_config(&config)?;
//!
//!     let request = CompletionRequest::new(
//!         config.provider.model.clone(),
//!         vec![Message::user("What causes the seasons?")],
//!     )?;
//!     let outcome = pipeline.best_of_n(&request, 5).await;
//!     match outcome.final_answer {
//!         Ok(text) => println!("{text}"),
//!         Err(failure) => eprintln!("failed: {failure}"),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`types`] | Messages, requests, completion results, candidate sets |
//! | [`config`] | YAML/env configuration and credential lookup |
//! | [`drivers`] | Vendor request/response adapters |
//! | [`transport`] | HTTP transport |
//! | [`client`] | `CompletionClient` trait and HTTP implementation |
//! | [`pipeline`] | Fan-out, synthesis and orchestration |
//! | [`telemetry`] | Run start/complete events |

pub mod client;
pub mod config;
pub mod drivers;
pub mod pipeline;
pub mod telemetry;
pub mod transport;
pub mod types;

// Re-export main types for convenience
pub use client::{CompletionClient, CompletionClientBuilder, HttpCompletionClient};
pub use config::{ApiStyle, BestOfNConfig, ProviderConfig, SynthConfig};
pub use pipeline::{BestOfN, BestOfNOutcome, ResponseMode};
pub use telemetry::{RunEvent, RunSink};
pub use types::{
    CandidateSet, CompletionFailure, CompletionRequest, CompletionResult, FailureKind, Message,
    MessageRole,
};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
