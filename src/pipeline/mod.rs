//! 流水线模块：并发生成候选答案并合成为单一最终答案。
//!
//! # Best-of-N Pipeline
//!
//! Answers one request by sampling several candidates concurrently and merging them
//! with a final low-temperature call.
//!
//! ```text
//! CompletionRequest ─▶ FanOutExecutor ─▶ CandidateSet ─▶ Synthesizer ─▶ final answer
//!                        (N × complete,     [Ok|Err; N]     (1 × complete,
//!                         join on all)                       skipped if no Ok)
//! ```
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`FanOutExecutor`] | N concurrent calls at a high temperature |
//! | [`Synthesizer`] | Merges the successful candidates |
//! | [`BestOfN`] | Sequences both phases, times them, reports run events |
//!
//! ## Example
//!
//! ```rust,no_run
//! use ai_synth::config::SynthConfig;
//! use ai_synth::pipeline::BestOfN;
//! use ai_synth::types::{CompletionRequest, Message};
//!
//! # async fn run() -> ai_synth::Result<()> {
//! let config = SynthConfig::from_yaml_file("ai-synth.yaml")?;
//! let pipeline = BestOfN::from_config(&config)?;
//!
//! let request = CompletionRequest::new(
//!     config.provider.model.clone(),
//!     vec![Message::user("Explain borrow checking in two sentences")],
//! )?;
//! let outcome = pipeline.best_of_n(&request, 5).await;
//! println!("{:?}", outcome.final_answer);
//! # Ok(())
//! # }
//! ```

pub mod fan_out;
pub mod orchestrator;
pub mod synthesize;


pub use fan_out::FanOutExecutor;
pub use orchestrator::{BestOfN, BestOfNOutcome, ResponseMode};
pub use synthesize::{SynthesisRequest, SynthesisResult, Synthesizer, SYNTHESIS_INSTRUCTION};
