//! 类型系统模块：请求、结果与候选集合的核心数据类型。
//!
//! # Types Module
//!
//! Core data model for the best-of-N pipeline.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Message`] | Chat message with role and text content |
//! | [`CompletionRequest`] | Validated, immutable request (messages, model, sampling) |
//! | [`CompletionResult`] | `Ok(text)` or [`CompletionFailure`] |
//! | [`CandidateSet`] | Fan-out results, index-aligned to launch order |
//!
//! ## Example
//!
//! ```rust
//! use ai_synth::types::{CompletionRequest, Message};
//!
//! let request = CompletionRequest::builder("gpt-4o-mini")
//!     .message(Message::system("You are a helpful assistant"))
//!     .message(Message::user("Name three primary colors"))
//!     .temperature(0.7)
//!     .build()
//!     .unwrap();
//! assert_eq!(request.messages().len(), 2);
//! ```

pub mod candidates;
pub mod message;
pub mod request;
pub mod result;

pub use candidates::CandidateSet;
pub use message::{Message, MessageRole};
pub use request::{CompletionRequest, CompletionRequestBuilder};
pub use result::{CompletionFailure, CompletionResult, FailureKind, NO_SUCCESSFUL_CANDIDATES};
