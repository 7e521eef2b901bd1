//! Completion client.
//!
//! [`CompletionClient`] is the seam the pipeline is written against; the HTTP
//! implementation lives in `src/client/` and is built with [`CompletionClientBuilder`].

pub mod builder;
pub mod core;
mod error_classification;
mod policy;

pub use builder::CompletionClientBuilder;
pub use self::core::{CompletionClient, HttpCompletionClient};
