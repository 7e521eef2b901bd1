//! Run lifecycle events.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

fn timestamp() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// Emitted before the fan-out starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStarted {
    pub run_id: Uuid,
    pub candidate_count: usize,
    pub model: String,
    pub timestamp: f64,
}

impl RunStarted {
    pub fn new(run_id: Uuid, candidate_count: usize, model: impl Into<String>) -> Self {
        Self {
            run_id,
            candidate_count,
            model: model.into(),
            timestamp: timestamp(),
        }
    }
}

/// Emitted after synthesis resolved (or was skipped).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunCompleted {
    pub run_id: Uuid,
    pub elapsed_ms: u64,
    pub candidates_generated: usize,
    pub candidates_succeeded: usize,
    /// SHA-256 of each successful candidate, for correlating stored audits without the text.
    pub candidate_hashes: Vec<String>,
    /// Whether the final answer is `Ok`.
    pub synthesized: bool,
    pub failure_reason: Option<String>,
    pub timestamp: f64,
}

impl RunCompleted {
    pub fn new(run_id: Uuid, elapsed_ms: u64) -> Self {
        Self {
            run_id,
            elapsed_ms,
            candidates_generated: 0,
            candidates_succeeded: 0,
            candidate_hashes: Vec::new(),
            synthesized: false,
            failure_reason: None,
            timestamp: timestamp(),
        }
    }
}

/// Typed run event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunEvent {
    Started(RunStarted),
    Completed(RunCompleted),
}

impl RunEvent {
    pub fn run_id(&self) -> Uuid {
        match self {
            RunEvent::Started(e) => e.run_id,
            RunEvent::Completed(e) => e.run_id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RunEvent::Started(_) => "run_started",
            RunEvent::Completed(_) => "run_completed",
        }
    }
}
