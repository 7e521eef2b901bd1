//! Completion outcomes.
//!
//! A completion either yields text or a [`CompletionFailure`]. Failures are plain
//! values: the fan-out keeps collecting sibling branches when one of them fails.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Reason used when synthesis is skipped because every candidate failed.
pub const NO_SUCCESSFUL_CANDIDATES: &str = "no successful candidates";

/// `Ok(text)` or `Err(failure)`; never partially populated.
pub type CompletionResult = std::result::Result<String, CompletionFailure>;

/// Where a completion went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// No HTTP response: DNS, connect, TLS or timeout.
    Transport,
    /// HTTP response with a non-200 status.
    Protocol,
    /// HTTP 200 whose body lacks the expected text field.
    Contract,
    /// The request could not be encoded for this provider; nothing was sent.
    InvalidRequest,
    /// Synthesis skipped: no candidate succeeded.
    NoCandidates,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Transport => "transport",
            FailureKind::Protocol => "protocol",
            FailureKind::Contract => "contract",
            FailureKind::InvalidRequest => "invalid_request",
            FailureKind::NoCandidates => "no_candidates",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed completion: kind, human-readable reason, and the HTTP status when one was received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{reason}")]
pub struct CompletionFailure {
    pub kind: FailureKind,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl CompletionFailure {
    pub fn transport(reason: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Transport,
            reason: reason.into(),
            status: None,
        }
    }

    pub fn protocol(status: u16, reason: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Protocol,
            reason: reason.into(),
            status: Some(status),
        }
    }

    pub fn contract(reason: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Contract,
            reason: reason.into(),
            status: Some(200),
        }
    }

    pub fn invalid_request(reason: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::InvalidRequest,
            reason: reason.into(),
            status: None,
        }
    }

    pub fn no_candidates() -> Self {
        Self {
            kind: FailureKind::NoCandidates,
            reason: NO_SUCCESSFUL_CANDIDATES.to_string(),
            status: None,
        }
    }

    /// Server-side or network trouble that may clear up on its own.
    ///
    /// 4xx responses and contract violations are never transient.
    pub fn is_transient(&self) -> bool {
        match self.kind {
            FailureKind::Transport => true,
            FailureKind::Protocol => self.status.map(|s| (500..=599).contains(&s)).unwrap_or(false),
            FailureKind::Contract | FailureKind::InvalidRequest | FailureKind::NoCandidates => {
                false
            }
        }
    }
}
