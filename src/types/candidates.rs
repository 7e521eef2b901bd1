//! Per-branch results of one fan-out.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::result::{CompletionFailure, CompletionResult};

/// Ordered results of a fan-out, index-aligned to branch launch order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidateSet {
    results: Vec<CompletionResult>,
}

impl CandidateSet {
    pub fn new(results: Vec<CompletionResult>) -> Self {
        Self { results }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&CompletionResult> {
        self.results.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CompletionResult> {
        self.results.iter()
    }

    /// Successful candidate texts in branch order.
    pub fn successes(&self) -> impl Iterator<Item = &str> {
        self.results.iter().filter_map(|r| r.as_deref().ok())
    }

    /// Failed branches with their launch index.
    pub fn failures(&self) -> impl Iterator<Item = (usize, &CompletionFailure)> {
        self.results
            .iter()
            .enumerate()
            .filter_map(|(i, r)| r.as_ref().err().map(|e| (i, e)))
    }

    pub fn success_count(&self) -> usize {
        self.successes().count()
    }

    pub fn all_failed(&self) -> bool {
        self.success_count() == 0
    }

    /// SHA-256 of every successful candidate, hex encoded, in branch order.
    pub fn success_hashes(&self) -> Vec<String> {
        self.successes()
            .map(|text| format!("{:x}", Sha256::digest(text.as_bytes())))
            .collect()
    }

    pub fn into_inner(self) -> Vec<CompletionResult> {
        self.results
    }
}

impl From<Vec<CompletionResult>> for CandidateSet {
    fn from(results: Vec<CompletionResult>) -> Self {
        Self::new(results)
    }
}

impl<'a> IntoIterator for &'a CandidateSet {
    type Item = &'a CompletionResult;
    type IntoIter = std::slice::Iter<'a, CompletionResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}
