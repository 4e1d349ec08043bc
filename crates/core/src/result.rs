// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cached artifact types (`spec.md` §3, §4.2).

use crate::id::CorrelationId;
use serde::{Deserialize, Serialize};

/// Canonicalized, order-independent discriminator string for multi-output
/// jobs (kind, language, format, ...). Two payloads that would produce
/// byte-identical output for the same input must canonicalize to the
/// same `OutputMetadata`; two that would produce different output must
/// not collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutputMetadata(String);

impl OutputMetadata {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OutputMetadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A cached successful artifact (`spec.md` §3's `Result`). Named
/// `CachedResult` to avoid colliding with `std::result::Result`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CachedResult {
    Notebook(String),
    Image(Vec<u8>),
}

impl CachedResult {
    pub fn result_bytes(&self) -> &[u8] {
        match self {
            CachedResult::Notebook(s) => s.as_bytes(),
            CachedResult::Image(b) => b,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            CachedResult::Notebook(_) => "notebook-result",
            CachedResult::Image(_) => "image-result",
        }
    }
}

/// A versioned cache entry as returned by `get_result` / stored by
/// `store_latest_result`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredResult {
    pub input_file: String,
    pub content_hash: String,
    pub output_metadata: OutputMetadata,
    pub correlation_id: CorrelationId,
    pub source_file: String,
    pub result: CachedResult,
    pub stored_at_ms: u64,
}

#[cfg(test)]
#[path = "result_tests.rs"]
mod tests;
