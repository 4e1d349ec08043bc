// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error/warning taxonomy shared by the worker loop, the Backend's
//! completion processing, and the Error Categorizer (`spec.md` §3, §7).

use serde::{Deserialize, Serialize};

/// Error taxonomy. Only `User` errors are ever cached — see the
/// caching rule at the bottom of `spec.md` §4.8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// A reproducible property of the input. Cached so a subsequent
    /// build of the same content hash short-circuits to the error.
    User,
    /// An environment problem (missing tool, unreadable mount). Never
    /// cached — the user may fix it between runs.
    Configuration,
    /// Transient or system-level (worker crash, timeout, database-busy
    /// exhaustion). Never cached — allowed to retry on the next build.
    Infrastructure,
}

impl ErrorType {
    /// Whether an error of this type is eligible for persistence in the
    /// Cache DB's `stored_errors` table.
    pub fn is_cacheable(self) -> bool {
        matches!(self, ErrorType::User)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorType::User => "user",
            ErrorType::Configuration => "configuration",
            ErrorType::Infrastructure => "infrastructure",
        }
    }
}

crate::simple_display! {
    ErrorType {
        User => "user",
        Configuration => "configuration",
        Infrastructure => "infrastructure",
    }
}

/// Severity. Only `Fatal` aborts the build mid-stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueSeverity {
    Warning,
    Error,
    Fatal,
}

impl IssueSeverity {
    pub fn as_str(self) -> &'static str {
        match self {
            IssueSeverity::Warning => "warning",
            IssueSeverity::Error => "error",
            IssueSeverity::Fatal => "fatal",
        }
    }
}

crate::simple_display! {
    IssueSeverity {
        Warning => "warning",
        Error => "error",
        Fatal => "fatal",
    }
}

/// A categorized error, persisted for `User` errors and always surfaced
/// to the reporter regardless of type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredIssue {
    pub input_file: String,
    pub content_hash: String,
    pub output_metadata: crate::result::OutputMetadata,
    pub error_type: ErrorType,
    pub category: String,
    pub severity: IssueSeverity,
    pub message: String,
    pub file_path: Option<String>,
    pub guidance: String,
    pub stored_at_ms: u64,
}

/// A warning produced by a handler and attached to a job's structured
/// result. Always stored, whether the job ultimately succeeds or fails.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Warning {
    pub category: String,
    pub message: String,
    pub severity: IssueSeverity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
}
