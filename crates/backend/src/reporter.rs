// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Progress/issue sink the Backend notifies as it resolves operations.
//! Mirrors the seam `clxo_worker::JobHandler` puts at the subprocess
//! boundary: a trait object so the CLI's terminal reporter and a future
//! dashboard can both drive the same Backend.

use clxo_core::{StoredIssue, Warning};

pub trait Reporter: Send + Sync {
    fn cache_hit(&self, input_file: &str, output_file: &str) {
        tracing::debug!(input_file, output_file, "cache hit");
    }

    fn job_submitted(&self, input_file: &str, output_file: &str) {
        tracing::debug!(input_file, output_file, "job submitted");
    }

    fn job_completed(&self, input_file: &str, output_file: &str) {
        tracing::info!(input_file, output_file, "job completed");
    }

    fn warning(&self, input_file: &str, warning: &Warning) {
        tracing::warn!(input_file, category = %warning.category, message = %warning.message, "warning");
    }

    fn error(&self, issue: &StoredIssue) {
        tracing::error!(
            input_file = %issue.input_file,
            category = %issue.category,
            error_type = %issue.error_type,
            message = %issue.message,
            "build error"
        );
    }
}

/// Silences everything — used by tests and any caller that only cares
/// about `wait_for_completion`'s return value.
pub struct NullReporter;

impl Reporter for NullReporter {}

/// Default reporter, logging through `tracing` at the levels above.
pub struct LoggingReporter;

impl Reporter for LoggingReporter {}
