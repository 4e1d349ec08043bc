// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Terminal `Reporter` for `build`: colored one-line-per-event progress,
//! matching the workspace's own `color` module palette.

use crate::color::{context, header, literal};
use clxo_core::{IssueSeverity, StoredIssue, Warning};

pub struct TerminalReporter;

impl clxo_backend::Reporter for TerminalReporter {
    fn cache_hit(&self, input_file: &str, output_file: &str) {
        println!("{} {} -> {}", context("cached"), literal(input_file), literal(output_file));
    }

    fn job_submitted(&self, input_file: &str, output_file: &str) {
        println!("{} {} -> {}", context("submitted"), literal(input_file), literal(output_file));
    }

    fn job_completed(&self, input_file: &str, output_file: &str) {
        println!("{} {} -> {}", header("done"), literal(input_file), literal(output_file));
    }

    fn warning(&self, input_file: &str, warning: &Warning) {
        eprintln!("{} {}: {}", header("warning"), literal(input_file), warning.message);
    }

    fn error(&self, issue: &StoredIssue) {
        let label = match issue.severity {
            IssueSeverity::Fatal => "fatal",
            _ => "error",
        };
        eprintln!("{} {}: {} ({})", header(label), literal(&issue.input_file), issue.message, issue.category);
        if !issue.guidance.is_empty() {
            eprintln!("  {}", context(&issue.guidance));
        }
    }
}
