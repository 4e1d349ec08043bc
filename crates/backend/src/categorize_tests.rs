// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use clxo_core::JobType;

fn key() -> OutputMetadata {
    OutputMetadata::new("kind=speaker:lang=en:prog_lang=python:format=html")
}

#[test]
fn notebook_syntax_error_is_user_and_cacheable() {
    let issue = categorize(
        JobType::Notebook,
        "topic.ipynb",
        "deadbeef",
        &key(),
        r#"{"error_class": "SyntaxError", "error_message": "invalid syntax in cell #3"}"#,
    );
    assert_eq!(issue.error_type, ErrorType::User);
    assert!(issue.error_type.is_cacheable());
    assert_eq!(issue.category, "notebook_compilation");
}

#[test]
fn notebook_timeout_is_infrastructure_and_not_cacheable() {
    let issue = categorize(
        JobType::Notebook,
        "topic.ipynb",
        "deadbeef",
        &key(),
        "TimeoutError: worker did not respond in time",
    );
    assert_eq!(issue.error_type, ErrorType::Infrastructure);
    assert!(!issue.error_type.is_cacheable());
}

#[test]
fn plantuml_missing_jar_is_configuration() {
    let issue = categorize(
        JobType::PlantUml,
        "diagram.puml",
        "deadbeef",
        &key(),
        "PLANTUML_JAR is not set, cannot invoke java",
    );
    assert_eq!(issue.error_type, ErrorType::Configuration);
    assert_eq!(issue.category, "missing_tool");
}

#[test]
fn plantuml_command_not_found_is_configuration() {
    let issue = categorize(
        JobType::PlantUml,
        "diagram.puml",
        "deadbeef",
        &key(),
        "java: command not found",
    );
    assert_eq!(issue.error_type, ErrorType::Configuration);
}

#[test]
fn drawio_crash_is_infrastructure() {
    let issue = categorize(
        JobType::Drawio,
        "diagram.drawio",
        "deadbeef",
        &key(),
        "Fatal error in v8::Isolate, DisallowJavascriptExecutionScope triggered",
    );
    assert_eq!(issue.error_type, ErrorType::Infrastructure);
    assert_eq!(issue.category, "drawio_crash");
}

#[test]
fn drawio_default_is_user_syntax_error() {
    let issue = categorize(
        JobType::Drawio,
        "diagram.drawio",
        "deadbeef",
        &key(),
        "unexpected node type in diagram XML",
    );
    assert_eq!(issue.error_type, ErrorType::User);
    assert_eq!(issue.category, "diagram_syntax");
}

#[test]
fn ansi_sequences_are_stripped_before_matching() {
    let issue = categorize(
        JobType::Notebook,
        "topic.ipynb",
        "deadbeef",
        &key(),
        "\u{1b}[31mSyntaxError\u{1b}[0m: invalid syntax",
    );
    assert_eq!(issue.error_type, ErrorType::User);
    assert!(!issue.message.contains('\u{1b}'));
}

#[test]
fn no_workers_error_is_fatal_infrastructure() {
    let issue = no_workers_error(JobType::Notebook);
    assert_eq!(issue.error_type, ErrorType::Infrastructure);
    assert_eq!(issue.severity, IssueSeverity::Fatal);
}
