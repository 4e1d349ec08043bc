// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Error Categorizer (`spec.md` §4.8): turns a raw worker error
//! string into a taxonomy-tagged `StoredIssue` with fixed guidance.
//! Pattern tables are grounded on `original_source/src/clm/cli/
//! error_categorizer.py`'s job-type dispatch.

use clxo_core::{ErrorType, IssueSeverity, JobType, OutputMetadata, StoredIssue};

/// Strip ANSI CSI escape sequences (`ESC [ ... letter`), matching what
/// the worker loop's own stderr capture leaves in an error string.
fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\u{1b}' && chars.peek() == Some(&'[') {
            chars.next();
            while let Some(&next) = chars.peek() {
                chars.next();
                if next.is_ascii_alphabetic() {
                    break;
                }
            }
            continue;
        }
        out.push(c);
    }
    out
}

#[derive(Debug, serde::Deserialize)]
struct StructuredError {
    #[serde(default)]
    error_class: String,
    #[serde(default)]
    error_message: String,
}

/// Parse a raw worker error: JSON `{error_class, error_message,
/// traceback}` if possible, otherwise the whole string is the message.
fn parse_error(raw: &str) -> (String, String) {
    let cleaned = strip_ansi(raw);
    if let Ok(structured) = serde_json::from_str::<StructuredError>(&cleaned) {
        if !structured.error_message.is_empty() || !structured.error_class.is_empty() {
            return (strip_ansi(&structured.error_class), strip_ansi(&structured.error_message));
        }
    }
    (String::new(), cleaned)
}

fn categorize_notebook(message: &str, error_class: &str) -> (ErrorType, &'static str, String) {
    let haystack = format!("{error_class} {message}");
    if ["SyntaxError", "NameError", "IndentationError", "TypeError"]
        .iter()
        .any(|pat| haystack.contains(pat))
    {
        return (
            ErrorType::User,
            "notebook_compilation",
            format!("Fix the {} in your notebook", if error_class.is_empty() { "error" } else { error_class }),
        );
    }
    if message.contains("FileNotFoundError") && message.to_lowercase().contains("template") {
        return (
            ErrorType::Configuration,
            "missing_template",
            "Ensure Jinja templates are available in the template directory".to_string(),
        );
    }
    if message.contains("TimeoutError") || message.to_lowercase().contains("worker") {
        return (
            ErrorType::Infrastructure,
            "worker_timeout",
            "Worker timed out. Check worker health with the status command".to_string(),
        );
    }
    if message.contains("ModuleNotFoundError") || message.contains("ImportError") {
        return (
            ErrorType::User,
            "missing_module",
            "Install the required module or check your imports".to_string(),
        );
    }
    if message.contains("CellExecutionError") {
        return (ErrorType::User, "cell_execution", "Fix the error in your notebook".to_string());
    }
    (ErrorType::User, "notebook_processing", "Check your notebook for errors".to_string())
}

/// Shared between PlantUML and Draw.io: both are subprocess-calling
/// image converters whose tool-missing/input-missing/crash patterns are
/// identical except for the tool name and file extension.
fn categorize_image_tool(
    message: &str,
    error_class: &str,
    tool_env_var: &str,
    tool_name: &str,
    input_ext: &str,
) -> (ErrorType, &'static str, String) {
    let lower = message.to_lowercase();

    let is_missing_tool = message.contains(tool_env_var)
        || lower.contains(&format!("{tool_name} not found"))
        || lower.contains(&format!("{tool_name}: command not found"))
        || lower.contains(&format!("{tool_name}: not found"))
        || (lower.contains("command failed with non-retriable error")
            && (lower.contains("errno 2") || lower.contains("filenotfounderror"))
            && !lower.contains(tool_name));

    if is_missing_tool {
        return (
            ErrorType::Configuration,
            "missing_tool",
            format!(
                "Install {tool_name} and set the {tool_env_var} environment variable. \
                 See documentation for setup instructions."
            ),
        );
    }

    let is_input_missing = lower.contains("input file not found")
        || (error_class == "FileNotFoundError" && lower.contains("input"))
        || (lower.contains("no such file or directory") && lower.contains(input_ext));

    if is_input_missing {
        let guidance = if lower.contains("docker container") || lower.contains("docker mount") {
            "The input file could not be found inside the container. Verify the file exists \
             on the host, the data directory is correctly specified, and the mount is visible \
             to the worker."
                .to_string()
        } else {
            "The input file could not be found. Verify the file path is correct and the file \
             exists."
                .to_string()
        };
        return (ErrorType::Configuration, "missing_input_file", guidance);
    }

    if lower.contains("disallowjavascriptexecutionscope")
        || lower.contains("fatal error in")
        || lower.contains("v8 error")
    {
        return (
            ErrorType::Infrastructure,
            "drawio_crash",
            "The renderer crashed during conversion. This may be transient — try the build \
             again, or check the tool installation."
                .to_string(),
        );
    }

    (ErrorType::User, "diagram_syntax", format!("Check your {tool_name} diagram syntax"))
}

/// Categorize one failed job's raw error string into a `StoredIssue`.
/// Caller decides whether to persist it — only `ErrorType::User` results
/// are ever cached (`spec.md` §4.8's caching rule).
pub fn categorize(
    job_type: JobType,
    input_file: &str,
    content_hash: &str,
    output_metadata: &OutputMetadata,
    raw_error: &str,
) -> StoredIssue {
    let (error_class, message) = parse_error(raw_error);

    let (error_type, category, guidance) = match job_type {
        JobType::Notebook => categorize_notebook(&message, &error_class),
        JobType::PlantUml => {
            categorize_image_tool(&message, &error_class, "PLANTUML_JAR", "plantuml", ".puml")
        }
        JobType::Drawio => {
            categorize_image_tool(&message, &error_class, "DRAWIO_EXECUTABLE", "drawio", ".drawio")
        }
    };

    StoredIssue {
        input_file: input_file.to_string(),
        content_hash: content_hash.to_string(),
        output_metadata: output_metadata.clone(),
        error_type,
        category: category.to_string(),
        severity: IssueSeverity::Error,
        message,
        file_path: Some(input_file.to_string()),
        guidance,
        stored_at_ms: clxo_storage::now_ms(),
    }
}

/// The fixed fatal error the Backend raises when `execute_operation`'s
/// worker-availability gate finds zero workers after the bounded wait.
pub fn no_workers_error(job_type: JobType) -> StoredIssue {
    StoredIssue {
        input_file: String::new(),
        content_hash: String::new(),
        output_metadata: OutputMetadata::new(""),
        error_type: ErrorType::Infrastructure,
        category: "no_workers".to_string(),
        severity: IssueSeverity::Fatal,
        message: format!("no workers available for job type '{job_type}'"),
        file_path: None,
        guidance: "Start workers with start-services, or check worker health with status".to_string(),
        stored_at_ms: clxo_storage::now_ms(),
    }
}

#[cfg(test)]
#[path = "categorize_tests.rs"]
mod tests;
