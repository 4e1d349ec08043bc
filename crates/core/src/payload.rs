// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job payloads.
//!
//! The original implementation carries a per-type parameter dict (a
//! dynamic `Payload` base class with per-job-type subclasses). Design
//! Notes call for replacing that with a tagged sum of concrete payload
//! types, serialized to JSON at the DB boundary — workers deserialize
//! only the variant matching their own `job_type`; a mismatch is a
//! protocol error, not a runtime dict-key lookup failure.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Which flavor of derivative a notebook payload targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotebookKind {
    Speaker,
    Completed,
    CodeAlong,
}

impl NotebookKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NotebookKind::Speaker => "speaker",
            NotebookKind::Completed => "completed",
            NotebookKind::CodeAlong => "code_along",
        }
    }
}

crate::simple_display! {
    NotebookKind {
        Speaker => "speaker",
        Completed => "completed",
        CodeAlong => "code_along",
    }
}

/// Output shape requested for a notebook job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    Notebook,
    Html,
    Code,
    EditScript,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Notebook => "notebook",
            OutputFormat::Html => "html",
            OutputFormat::Code => "code",
            OutputFormat::EditScript => "edit_script",
        }
    }
}

crate::simple_display! {
    OutputFormat {
        Notebook => "notebook",
        Html => "html",
        Code => "code",
        EditScript => "edit_script",
    }
}

/// Parameters for a notebook job (`spec.md` §6's worker-to-job payload
/// contract). `other_files` holds supporting data needed at execution
/// time; bytes fields are base64-encoded only at the wire/DB boundary,
/// kept as raw `Vec<u8>` here for in-process use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotebookPayload {
    pub notebook_text: String,
    pub input_file: String,
    pub input_file_name: String,
    pub output_file: String,
    pub kind: NotebookKind,
    pub prog_lang: String,
    pub language: String,
    pub format: OutputFormat,
    #[serde(default)]
    pub other_files: HashMap<String, Vec<u8>>,
    /// Present only when a read-only source-data mount is available to
    /// the worker (containerized execution), letting the handler read
    /// large auxiliary files directly instead of through `other_files`.
    #[serde(default)]
    pub source_topic_dir: Option<String>,
    /// Stems with a pre-rendered SVG available, used to rewrite inline
    /// PNG references to SVG where possible.
    #[serde(default)]
    pub svg_available_stems: Vec<String>,
    #[serde(default)]
    pub img_path_prefix: String,
    #[serde(default)]
    pub inline_images: bool,
    /// If execution fails and this is set, fall back to rendering from
    /// the last successfully executed cell outputs rather than failing
    /// the whole job outright.
    #[serde(default)]
    pub fallback_execute: bool,
}

/// Parameters shared by the two image-converter job types (PlantUML,
/// Draw.io). Both take a diagram source file and emit raster/SVG bytes;
/// neither needs execution-reuse-cache fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImagePayload {
    pub source_text: String,
    pub input_file: String,
    pub output_file: String,
    /// Output image format, e.g. "png" or "svg".
    pub format: String,
}

/// The tagged-sum job payload. `JobType` (stored alongside on the `Job`
/// row) determines which variant a worker expects; a worker receiving
/// the wrong variant treats it as a protocol error rather than
/// attempting best-effort interpretation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "job_type", rename_all = "snake_case")]
pub enum JobPayload {
    Notebook(NotebookPayload),
    PlantUml(ImagePayload),
    Drawio(ImagePayload),
}

impl JobPayload {
    pub fn job_type(&self) -> crate::job::JobType {
        match self {
            JobPayload::Notebook(_) => crate::job::JobType::Notebook,
            JobPayload::PlantUml(_) => crate::job::JobType::PlantUml,
            JobPayload::Drawio(_) => crate::job::JobType::Drawio,
        }
    }

    /// Canonicalize the output-discriminating fields into the cache
    /// key's `output_metadata` string (`spec.md` §4.2). Scheduling-only
    /// fields (correlation id, other_files bytes) are deliberately
    /// excluded — they never affect the produced bytes.
    pub fn output_metadata(&self) -> crate::result::OutputMetadata {
        match self {
            JobPayload::Notebook(p) => crate::result::OutputMetadata::new(format!(
                "kind={}:lang={}:prog_lang={}:format={}",
                p.kind, p.language, p.prog_lang, p.format
            )),
            JobPayload::PlantUml(p) | JobPayload::Drawio(p) => {
                crate::result::OutputMetadata::new(format!("format={}", p.format))
            }
        }
    }
}

#[cfg(test)]
#[path = "payload_tests.rs"]
mod tests;
