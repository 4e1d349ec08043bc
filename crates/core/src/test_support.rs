// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test-only builders shared across crates. Gated behind `test-support`
//! so downstream crates can depend on `clxo-core` with the feature
//! enabled in `[dev-dependencies]` only.

use crate::payload::{NotebookKind, NotebookPayload, OutputFormat};
use std::collections::HashMap;

pub fn sample_notebook_payload() -> NotebookPayload {
    NotebookPayload {
        notebook_text: "{\"cells\": []}".to_string(),
        input_file: "slides/topic.ipynb".to_string(),
        input_file_name: "topic.ipynb".to_string(),
        output_file: "output/topic.html".to_string(),
        kind: NotebookKind::Speaker,
        prog_lang: "python".to_string(),
        language: "en".to_string(),
        format: OutputFormat::Html,
        other_files: HashMap::new(),
        source_topic_dir: None,
        svg_available_stems: Vec::new(),
        img_path_prefix: "img/".to_string(),
        inline_images: false,
        fallback_execute: false,
    }
}
