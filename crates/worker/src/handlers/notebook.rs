// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Notebook job handler. Execution and rendering of the notebook itself
//! is an external collaborator's job; this handler's only responsibility
//! is handing the payload to `$CLXO_NOTEBOOK_RENDERER` as JSON on stdin
//! and returning its stdout as the output bytes.

use crate::handler::{HandlerContext, HandlerError, HandlerOutput, JobHandler};
use crate::tool::run_piped;
use async_trait::async_trait;
use clxo_core::{Job, JobPayload, JobType, NotebookKind};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(300);

/// Wire shape handed to the renderer on stdin. Mirrors `NotebookPayload`
/// plus the paths the renderer needs but the payload doesn't carry.
#[derive(Serialize)]
struct RenderRequest<'a> {
    notebook_text: &'a str,
    input_file: &'a str,
    input_file_name: &'a str,
    kind: clxo_core::NotebookKind,
    prog_lang: &'a str,
    language: &'a str,
    format: clxo_core::OutputFormat,
    source_topic_dir: &'a Option<String>,
    svg_available_stems: &'a [String],
    img_path_prefix: &'a str,
    inline_images: bool,
    fallback_execute: bool,
    workspace_root: &'a std::path::Path,
    /// A previously executed notebook (cell outputs included) for this
    /// same `(input_file, content_hash, language, prog_lang)` key, if the
    /// execution-reuse cache had one — lets the renderer derive this
    /// output without re-running code cells (`spec.md` §4.2).
    executed_notebook: Option<&'a str>,
}

/// Wire shape read back from the renderer on stdout. `executed_notebook`
/// is populated only when this job actually executed the notebook (kinds
/// other than `Completed`), so the execution-reuse cache can be
/// populated for a later `Completed` job against the same content.
#[derive(Deserialize)]
struct RenderResponse {
    #[serde(with = "base64_bytes")]
    output_bytes: Vec<u8>,
    #[serde(default)]
    executed_notebook: Option<String>,
}

mod base64_bytes {
    use base64::Engine;
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(d)?;
        base64::engine::general_purpose::STANDARD
            .decode(s.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

pub struct NotebookHandler;

#[async_trait]
impl JobHandler for NotebookHandler {
    fn job_type(&self) -> JobType {
        JobType::Notebook
    }

    async fn handle(&self, job: &Job, ctx: &HandlerContext) -> Result<HandlerOutput, HandlerError> {
        let JobPayload::Notebook(payload) = &job.payload else {
            return Err(HandlerError::Permanent(format!(
                "notebook worker received {:?} payload",
                job.payload.job_type()
            )));
        };
        let renderer = ctx.notebook_renderer.as_ref().ok_or_else(|| {
            HandlerError::Permanent("CLXO_NOTEBOOK_RENDERER not set".to_string())
        })?;
        let renderer = renderer.to_str().ok_or_else(|| {
            HandlerError::Permanent("CLXO_NOTEBOOK_RENDERER is not valid UTF-8".to_string())
        })?;

        let reused_execution = match (payload.kind, &ctx.cache_db) {
            (NotebookKind::Completed, Some(cache_db)) => cache_db
                .get_executed_notebook(&payload.input_file, &job.content_hash, &payload.language, &payload.prog_lang)
                .await
                .map_err(|e| HandlerError::Transient(format!("execution-reuse cache lookup: {e}")))?,
            _ => None,
        };

        let request = RenderRequest {
            notebook_text: &payload.notebook_text,
            input_file: &payload.input_file,
            input_file_name: &payload.input_file_name,
            kind: payload.kind,
            prog_lang: &payload.prog_lang,
            language: &payload.language,
            format: payload.format,
            source_topic_dir: &payload.source_topic_dir,
            svg_available_stems: &payload.svg_available_stems,
            img_path_prefix: &payload.img_path_prefix,
            inline_images: payload.inline_images,
            fallback_execute: payload.fallback_execute,
            workspace_root: &ctx.workspace_root,
            executed_notebook: reused_execution.as_deref(),
        };
        let stdin = serde_json::to_vec(&request)
            .map_err(|e| HandlerError::Permanent(format!("encode render request: {e}")))?;

        let raw = run_piped(renderer, &[], &stdin, TIMEOUT).await?;
        let response: RenderResponse = serde_json::from_slice(&raw)
            .map_err(|e| HandlerError::Transient(format!("decode render response: {e}")))?;

        if let (Some(cache_db), Some(executed)) = (&ctx.cache_db, &response.executed_notebook) {
            cache_db
                .store_executed_notebook(&payload.input_file, &job.content_hash, &payload.language, &payload.prog_lang, executed)
                .await
                .map_err(|e| HandlerError::Transient(format!("store executed notebook: {e}")))?;
            cache_db
                .prune_stale_hashes(&payload.input_file, &job.content_hash)
                .await
                .map_err(|e| HandlerError::Transient(format!("prune stale executions: {e}")))?;
        }

        Ok(HandlerOutput { bytes: response.output_bytes, warnings: Vec::new() })
    }
}
