// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `JobHandler` — the per-job-type execution seam (`spec.md` §4.4.1).
//! Concrete handlers (notebook rendering, PlantUML/Draw.io conversion)
//! are external collaborators from the orchestrator's point of view;
//! this crate only defines the interface and the loop that drives it.

use async_trait::async_trait;
use clxo_core::{Job, JobType, Warning};
use clxo_storage::CacheDb;
use std::path::PathBuf;
use std::sync::Arc;

/// Paths and tool locations a handler needs but does not own — threaded
/// in by the worker binary's `main`, sourced from the worker-launch
/// environment contract (`spec.md` §6).
#[derive(Debug, Clone)]
pub struct HandlerContext {
    pub workspace_root: PathBuf,
    pub source_root: Option<PathBuf>,
    pub plantuml_jar: Option<PathBuf>,
    pub drawio_executable: Option<PathBuf>,
    /// External notebook-execution/rendering tool, invoked per the same
    /// "tool path in the worker-launch environment" convention as
    /// `plantuml_jar`/`drawio_executable`.
    pub notebook_renderer: Option<PathBuf>,
    /// The Cache DB, opened only when `CLXO_CACHE_DB_PATH` is set
    /// (`spec.md` §4.2's execution-reuse cache). Only the notebook
    /// handler consults it; image-converter workers never receive one.
    pub cache_db: Option<Arc<CacheDb>>,
}

/// Bytes a handler produced for the job's `output_file`, plus any
/// warnings to attach to the job's structured result regardless of
/// whether the job ultimately succeeds.
#[derive(Debug, Clone, Default)]
pub struct HandlerOutput {
    pub bytes: Vec<u8>,
    pub warnings: Vec<Warning>,
}

/// The concrete Rust realization of "distinguishable by the exception
/// type" (`spec.md` §4.4.1). `Permanent` covers missing tool binaries and
/// missing input files — failing fast is correct. `Transient` covers
/// everything else and is what the worker loop's bounded, opt-in
/// crash-retry (`spec.md` §7) applies to.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("permanent: {0}")]
    Permanent(String),
    #[error("transient: {0}")]
    Transient(String),
}

impl HandlerError {
    pub fn is_transient(&self) -> bool {
        matches!(self, HandlerError::Transient(_))
    }

    pub fn message(&self) -> &str {
        match self {
            HandlerError::Permanent(m) | HandlerError::Transient(m) => m,
        }
    }
}

#[async_trait]
pub trait JobHandler: Send + Sync {
    fn job_type(&self) -> JobType;
    async fn handle(&self, job: &Job, ctx: &HandlerContext) -> Result<HandlerOutput, HandlerError>;
}
