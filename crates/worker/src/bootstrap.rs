// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared entry point for the three per-job-type worker binaries: read
//! the worker-launch environment contract (`spec.md` §6), stand up
//! tracing, open the Job DB, and hand off to `WorkerLoop::run`.

use crate::handler::{HandlerContext, JobHandler};
use crate::loop_::WorkerLoop;
use crate::self_id::{current_executor_id, now_ms};
use clxo_core::{ExecutionMode, Worker, WorkerId, WorkerStatus};
use clxo_storage::{CacheDb, JobDb};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("missing required environment variable {0}")]
    MissingEnv(&'static str),
    #[error(transparent)]
    Storage(#[from] clxo_storage::StorageError),
    #[error(transparent)]
    Worker(#[from] crate::error::WorkerError),
}

fn required_env(name: &'static str) -> Result<String, BootstrapError> {
    std::env::var(name).map_err(|_| BootstrapError::MissingEnv(name))
}

fn optional_path(name: &str) -> Option<PathBuf> {
    std::env::var(name).ok().map(PathBuf::from)
}

fn init_tracing() {
    let level = std::env::var("CLXO_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let filter = tracing_subscriber::EnvFilter::try_new(&level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

pub async fn run(handler: Arc<dyn JobHandler>) -> Result<(), BootstrapError> {
    init_tracing();

    let worker_id = match std::env::var("CLXO_WORKER_ID") {
        Ok(id) => WorkerId::from_string(id),
        Err(_) => WorkerId::new(),
    };
    let job_db_path = PathBuf::from(required_env("CLXO_JOB_DB_PATH")?);
    let workspace_root = PathBuf::from(required_env("CLXO_WORKSPACE_ROOT")?);
    let source_root = optional_path("CLXO_SOURCE_ROOT");

    let cache_db = match optional_path("CLXO_CACHE_DB_PATH") {
        Some(path) => Some(Arc::new(CacheDb::open(&path).await?)),
        None => None,
    };

    let ctx = HandlerContext {
        workspace_root,
        source_root,
        plantuml_jar: optional_path("CLXO_PLANTUML_JAR"),
        drawio_executable: optional_path("CLXO_DRAWIO_EXECUTABLE"),
        notebook_renderer: optional_path("CLXO_NOTEBOOK_RENDERER"),
        cache_db,
    };

    let job_db = Arc::new(JobDb::open(&job_db_path).await?);

    let host_path_prefix = std::env::var("CLXO_HOST_PATH_PREFIX").ok();
    let container_path_prefix = std::env::var("CLXO_CONTAINER_PATH_PREFIX").ok();
    let execution_mode = if host_path_prefix.is_some() || container_path_prefix.is_some() {
        ExecutionMode::Containerized
    } else {
        ExecutionMode::ManagedSubprocess
    };

    let worker = Worker {
        id: worker_id,
        worker_type: handler.job_type(),
        executor_id: current_executor_id(),
        status: WorkerStatus::Created,
        last_heartbeat_ms: now_ms(),
        started_at_ms: now_ms(),
        jobs_processed: 0,
        jobs_failed: 0,
        execution_mode,
        host_path_prefix,
        container_path_prefix,
    };

    tracing::info!(worker_id = %worker.id, job_type = %worker.worker_type, "starting worker");
    WorkerLoop::new(job_db, worker, handler, ctx).run().await?;
    Ok(())
}
