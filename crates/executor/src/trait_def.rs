// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `WorkerExecutor` — the process/container lifecycle seam (`spec.md`
//! §4.3). The Pool Manager drives this trait; it never spawns or signals
//! a worker runtime directly, so `clxo-pool` stays agnostic to whether a
//! worker is a subprocess or a container.

use crate::error::ExecutorError;
use crate::stats::WorkerStats;
use async_trait::async_trait;
use clxo_core::{ExecutionMode, JobType, WorkerId};
use std::collections::HashMap;
use std::path::PathBuf;

/// Everything `start_worker` needs to launch one worker runtime. Built by
/// the Pool Manager from `clxo_core::WorkerConfig` plus orchestrator-wide
/// paths; the executor never reads `Config` itself.
#[derive(Debug, Clone)]
pub struct StartWorkerSpec {
    pub worker_id: WorkerId,
    pub job_type: JobType,
    pub index: u32,
    pub job_db_path: PathBuf,
    pub cache_db_path: Option<PathBuf>,
    pub workspace_root: PathBuf,
    pub source_root: Option<PathBuf>,
    pub log_level: String,
    /// Extra environment beyond the worker-launch contract (`spec.md`
    /// §6), e.g. `CLXO_PLANTUML_JAR` / `CLXO_DRAWIO_EXECUTABLE`.
    pub extra_env: HashMap<String, String>,
    /// `ContainerExecutor`-only: image name and memory limit.
    pub image: Option<String>,
    pub memory_limit_mb: Option<u64>,
}

/// Abstraction over how a worker's runtime is launched and observed
/// (`spec.md` §4.3's six operations), implemented by `ManagedExecutor`
/// (subprocess) and `ContainerExecutor` (Docker).
#[async_trait]
pub trait WorkerExecutor: Send + Sync {
    fn execution_mode(&self) -> ExecutionMode;

    /// Launch a worker runtime, returning the opaque `executor_id`
    /// persisted on the worker row (`pid:start_time` or container id).
    async fn start_worker(&self, spec: &StartWorkerSpec) -> Result<String, ExecutorError>;

    /// Request the runtime to stop. `force` escalates from SIGTERM to
    /// SIGKILL (subprocess) or a container stop-then-kill.
    async fn stop_worker(&self, executor_id: &str, force: bool) -> Result<(), ExecutorError>;

    /// Externally observable liveness check — never trusts the last
    /// self-reported heartbeat alone (`spec.md` §4.3).
    async fn is_worker_running(&self, executor_id: &str) -> Result<bool, ExecutorError>;

    async fn get_worker_stats(&self, executor_id: &str) -> Result<WorkerStats, ExecutorError>;

    /// Best-effort cleanup of any runtime-level resources (e.g. a
    /// lingering container) left behind by a worker whose row has
    /// already been removed.
    async fn cleanup(&self, executor_id: &str) -> Result<(), ExecutorError>;

    async fn get_container_logs(&self, executor_id: &str, tail_lines: usize) -> Result<String, ExecutorError>;
}
