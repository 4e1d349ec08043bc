// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ManagedExecutor`: launches workers as detached `tokio::process`
//! subprocesses (`spec.md` §4.3). Grounded in the forked workspace's own
//! `tokio::process::Command`-based agent spawning
//! (`oj-daemon::adapters::agent::coop::spawn`), adapted from one-shot
//! agent processes to long-running worker loops.

use crate::error::ExecutorError;
use crate::stats::WorkerStats;
use crate::trait_def::{StartWorkerSpec, WorkerExecutor};
use async_trait::async_trait;
use clxo_core::ExecutionMode;
use std::os::unix::process::CommandExt as _;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;

/// Per job type, the worker binary name (`spec.md` §4.4's one-binary-
/// per-concern layout: `clxo-worker-notebook`, `clxo-worker-plantuml`,
/// `clxo-worker-drawio`).
fn worker_binary(job_type: clxo_core::JobType) -> &'static str {
    match job_type {
        clxo_core::JobType::Notebook => "clxo-worker-notebook",
        clxo_core::JobType::PlantUml => "clxo-worker-plantuml",
        clxo_core::JobType::Drawio => "clxo-worker-drawio",
    }
}

pub struct ManagedExecutor {
    log_dir: PathBuf,
    /// Directory the worker binaries live in, if not on `PATH`.
    bin_dir: Option<PathBuf>,
}

impl ManagedExecutor {
    pub fn new(log_dir: PathBuf) -> Self {
        Self { log_dir, bin_dir: None }
    }

    pub fn with_bin_dir(mut self, bin_dir: PathBuf) -> Self {
        self.bin_dir = Some(bin_dir);
        self
    }

    fn resolve_binary(&self, name: &str) -> PathBuf {
        match &self.bin_dir {
            Some(dir) => dir.join(name),
            None => PathBuf::from(name),
        }
    }
}

/// Parse `/proc/<pid>/stat`'s start-time field (22nd whitespace-separated
/// token, after skipping the parenthesized comm field which may itself
/// contain spaces) so PID reuse can be detected: a worker's identity is
/// `pid:start_time`, not bare `pid`.
fn read_proc_start_time(pid: u32) -> std::io::Result<u64> {
    let stat = std::fs::read_to_string(format!("/proc/{pid}/stat"))?;
    let after_comm = stat
        .rfind(')')
        .map(|idx| &stat[idx + 1..])
        .ok_or_else(|| std::io::Error::other("malformed /proc/<pid>/stat"))?;
    after_comm
        .split_whitespace()
        .nth(19) // fields after comm: state(0) ppid(1) ... starttime(19)
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| std::io::Error::other("missing starttime field"))
}

fn encode_executor_id(pid: u32, start_time: u64) -> String {
    format!("pid:{pid}:{start_time}")
}

fn decode_executor_id(executor_id: &str) -> Option<(u32, u64)> {
    let mut parts = executor_id.split(':');
    if parts.next()? != "pid" {
        return None;
    }
    let pid: u32 = parts.next()?.parse().ok()?;
    let start_time: u64 = parts.next()?.parse().ok()?;
    Some((pid, start_time))
}

#[async_trait]
impl WorkerExecutor for ManagedExecutor {
    fn execution_mode(&self) -> ExecutionMode {
        ExecutionMode::ManagedSubprocess
    }

    async fn start_worker(&self, spec: &StartWorkerSpec) -> Result<String, ExecutorError> {
        let binary = self.resolve_binary(worker_binary(spec.job_type));
        let log_path = self
            .log_dir
            .join(format!("{}-{}.log", spec.job_type.as_str(), spec.worker_id.suffix()));
        let log_file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .map_err(ExecutorError::Io)?;
        let log_file_err = log_file.try_clone().map_err(ExecutorError::Io)?;

        let mut cmd = Command::new(&binary);
        cmd.env("CLXO_WORKER_TYPE", spec.job_type.as_str())
            .env("CLXO_WORKER_ID", spec.worker_id.as_str())
            .env("CLXO_JOB_DB_PATH", &spec.job_db_path)
            .env("CLXO_WORKSPACE_ROOT", &spec.workspace_root)
            .env("CLXO_LOG_LEVEL", &spec.log_level)
            .stdin(Stdio::null())
            .stdout(Stdio::from(log_file))
            .stderr(Stdio::from(log_file_err))
            // Own process group so the worker is not signaled alongside
            // the orchestrator's own terminal session; stop_worker
            // targets it explicitly via nix::sys::signal::kill.
            .process_group(0);

        if let Some(cache_db) = &spec.cache_db_path {
            cmd.env("CLXO_CACHE_DB_PATH", cache_db);
        }
        if let Some(source_root) = &spec.source_root {
            cmd.env("CLXO_SOURCE_ROOT", source_root);
        }
        for (k, v) in &spec.extra_env {
            cmd.env(k, v);
        }

        let child = cmd
            .spawn()
            .map_err(|e| ExecutorError::SpawnFailed(format!("{}: {e}", binary.display())))?;
        let pid = child
            .id()
            .ok_or_else(|| ExecutorError::SpawnFailed("child exited before pid observed".into()))?;

        // Reap in the background so the process never lingers as a
        // zombie once it exits on its own.
        tokio::spawn(async move {
            let mut child = child;
            let _ = child.wait().await;
        });

        let start_time = read_proc_start_time(pid).unwrap_or(0);
        Ok(encode_executor_id(pid, start_time))
    }

    async fn stop_worker(&self, executor_id: &str, force: bool) -> Result<(), ExecutorError> {
        let (pid, _) = decode_executor_id(executor_id)
            .ok_or_else(|| ExecutorError::NotFound(executor_id.to_string()))?;
        let pid = nix::unistd::Pid::from_raw(pid as i32);
        let signal = if force {
            nix::sys::signal::Signal::SIGKILL
        } else {
            nix::sys::signal::Signal::SIGTERM
        };
        match nix::sys::signal::kill(pid, signal) {
            Ok(()) => Ok(()),
            // Already gone — stopping a dead worker is not an error.
            Err(nix::errno::Errno::ESRCH) => Ok(()),
            Err(e) => Err(ExecutorError::StopFailed(executor_id.to_string(), e.to_string())),
        }
    }

    async fn is_worker_running(&self, executor_id: &str) -> Result<bool, ExecutorError> {
        let Some((pid, start_time)) = decode_executor_id(executor_id) else {
            return Ok(false);
        };
        match read_proc_start_time(pid) {
            Ok(current_start) => Ok(current_start == start_time),
            Err(_) => Ok(false),
        }
    }

    async fn get_worker_stats(&self, executor_id: &str) -> Result<WorkerStats, ExecutorError> {
        let Some((pid, _)) = decode_executor_id(executor_id) else {
            return Ok(WorkerStats::default());
        };
        let stat = match std::fs::read_to_string(format!("/proc/{pid}/stat")) {
            Ok(s) => s,
            Err(_) => return Ok(WorkerStats::default()),
        };
        let after_comm = stat.rfind(')').map(|idx| &stat[idx + 1..]).unwrap_or("");
        let fields: Vec<&str> = after_comm.split_whitespace().collect();
        // utime(11) + stime(12) in clock ticks, after the 2 fields already
        // consumed (state, ppid) — offsets below are 0-indexed into `fields`.
        let utime: u64 = fields.get(11).and_then(|s| s.parse().ok()).unwrap_or(0);
        let stime: u64 = fields.get(12).and_then(|s| s.parse().ok()).unwrap_or(0);
        let ticks_per_sec = 100.0; // USER_HZ, stable on Linux in practice
        let cpu_secs = (utime + stime) as f64 / ticks_per_sec;

        let status = std::fs::read_to_string(format!("/proc/{pid}/status")).unwrap_or_default();
        let memory_bytes = status
            .lines()
            .find(|l| l.starts_with("VmRSS:"))
            .and_then(|l| l.split_whitespace().nth(1))
            .and_then(|kb| kb.parse::<u64>().ok())
            .map(|kb| kb * 1024)
            .unwrap_or(0);

        Ok(WorkerStats {
            cpu_percent: cpu_secs, // raw accumulated seconds; Pool Manager rates this across successive health-check samples
            memory_bytes,
            uptime_secs: None,
        })
    }

    async fn cleanup(&self, _executor_id: &str) -> Result<(), ExecutorError> {
        Ok(())
    }

    async fn get_container_logs(&self, _executor_id: &str, _tail_lines: usize) -> Result<String, ExecutorError> {
        Err(ExecutorError::NotFound("managed subprocess workers log to file, not container logs".into()))
    }
}

#[cfg(test)]
#[path = "managed_tests.rs"]
mod tests;
