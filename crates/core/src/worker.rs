// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker identifier and the worker row shape (`spec.md` §3).

use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a registered worker runtime.
    pub struct WorkerId("wrk-");
}

/// How a worker's runtime is launched and observed (`spec.md` §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    ManagedSubprocess,
    Containerized,
}

impl ExecutionMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ExecutionMode::ManagedSubprocess => "managed_subprocess",
            ExecutionMode::Containerized => "containerized",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "managed_subprocess" => Some(ExecutionMode::ManagedSubprocess),
            "containerized" => Some(ExecutionMode::Containerized),
            _ => None,
        }
    }
}

/// Worker health as tracked by the Pool Manager's health monitor.
///
/// `Hung` and `Dead` are both evidence of trouble but distinct: a hung
/// worker's runtime is alive and externally observable but making no
/// progress on a claimed job; a dead worker's runtime is simply gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerStatus {
    Created,
    Idle,
    Busy,
    Hung,
    Dead,
}

impl WorkerStatus {
    pub fn is_healthy(self) -> bool {
        matches!(self, WorkerStatus::Idle | WorkerStatus::Busy)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WorkerStatus::Created => "created",
            WorkerStatus::Idle => "idle",
            WorkerStatus::Busy => "busy",
            WorkerStatus::Hung => "hung",
            WorkerStatus::Dead => "dead",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "created" => Some(WorkerStatus::Created),
            "idle" => Some(WorkerStatus::Idle),
            "busy" => Some(WorkerStatus::Busy),
            "hung" => Some(WorkerStatus::Hung),
            "dead" => Some(WorkerStatus::Dead),
            _ => None,
        }
    }
}

crate::simple_display! {
    WorkerStatus {
        Created => "created",
        Idle => "idle",
        Busy => "busy",
        Hung => "hung",
        Dead => "dead",
    }
}

/// A registered runtime available to claim jobs of `worker_type`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Worker {
    pub id: WorkerId,
    pub worker_type: crate::job::JobType,
    /// Opaque handle the executor uses to address the runtime (container
    /// id, or `pid:start_time` sentinel for managed subprocesses).
    pub executor_id: String,
    pub status: WorkerStatus,
    pub last_heartbeat_ms: u64,
    pub started_at_ms: u64,
    pub jobs_processed: u64,
    pub jobs_failed: u64,
    pub execution_mode: ExecutionMode,
    /// Host-visible path prefix, set only for containerized workers so the
    /// Backend can translate a worker-reported container path back to a
    /// host path for cache keys even after the orchestrator restarts.
    #[serde(default)]
    pub host_path_prefix: Option<String>,
    #[serde(default)]
    pub container_path_prefix: Option<String>,
}

#[cfg(any(test, feature = "test-support"))]
crate::builder! {
    pub struct WorkerBuilder => Worker {
        set {
            id: WorkerId = WorkerId::new(),
            worker_type: crate::job::JobType = crate::job::JobType::Notebook,
            status: WorkerStatus = WorkerStatus::Idle,
            last_heartbeat_ms: u64 = 0,
            started_at_ms: u64 = 0,
            jobs_processed: u64 = 0,
            jobs_failed: u64 = 0,
            execution_mode: ExecutionMode = ExecutionMode::ManagedSubprocess,
        }
        into {
            executor_id: String = "pid:12345:0",
        }
        option {
            host_path_prefix: String = None,
            container_path_prefix: String = None,
        }
    }
}
