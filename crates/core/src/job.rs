// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job identifier and the job row shape shared by every component that
//! touches the Job DB (queue, worker loop, backend, CLI).

use crate::id::CorrelationId;
use crate::payload::JobPayload;
use crate::worker::WorkerId;
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a claimable unit of work.
    pub struct JobId("job-");
}

/// Discriminator used for worker routing. One worker type handles
/// exactly one `JobType`; the Backend maps a pipeline operation's
/// `service_name` onto this before submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    Notebook,
    PlantUml,
    Drawio,
}

crate::simple_display! {
    JobType {
        Notebook => "notebook",
        PlantUml => "plantuml",
        Drawio => "drawio",
    }
}

impl JobType {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::Notebook => "notebook",
            JobType::PlantUml => "plantuml",
            JobType::Drawio => "drawio",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "notebook" => Some(JobType::Notebook),
            "plantuml" => Some(JobType::PlantUml),
            "drawio" => Some(JobType::Drawio),
            _ => None,
        }
    }
}

/// Job lifecycle status. Terminal states (`Completed`, `Failed`,
/// `Cancelled`) are final — the storage layer enforces no transition
/// back out of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(JobStatus::Pending),
            "processing" => Some(JobStatus::Processing),
            "completed" => Some(JobStatus::Completed),
            "failed" => Some(JobStatus::Failed),
            "cancelled" => Some(JobStatus::Cancelled),
            _ => None,
        }
    }
}

crate::simple_display! {
    JobStatus {
        Pending => "pending",
        Processing => "processing",
        Completed => "completed",
        Failed => "failed",
        Cancelled => "cancelled",
    }
}

/// Structured result a handler may attach to a completed job (e.g.
/// warnings produced during execution). Serialized into `jobs.result_blob`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobResult {
    #[serde(default)]
    pub warnings: Vec<crate::issue::Warning>,
}

/// Parameters for `add_job`. The row's `id`, `status`, and timestamps
/// are assigned by the Job Queue, not the caller.
#[derive(Debug, Clone)]
pub struct NewJob {
    pub job_type: JobType,
    pub input_file: String,
    pub output_file: String,
    pub content_hash: String,
    pub payload: JobPayload,
    pub correlation_id: CorrelationId,
}

/// A unit of work claimable by exactly one worker (`spec.md` §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub job_type: JobType,
    pub input_file: String,
    pub output_file: String,
    pub content_hash: String,
    pub payload: JobPayload,
    pub status: JobStatus,
    pub worker_id: Option<WorkerId>,
    pub correlation_id: CorrelationId,
    pub created_at_ms: u64,
    pub started_at_ms: Option<u64>,
    pub completed_at_ms: Option<u64>,
    pub error: Option<String>,
    pub result: Option<JobResult>,
    pub cancelled_by: Option<String>,
    /// Number of times a worker has attempted this job after a transient
    /// failure. Not part of the distilled spec; carried over from the
    /// original implementation's bounded crash-retry bookkeeping.
    #[serde(default)]
    pub retry_count: u32,
}

impl Job {
    /// `status = processing` with a job that has not been claimed is a
    /// storage-layer bug; this is a debug-only sanity check used by tests.
    pub fn is_claimed(&self) -> bool {
        self.status == JobStatus::Processing && self.worker_id.is_some()
    }
}

#[cfg(any(test, feature = "test-support"))]
crate::builder! {
    pub struct JobBuilder => Job {
        set {
            id: JobId = JobId::new(),
            job_type: JobType = JobType::Notebook,
            status: JobStatus = JobStatus::Pending,
            correlation_id: CorrelationId = CorrelationId::new(),
            created_at_ms: u64 = 0,
            retry_count: u32 = 0,
        }
        into {
            input_file: String = "topic.ipynb",
            output_file: String = "topic.html",
            content_hash: String = "deadbeef",
        }
        option {
            worker_id: WorkerId = None,
            started_at_ms: u64 = None,
            completed_at_ms: u64 = None,
            error: String = None,
            cancelled_by: String = None,
        }
        computed {
            payload: JobPayload = JobPayload::Notebook(crate::test_support::sample_notebook_payload()),
            result: Option<JobResult> = None,
        }
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
