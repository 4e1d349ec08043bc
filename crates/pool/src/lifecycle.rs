// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Lifecycle Manager (`spec.md` §4.6): the `auto_start`/`auto_stop`/
//! `reuse_workers` policy layer in front of the Pool Manager's mechanics.
//! A healthy-worker count is always computed server-side from the
//! `workers` table — never cached in process memory — so two
//! orchestrator processes started against the same Job DB can't
//! double-count each other's workers.

use crate::error::PoolError;
use crate::manager::{PoolManager, StartupReport, HEARTBEAT_STALE_MS};
use clxo_core::{JobType, WorkerConfig, WorkerId};
use std::collections::HashMap;
use std::sync::Arc;

pub struct LifecycleManager {
    pool: Arc<PoolManager>,
    auto_start: bool,
    auto_stop: bool,
    reuse_workers: bool,
}

impl LifecycleManager {
    pub fn new(pool: Arc<PoolManager>, auto_start: bool, auto_stop: bool, reuse_workers: bool) -> Self {
        Self { pool, auto_start, auto_stop, reuse_workers }
    }

    /// The underlying Pool Manager, for callers that need its mechanics
    /// directly (stale-row cleanup, the background health monitor) — the
    /// CLI's `start-services`/`stop-services` commands aren't bound by
    /// this manager's session-scoped policy.
    pub fn pool(&self) -> &Arc<PoolManager> {
        &self.pool
    }

    /// Healthy = status idle/busy AND heartbeat within the staleness
    /// window, counted fresh from the database on every call.
    pub async fn healthy_worker_count(&self, job_type: JobType) -> Result<u32, PoolError> {
        let workers = self.pool.job_db().list_workers(Some(job_type)).await?;
        let cutoff = clxo_storage::now_ms().saturating_sub(HEARTBEAT_STALE_MS);
        Ok(workers
            .iter()
            .filter(|w| w.status.is_healthy() && w.last_heartbeat_ms >= cutoff)
            .count() as u32)
    }

    /// `spec.md` §4.6: consults `auto_start`, and if `reuse_workers`,
    /// whether enough healthy workers of each configured type already
    /// exist.
    pub async fn should_start_workers(&self, configured: &[WorkerConfig]) -> Result<bool, PoolError> {
        if !self.auto_start {
            return Ok(false);
        }
        if !self.reuse_workers {
            return Ok(true);
        }
        for worker_config in configured {
            let healthy = self.healthy_worker_count(worker_config.job_type).await?;
            if healthy < worker_config.count {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// If reuse is enabled, starts only the deficit between configured
    /// and already-healthy counts per job type. Otherwise starts every
    /// configured worker. Returns the report for only the workers this
    /// call actually started (so `stop_managed_workers` later only
    /// touches what this session owns).
    pub async fn start_managed_workers(&self, configured: &[WorkerConfig]) -> Result<StartupReport, PoolError> {
        if !self.reuse_workers {
            return Ok(self.pool.start_workers(configured).await);
        }

        let mut deficits = Vec::with_capacity(configured.len());
        for worker_config in configured {
            let healthy = self.healthy_worker_count(worker_config.job_type).await?;
            let deficit = worker_config.count.saturating_sub(healthy);
            if deficit > 0 {
                let mut reduced = worker_config.clone();
                reduced.count = deficit;
                deficits.push(reduced);
            }
        }
        Ok(self.pool.start_workers(&deficits).await)
    }

    /// Stop only the workers this session started. A no-op if
    /// `auto_stop` is disabled — they are left running for the next
    /// build to reuse (or for an operator to stop with `workers
    /// cleanup`).
    pub async fn stop_managed_workers(&self, started: &[WorkerId]) -> Result<(), PoolError> {
        if !self.auto_stop || started.is_empty() {
            return Ok(());
        }
        self.pool.stop_workers(started, false).await
    }

    /// Entry point for a long-lived standalone worker service
    /// (`clxo-cli start-services`) — always starts, regardless of
    /// `auto_start`/`reuse_workers`, since there is no build session to
    /// defer to.
    pub async fn start_persistent_workers(&self, configured: &[WorkerConfig]) -> StartupReport {
        self.pool.start_workers(configured).await
    }

    /// Counterpart to `start_persistent_workers` — always stops,
    /// regardless of `auto_stop`.
    pub async fn stop_persistent_workers(&self, worker_ids: &[WorkerId], force: bool) -> Result<(), PoolError> {
        self.pool.stop_workers(worker_ids, force).await
    }

    /// Per-job-type healthy counts, for `clxo-cli status`.
    pub async fn healthy_counts(&self, job_types: &[JobType]) -> Result<HashMap<JobType, u32>, PoolError> {
        let mut counts = HashMap::new();
        for job_type in job_types {
            counts.insert(*job_type, self.healthy_worker_count(*job_type).await?);
        }
        Ok(counts)
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
