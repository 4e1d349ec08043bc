// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory `WorkerExecutor` for Pool Manager tests, mirroring
//! `clxo-worker`'s `#[cfg(test)] fake` pattern.

use crate::error::ExecutorError;
use crate::stats::WorkerStats;
use crate::trait_def::{StartWorkerSpec, WorkerExecutor};
use async_trait::async_trait;
use clxo_core::ExecutionMode;
use parking_lot::Mutex;
use std::collections::HashSet;

pub struct FakeExecutor {
    mode: ExecutionMode,
    running: Mutex<HashSet<String>>,
    next_id: Mutex<u64>,
    fail_start: Mutex<bool>,
}

impl FakeExecutor {
    pub fn new(mode: ExecutionMode) -> Self {
        Self {
            mode,
            running: Mutex::new(HashSet::new()),
            next_id: Mutex::new(1),
            fail_start: Mutex::new(false),
        }
    }

    pub fn fail_next_start(&self) {
        *self.fail_start.lock() = true;
    }

    pub fn running_count(&self) -> usize {
        self.running.lock().len()
    }

    pub fn mark_dead(&self, executor_id: &str) {
        self.running.lock().remove(executor_id);
    }
}

#[async_trait]
impl WorkerExecutor for FakeExecutor {
    fn execution_mode(&self) -> ExecutionMode {
        self.mode
    }

    async fn start_worker(&self, _spec: &StartWorkerSpec) -> Result<String, ExecutorError> {
        if std::mem::take(&mut *self.fail_start.lock()) {
            return Err(ExecutorError::SpawnFailed("fake start failure".to_string()));
        }
        let mut next = self.next_id.lock();
        let id = format!("fake:{}", *next);
        *next += 1;
        self.running.lock().insert(id.clone());
        Ok(id)
    }

    async fn stop_worker(&self, executor_id: &str, _force: bool) -> Result<(), ExecutorError> {
        self.running.lock().remove(executor_id);
        Ok(())
    }

    async fn is_worker_running(&self, executor_id: &str) -> Result<bool, ExecutorError> {
        Ok(self.running.lock().contains(executor_id))
    }

    async fn get_worker_stats(&self, _executor_id: &str) -> Result<WorkerStats, ExecutorError> {
        Ok(WorkerStats { cpu_percent: 0.0, memory_bytes: 0, uptime_secs: Some(1) })
    }

    async fn cleanup(&self, executor_id: &str) -> Result<(), ExecutorError> {
        self.running.lock().remove(executor_id);
        Ok(())
    }

    async fn get_container_logs(&self, _executor_id: &str, _tail_lines: usize) -> Result<String, ExecutorError> {
        Ok(String::new())
    }
}
