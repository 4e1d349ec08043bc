// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::manager::PoolManagerConfig;
use async_trait::async_trait;
use clxo_core::{JobType, WorkerBuilder, WorkerStatus};
use clxo_executor::{ExecutorError, StartWorkerSpec, WorkerExecutor};
use std::collections::HashMap as StdHashMap;

struct NoopExecutor;

#[async_trait]
impl WorkerExecutor for NoopExecutor {
    fn execution_mode(&self) -> ExecutionMode {
        ExecutionMode::ManagedSubprocess
    }
    async fn start_worker(&self, _spec: &StartWorkerSpec) -> Result<String, ExecutorError> {
        Ok("noop".to_string())
    }
    async fn stop_worker(&self, _executor_id: &str, _force: bool) -> Result<(), ExecutorError> {
        Ok(())
    }
    async fn is_worker_running(&self, _executor_id: &str) -> Result<bool, ExecutorError> {
        Ok(true)
    }
    async fn get_worker_stats(&self, _executor_id: &str) -> Result<clxo_executor::WorkerStats, ExecutorError> {
        Ok(clxo_executor::WorkerStats { cpu_percent: 0.0, memory_bytes: 0, uptime_secs: Some(1) })
    }
    async fn cleanup(&self, _executor_id: &str) -> Result<(), ExecutorError> {
        Ok(())
    }
    async fn get_container_logs(&self, _executor_id: &str, _tail_lines: usize) -> Result<String, ExecutorError> {
        Ok(String::new())
    }
}

async fn pool_manager() -> (Arc<PoolManager>, Arc<JobDb>, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");
    let job_db_path = dir.path().join("jobs.sqlite3");
    let job_db = Arc::new(JobDb::open(&job_db_path).await.expect("open job db"));
    let mut executors: StdHashMap<ExecutionMode, Arc<dyn WorkerExecutor>> = StdHashMap::new();
    executors.insert(ExecutionMode::ManagedSubprocess, Arc::new(NoopExecutor));
    let config = PoolManagerConfig::new(job_db_path, dir.path().to_path_buf());
    let manager = Arc::new(PoolManager::new(job_db.clone(), executors, config));
    (manager, job_db, dir)
}

fn worker_config(job_type: JobType, count: u32) -> WorkerConfig {
    WorkerConfig { job_type, count, execution_mode: ExecutionMode::ManagedSubprocess, image: None, memory_limit_mb: None }
}

#[tokio::test]
async fn healthy_worker_count_ignores_stale_and_unhealthy_rows() {
    let (pool, job_db, _dir) = pool_manager().await;
    let lifecycle = LifecycleManager::new(pool, true, true, true);

    let fresh = WorkerBuilder::default()
        .worker_type(JobType::Notebook)
        .status(WorkerStatus::Idle)
        .last_heartbeat_ms(clxo_storage::now_ms())
        .build();
    job_db.register_worker(&fresh).await.expect("register fresh");

    let stale = WorkerBuilder::default()
        .worker_type(JobType::Notebook)
        .status(WorkerStatus::Idle)
        .last_heartbeat_ms(0)
        .build();
    job_db.register_worker(&stale).await.expect("register stale");

    let dead = WorkerBuilder::default()
        .worker_type(JobType::Notebook)
        .status(WorkerStatus::Dead)
        .last_heartbeat_ms(clxo_storage::now_ms())
        .build();
    job_db.register_worker(&dead).await.expect("register dead");

    let count = lifecycle.healthy_worker_count(JobType::Notebook).await.expect("count");
    assert_eq!(count, 1);
}

#[tokio::test]
async fn should_start_workers_respects_auto_start_flag() {
    let (pool, _job_db, _dir) = pool_manager().await;
    let lifecycle = LifecycleManager::new(pool, false, false, false);
    let should = lifecycle.should_start_workers(&[worker_config(JobType::Notebook, 2)]).await.expect("should_start");
    assert!(!should);
}

#[tokio::test]
async fn should_start_workers_skips_when_reuse_covers_deficit() {
    let (pool, job_db, _dir) = pool_manager().await;
    let healthy = WorkerBuilder::default()
        .worker_type(JobType::Notebook)
        .status(WorkerStatus::Idle)
        .last_heartbeat_ms(clxo_storage::now_ms())
        .build();
    job_db.register_worker(&healthy).await.expect("register");

    let lifecycle = LifecycleManager::new(pool, true, false, true);
    let should = lifecycle.should_start_workers(&[worker_config(JobType::Notebook, 1)]).await.expect("should_start");
    assert!(!should);
}

#[tokio::test]
async fn stop_managed_workers_noop_without_auto_stop() {
    let (pool, job_db, _dir) = pool_manager().await;
    let worker = WorkerBuilder::default().worker_type(JobType::Notebook).build();
    job_db.register_worker(&worker).await.expect("register");

    let lifecycle = LifecycleManager::new(pool, true, false, true);
    lifecycle.stop_managed_workers(&[worker.id.clone()]).await.expect("stop_managed_workers");

    assert!(job_db.get_worker(&worker.id).await.expect("get").is_some());
}
