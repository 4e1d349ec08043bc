// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use async_trait::async_trait;
use clxo_core::{CorrelationId, ImagePayload, JobPayload, WorkerBuilder, WorkerStatus};
use clxo_executor::{ExecutorError, StartWorkerSpec, WorkerExecutor};
use clxo_pool::{PoolManager, PoolManagerConfig};
use std::collections::HashMap as StdHashMap;

struct NoopExecutor;

#[async_trait]
impl WorkerExecutor for NoopExecutor {
    fn execution_mode(&self) -> clxo_core::ExecutionMode {
        clxo_core::ExecutionMode::ManagedSubprocess
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
        Ok(clxo_executor::WorkerStats::default())
    }
    async fn cleanup(&self, _executor_id: &str) -> Result<(), ExecutorError> {
        Ok(())
    }
    async fn get_container_logs(&self, _executor_id: &str, _tail_lines: usize) -> Result<String, ExecutorError> {
        Ok(String::new())
    }
}

struct Fixture {
    backend: Backend,
    job_db: Arc<JobDb>,
    _dir: tempfile::TempDir,
}

async fn fixture(with_worker: bool) -> Fixture {
    let dir = tempfile::tempdir().expect("tempdir");
    let job_db_path = dir.path().join("jobs.sqlite3");
    let job_db = Arc::new(JobDb::open(&job_db_path).await.expect("open job db"));
    let cache_db = Arc::new(CacheDb::open(&dir.path().join("cache.sqlite3")).await.expect("open cache db"));

    if with_worker {
        let worker = WorkerBuilder::default()
            .worker_type(JobType::PlantUml)
            .status(WorkerStatus::Idle)
            .last_heartbeat_ms(clxo_storage::now_ms())
            .build();
        job_db.register_worker(&worker).await.expect("register");
    }

    let mut executors: StdHashMap<clxo_core::ExecutionMode, Arc<dyn WorkerExecutor>> = StdHashMap::new();
    executors.insert(clxo_core::ExecutionMode::ManagedSubprocess, Arc::new(NoopExecutor));
    let pool_config = PoolManagerConfig::new(job_db_path, dir.path().to_path_buf());
    let pool = Arc::new(PoolManager::new(job_db.clone(), executors, pool_config));
    let lifecycle = Arc::new(LifecycleManager::new(pool, true, false, true));

    let config = BackendConfig {
        incremental: false,
        poll_interval: Duration::from_millis(20),
        completion_deadline: Duration::from_secs(5),
        worker_activation_wait: Duration::from_millis(200),
        retention: clxo_core::RetentionPolicy::default(),
    };

    let backend = Backend::new(job_db.clone(), cache_db, lifecycle, Arc::new(crate::reporter::NullReporter), config);
    Fixture { backend, job_db, _dir: dir }
}

fn plantuml_operation(output_file: &str) -> Operation {
    Operation {
        service_name: "plantuml-render".to_string(),
        input_file: "diagram.puml".to_string(),
        output_file: output_file.to_string(),
        content_hash: "deadbeef".to_string(),
        payload: JobPayload::PlantUml(ImagePayload {
            source_text: "@startuml\n@enduml".to_string(),
            input_file: "diagram.puml".to_string(),
            output_file: output_file.to_string(),
            format: "png".to_string(),
        }),
        correlation_id: CorrelationId::new(),
    }
}

#[tokio::test]
async fn execute_operation_fails_fast_on_unknown_service() {
    let fixture = fixture(true).await;
    let mut op = plantuml_operation("out.png");
    op.service_name = "unknown-service".to_string();
    let err = fixture.backend.execute_operation(op).await.unwrap_err();
    assert!(matches!(err, BackendError::UnknownService(_)));
}

#[tokio::test]
async fn execute_operation_raises_no_workers_when_none_available() {
    let fixture = fixture(false).await;
    let err = fixture.backend.execute_operation(plantuml_operation("out.png")).await.unwrap_err();
    assert!(matches!(err, BackendError::NoWorkers(JobType::PlantUml)));
}

#[tokio::test]
async fn execute_operation_submits_and_tracks_job() {
    let fixture = fixture(true).await;
    fixture.backend.execute_operation(plantuml_operation("out.png")).await.expect("submit");
    assert_eq!(fixture.backend.active_jobs.lock().await.len(), 1);
    let jobs = fixture.job_db.get_job_statuses_batch(&[]).await.expect("batch");
    assert!(jobs.is_empty());
}

#[tokio::test]
async fn execute_operation_short_circuits_on_result_cache_hit() {
    let fixture = fixture(false).await;
    let output_metadata = OutputMetadata::new("format=png");
    let key = GetResultKey { input_file: "diagram.puml", content_hash: "deadbeef", output_metadata: &output_metadata };
    let stored = StoredResult {
        input_file: "diagram.puml".to_string(),
        content_hash: "deadbeef".to_string(),
        output_metadata: output_metadata.clone(),
        correlation_id: CorrelationId::new(),
        source_file: "diagram.puml".to_string(),
        result: CachedResult::Image(vec![1, 2, 3]),
        stored_at_ms: clxo_storage::now_ms(),
    };

    fixture.backend.cache_db.store_latest_result(&stored, 3).await.expect("store");
    drop(key);

    let out_dir = tempfile::tempdir().expect("tempdir");
    let out_path = out_dir.path().join("out.png");
    fixture
        .backend
        .execute_operation(plantuml_operation(out_path.to_str().expect("utf8")))
        .await
        .expect("cache hit should not need workers");

    assert_eq!(tokio::fs::read(&out_path).await.expect("read"), vec![1, 2, 3]);
    assert_eq!(fixture.backend.active_jobs.lock().await.len(), 0);
}

#[tokio::test]
async fn execute_operation_short_circuits_on_cached_user_error() {
    let fixture = fixture(false).await;
    let output_metadata = OutputMetadata::new("format=png");
    let issue = clxo_core::StoredIssue {
        input_file: "diagram.puml".to_string(),
        content_hash: "deadbeef".to_string(),
        output_metadata: output_metadata.clone(),
        error_type: clxo_core::ErrorType::User,
        category: "diagram_syntax".to_string(),
        severity: clxo_core::IssueSeverity::Error,
        message: "bad syntax".to_string(),
        file_path: Some("diagram.puml".to_string()),
        guidance: "Check your diagram syntax".to_string(),
        stored_at_ms: clxo_storage::now_ms(),
    };
    fixture.backend.cache_db.store_error(&issue).await.expect("store error");

    let out_dir = tempfile::tempdir().expect("tempdir");
    let out_path = out_dir.path().join("out.png");
    fixture
        .backend
        .execute_operation(plantuml_operation(out_path.to_str().expect("utf8")))
        .await
        .expect("cached error should not need workers");

    assert_eq!(fixture.backend.active_jobs.lock().await.len(), 0);
    assert!(tokio::fs::metadata(&out_path).await.is_err(), "no output should be written for a cached error");
    assert!(!fixture.backend.wait_for_completion().await.expect("drain"), "cached error must count as a failure");
}

#[tokio::test]
async fn store_latest_result_invalidates_prior_cached_error() {
    let fixture = fixture(false).await;
    let output_metadata = OutputMetadata::new("format=png");
    let key = GetResultKey { input_file: "diagram.puml", content_hash: "deadbeef", output_metadata: &output_metadata };
    let issue = clxo_core::StoredIssue {
        input_file: "diagram.puml".to_string(),
        content_hash: "deadbeef".to_string(),
        output_metadata: output_metadata.clone(),
        error_type: clxo_core::ErrorType::User,
        category: "diagram_syntax".to_string(),
        severity: clxo_core::IssueSeverity::Error,
        message: "bad syntax".to_string(),
        file_path: Some("diagram.puml".to_string()),
        guidance: "Check your diagram syntax".to_string(),
        stored_at_ms: clxo_storage::now_ms(),
    };
    fixture.backend.cache_db.store_error(&issue).await.expect("store error");

    let stored = StoredResult {
        input_file: "diagram.puml".to_string(),
        content_hash: "deadbeef".to_string(),
        output_metadata: output_metadata.clone(),
        correlation_id: CorrelationId::new(),
        source_file: "diagram.puml".to_string(),
        result: CachedResult::Image(vec![9]),
        stored_at_ms: clxo_storage::now_ms(),
    };
    fixture.backend.cache_db.store_latest_result(&stored, 3).await.expect("store result");

    let issues = fixture.backend.cache_db.get_issues(key).await.expect("get issues");
    assert!(
        issues.iter().all(|i| !matches!(i, clxo_storage::CachedIssue::Error(_))),
        "a fresh successful result must invalidate the prior stored error"
    );
}
