// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::JobDb;
use clxo_core::{JobPayload, JobStatus, JobType, NewJob, RetentionPolicy};

async fn open_tmp() -> (JobDb, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");
    let db = JobDb::open(&dir.path().join("jobs.sqlite3"))
        .await
        .expect("open job db");
    (db, dir)
}

fn sample_job(input_file: &str) -> NewJob {
    NewJob {
        job_type: JobType::Notebook,
        input_file: input_file.to_string(),
        output_file: "output/topic.html".to_string(),
        content_hash: "deadbeef".to_string(),
        payload: JobPayload::Notebook(clxo_core::test_support::sample_notebook_payload()),
        correlation_id: clxo_core::CorrelationId::new(),
    }
}

#[tokio::test]
async fn add_then_claim_round_trips() {
    let (db, _dir) = open_tmp().await;
    let id = db.add_job(sample_job("a.ipynb")).await.expect("add_job");

    let worker_id = clxo_core::WorkerId::new();
    let job = db
        .get_next_job(JobType::Notebook, &worker_id)
        .await
        .expect("get_next_job")
        .expect("a job is available");

    assert_eq!(job.id, id);
    assert_eq!(job.status, JobStatus::Processing);
    assert_eq!(job.worker_id, Some(worker_id));
}

#[tokio::test]
async fn exactly_one_claimer_sees_each_job() {
    let (db, _dir) = open_tmp().await;
    db.add_job(sample_job("a.ipynb")).await.expect("add_job");

    let w1 = clxo_core::WorkerId::new();
    let w2 = clxo_core::WorkerId::new();

    let first = db
        .get_next_job(JobType::Notebook, &w1)
        .await
        .expect("claim 1")
        .expect("job exists");
    let second = db
        .get_next_job(JobType::Notebook, &w2)
        .await
        .expect("claim 2");

    assert!(second.is_none(), "only one pending job, only one claimer");
    assert_eq!(first.worker_id, Some(w1));
}

#[tokio::test]
async fn terminal_status_cannot_be_overwritten() {
    let (db, _dir) = open_tmp().await;
    let id = db.add_job(sample_job("a.ipynb")).await.expect("add_job");
    db.update_job_status(&id, JobStatus::Completed, None, None)
        .await
        .expect("complete");

    let err = db
        .update_job_status(&id, JobStatus::Failed, Some("too late"), None)
        .await
        .expect_err("terminal jobs reject further transitions");
    assert!(matches!(
        err,
        crate::error::StorageError::TerminalTransition(..)
    ));
}

#[tokio::test]
async fn cancel_jobs_for_file_is_idempotent() {
    let (db, _dir) = open_tmp().await;
    let id = db.add_job(sample_job("a.ipynb")).await.expect("add_job");

    let cancelled = db
        .cancel_jobs_for_file("a.ipynb", "stale rebuild")
        .await
        .expect("cancel");
    assert_eq!(cancelled, vec![id]);

    let again = db
        .cancel_jobs_for_file("a.ipynb", "stale rebuild")
        .await
        .expect("cancel again");
    assert!(again.is_empty(), "already-terminal jobs are left alone");
}

#[tokio::test]
async fn reset_hung_jobs_frees_jobs_owned_by_dead_workers() {
    let (db, _dir) = open_tmp().await;
    db.add_job(sample_job("a.ipynb")).await.expect("add_job");
    let worker_id = clxo_core::WorkerId::new();
    let job = db
        .get_next_job(JobType::Notebook, &worker_id)
        .await
        .expect("claim")
        .expect("job exists");

    let reset = db
        .reset_hung_jobs(&[worker_id])
        .await
        .expect("reset_hung_jobs");
    assert_eq!(reset, 1);

    let requeued = db
        .get_next_job(JobType::Notebook, &clxo_core::WorkerId::new())
        .await
        .expect("reclaim")
        .expect("job is pending again");
    assert_eq!(requeued.id, job.id);
    assert_eq!(requeued.retry_count, 1);
}

#[tokio::test]
async fn check_cache_reflects_add_to_cache() {
    let (db, _dir) = open_tmp().await;
    assert!(!db
        .check_cache("output/topic.html", "deadbeef")
        .await
        .expect("check_cache"));

    db.add_to_cache("output/topic.html", "deadbeef", "{}")
        .await
        .expect("add_to_cache");

    assert!(db
        .check_cache("output/topic.html", "deadbeef")
        .await
        .expect("check_cache"));
}

#[tokio::test]
async fn cleanup_all_prunes_only_expired_terminal_jobs() {
    let (db, _dir) = open_tmp().await;
    let id = db.add_job(sample_job("a.ipynb")).await.expect("add_job");
    db.update_job_status(&id, JobStatus::Completed, None, None)
        .await
        .expect("complete");

    let retention = RetentionPolicy {
        completed_days: 0,
        ..RetentionPolicy::default()
    };
    let report = db.cleanup_all(retention).await.expect("cleanup_all");
    assert_eq!(report.jobs_deleted, 1);
}
