// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn new_job_defaults_to_pending_and_unclaimed() {
    let job = Job::builder().build();
    assert_eq!(job.status, JobStatus::Pending);
    assert!(job.worker_id.is_none());
    assert!(!job.is_claimed());
}

#[test]
fn claimed_job_has_worker_and_processing_status() {
    let job = Job::builder()
        .status(JobStatus::Processing)
        .worker_id(WorkerId::new())
        .build();
    assert!(job.is_claimed());
}

#[test]
fn terminal_statuses_are_final() {
    assert!(JobStatus::Completed.is_terminal());
    assert!(JobStatus::Failed.is_terminal());
    assert!(JobStatus::Cancelled.is_terminal());
    assert!(!JobStatus::Pending.is_terminal());
    assert!(!JobStatus::Processing.is_terminal());
}

#[test]
fn job_status_round_trips_through_str() {
    for s in [
        JobStatus::Pending,
        JobStatus::Processing,
        JobStatus::Completed,
        JobStatus::Failed,
        JobStatus::Cancelled,
    ] {
        assert_eq!(JobStatus::from_str(s.as_str()), Some(s));
    }
}

#[test]
fn job_type_round_trips_through_str() {
    for t in [JobType::Notebook, JobType::PlantUml, JobType::Drawio] {
        assert_eq!(JobType::from_str(t.as_str()), Some(t));
    }
}

#[test]
fn job_id_has_stable_prefix() {
    let id = JobId::new();
    assert!(id.as_str().starts_with("job-"));
}
