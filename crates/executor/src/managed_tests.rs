// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn executor_id_round_trips() {
    let id = encode_executor_id(4242, 99);
    assert_eq!(decode_executor_id(&id), Some((4242, 99)));
}

#[test]
fn decode_rejects_malformed_ids() {
    assert_eq!(decode_executor_id("container:abc123"), None);
    assert_eq!(decode_executor_id("pid:not-a-number:0"), None);
    assert_eq!(decode_executor_id("pid:1"), None);
}

#[test]
fn worker_binary_maps_every_job_type() {
    assert_eq!(worker_binary(clxo_core::JobType::Notebook), "clxo-worker-notebook");
    assert_eq!(worker_binary(clxo_core::JobType::PlantUml), "clxo-worker-plantuml");
    assert_eq!(worker_binary(clxo_core::JobType::Drawio), "clxo-worker-drawio");
}

#[tokio::test]
async fn is_worker_running_false_for_unknown_pid() {
    let executor = ManagedExecutor::new(std::env::temp_dir());
    // PID 1 exists but its start time will never match this sentinel.
    let running = executor.is_worker_running("pid:1:0").await.expect("check");
    assert!(!running);
}

#[tokio::test]
async fn is_worker_running_false_for_malformed_id() {
    let executor = ManagedExecutor::new(std::env::temp_dir());
    assert!(!executor.is_worker_running("garbage").await.expect("check"));
}
