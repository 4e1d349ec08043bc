// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

fn fast_policy() -> RetryPolicy {
    RetryPolicy {
        base: Duration::from_millis(1),
        factor: 1.0,
        jitter: 0.0,
        cap: Duration::from_millis(5),
        max_attempts: 3,
    }
}

#[tokio::test]
async fn succeeds_immediately_without_retry() {
    let calls = AtomicU32::new(0);
    let result: Result<u32, StorageError> = with_retry(fast_policy(), || {
        calls.fetch_add(1, Ordering::SeqCst);
        async { Ok(7) }
    })
    .await;
    assert_eq!(result.expect("ok"), 7);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn retries_busy_errors_until_success() {
    let calls = AtomicU32::new(0);
    let result: Result<u32, StorageError> = with_retry(fast_policy(), || {
        let n = calls.fetch_add(1, Ordering::SeqCst);
        async move {
            if n < 2 {
                Err(StorageError::Busy("locked".to_string()))
            } else {
                Ok(99)
            }
        }
    })
    .await;
    assert_eq!(result.expect("ok"), 99);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn gives_up_after_max_attempts() {
    let calls = AtomicU32::new(0);
    let result: Result<u32, StorageError> = with_retry(fast_policy(), || {
        calls.fetch_add(1, Ordering::SeqCst);
        async { Err(StorageError::Busy("still locked".to_string())) }
    })
    .await;
    assert!(result.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), fast_policy().max_attempts + 1);
}

#[tokio::test]
async fn non_retryable_errors_surface_immediately() {
    let calls = AtomicU32::new(0);
    let result: Result<u32, StorageError> = with_retry(fast_policy(), || {
        calls.fetch_add(1, Ordering::SeqCst);
        async { Err(StorageError::Integrity("unique constraint".to_string())) }
    })
    .await;
    assert!(result.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}
