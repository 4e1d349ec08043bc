// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Exponential-backoff retry around `SQLITE_BUSY`/`SQLITE_LOCKED`
//! (`spec.md` §4.1). An explicit loop over [`clxo_core::RetryPolicy`] —
//! no context-manager magic, per Design Notes.

use crate::error::StorageError;
use clxo_core::RetryPolicy;
use std::future::Future;

/// Pseudo-random jitter sample in `[-1.0, 1.0]` derived from the
/// monotonic clock. Not cryptographic — only needed to avoid every
/// retrying writer waking up in lockstep.
fn jitter_sample() -> f64 {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    ((nanos % 2000) as f64 / 1000.0) - 1.0
}

pub async fn with_retry<T, F, Fut>(policy: RetryPolicy, mut op: F) -> Result<T, StorageError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StorageError>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(v) => return Ok(v),
            Err(e) if e.is_retryable() && policy.should_retry(attempt) => {
                let delay = policy.delay_for(attempt, jitter_sample());
                tracing::debug!(attempt, ?delay, error = %e, "retrying after database-busy");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
