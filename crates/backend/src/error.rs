// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("storage error: {0}")]
    Storage(#[from] clxo_storage::StorageError),
    #[error("pool error: {0}")]
    Pool(#[from] clxo_pool::PoolError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("unknown service {0}")]
    UnknownService(String),
    #[error("no workers available for job type {0}")]
    NoWorkers(clxo_core::JobType),
    #[error("completion wait timed out after {0:?}")]
    CompletionDeadline(std::time::Duration),
}
