// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("storage error: {0}")]
    Storage(#[from] clxo_storage::StorageError),

    #[error("executor error: {0}")]
    Executor(#[from] clxo_executor::ExecutorError),

    #[error("worker {0} did not register within the startup timeout")]
    RegistrationTimeout(clxo_core::WorkerId),

    #[error("worker {0} not found")]
    WorkerNotFound(clxo_core::WorkerId),
}
