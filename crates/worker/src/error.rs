// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("storage error: {0}")]
    Storage(#[from] clxo_storage::StorageError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
