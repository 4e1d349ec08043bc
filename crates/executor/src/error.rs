// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker executor error taxonomy (`spec.md` §4.3).

#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    #[error("failed to start worker: {0}")]
    SpawnFailed(String),

    #[error("worker not found: {0}")]
    NotFound(String),

    #[error("failed to stop worker {0}: {1}")]
    StopFailed(String, String),

    #[error("docker error: {0}")]
    Docker(#[from] bollard::errors::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
