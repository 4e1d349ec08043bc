// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::exit_error::ExitError;
use crate::plan_file::PlanFileError;

/// Exit codes (`spec.md` §6): 0 success, 1 build failure or fatal error,
/// 2 operational error (missing database, bad config, Docker unreachable).
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("failed to read config {path}: {source}")]
    ConfigRead { path: std::path::PathBuf, source: std::io::Error },
    #[error(transparent)]
    Config(#[from] clxo_core::ConfigError),
    #[error(transparent)]
    PlanFile(#[from] PlanFileError),
    #[error(transparent)]
    Storage(#[from] clxo_storage::StorageError),
    #[error(transparent)]
    Pool(#[from] clxo_pool::PoolError),
    #[error(transparent)]
    Backend(#[from] clxo_backend::BackendError),
    #[error(transparent)]
    Pipeline(#[from] clxo_pipeline::PipelineError),
    #[error(transparent)]
    Docker(#[from] bollard::errors::Error),
    #[error("no execution_mode=containerized worker is configured but a container executor was requested")]
    DockerNotConfigured,
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Backend(_) | CliError::Pipeline(_) => 1,
            _ => 2,
        }
    }
}

impl From<CliError> for ExitError {
    fn from(err: CliError) -> Self {
        let code = err.exit_code();
        ExitError::new(code, err.to_string())
    }
}
