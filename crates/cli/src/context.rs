// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wires one `clxo.toml` config into the stack every command needs:
//! both databases, the executor map, the Pool/Lifecycle managers, and
//! (for `build`) the Backend and Pipeline Driver.

use crate::error::CliError;
use clxo_core::{Config, ExecutionMode};
use clxo_executor::{ContainerExecutor, ManagedExecutor, WorkerExecutor};
use clxo_pool::{LifecycleManager, PoolManager, PoolManagerConfig};
use clxo_storage::{CacheDb, JobDb};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct Context {
    pub config: Config,
    pub job_db: Arc<JobDb>,
    pub cache_db: Arc<CacheDb>,
    pub lifecycle: Arc<LifecycleManager>,
}

fn load_config(path: &Path) -> Result<Config, CliError> {
    let text = std::fs::read_to_string(path).map_err(|source| CliError::ConfigRead { path: path.to_path_buf(), source })?;
    Ok(Config::from_toml_str(&text)?)
}

fn log_dir(config: &Config) -> PathBuf {
    config.workspace_root.join(".clxo").join("logs")
}

async fn build_executors(config: &Config) -> Result<HashMap<ExecutionMode, Arc<dyn WorkerExecutor>>, CliError> {
    let mut executors: HashMap<ExecutionMode, Arc<dyn WorkerExecutor>> = HashMap::new();

    let needs_managed = config.workers.iter().any(|w| w.execution_mode == ExecutionMode::ManagedSubprocess);
    if needs_managed {
        executors.insert(ExecutionMode::ManagedSubprocess, Arc::new(ManagedExecutor::new(log_dir(config))));
    }

    let needs_container = config.workers.iter().any(|w| w.execution_mode == ExecutionMode::Containerized);
    if needs_container {
        let docker = bollard::Docker::connect_with_local_defaults()?;
        executors.insert(
            ExecutionMode::Containerized,
            Arc::new(ContainerExecutor::new(
                docker,
                "clxo-worker",
                "clxo-net",
                config.workspace_root.to_string_lossy().into_owned(),
                config.source_root.as_ref().map(|p| p.to_string_lossy().into_owned()),
            )),
        );
    }

    Ok(executors)
}

impl Context {
    pub async fn load(config_path: &Path) -> Result<Self, CliError> {
        let config = load_config(config_path)?;
        let job_db = Arc::new(JobDb::open(&config.job_db_path).await?);
        let cache_db = Arc::new(CacheDb::open(&config.cache_db_path).await?);
        let executors = build_executors(&config).await?;

        let mut pool_config = PoolManagerConfig::new(config.job_db_path.clone(), config.workspace_root.clone());
        pool_config.cache_db_path = Some(config.cache_db_path.clone());
        pool_config.source_root = config.source_root.clone();
        pool_config.plantuml_jar = std::env::var("CLXO_PLANTUML_JAR").ok().map(PathBuf::from);
        pool_config.drawio_executable = std::env::var("CLXO_DRAWIO_EXECUTABLE").ok().map(PathBuf::from);
        if let Ok(level) = std::env::var("CLXO_LOG_LEVEL") {
            pool_config.log_level = level;
        }

        let pool = Arc::new(PoolManager::new(job_db.clone(), executors, pool_config));
        let lifecycle = Arc::new(LifecycleManager::new(pool, config.auto_start, config.auto_stop, config.reuse_workers));

        Ok(Self { config, job_db, cache_db, lifecycle })
    }

    pub fn backend(&self, reporter: Arc<dyn clxo_backend::Reporter>) -> clxo_backend::Backend {
        clxo_backend::Backend::new(
            self.job_db.clone(),
            self.cache_db.clone(),
            self.lifecycle.clone(),
            reporter,
            clxo_backend::BackendConfig::from_config(&self.config),
        )
    }
}
