// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ContainerExecutor`: launches workers as Docker containers via
//! `bollard` (`spec.md` §4.3). Enrichment pulled in because the forked
//! workspace's own Docker integration
//! (`oj-daemon::adapters::agent::docker`) shells out to the `docker` CLI
//! to attach an interactive TTY to an agent session — a queue worker
//! needs programmatic container lifecycle control instead, which is
//! exactly what `bollard`'s async Engine API client gives.

use crate::error::ExecutorError;
use crate::stats::WorkerStats;
use crate::trait_def::{StartWorkerSpec, WorkerExecutor};
use async_trait::async_trait;
use bollard::container::{
    Config, CreateContainerOptions, KillContainerOptions, LogsOptions, RemoveContainerOptions,
    StartContainerOptions, StopContainerOptions,
};
use bollard::models::HostConfig;
use bollard::network::CreateNetworkOptions;
use bollard::Docker;
use clxo_core::ExecutionMode;
use futures_util::StreamExt;

pub struct ContainerExecutor {
    docker: Docker,
    name_prefix: String,
    network_name: String,
    workspace_root_host: String,
    source_root_host: Option<String>,
}

impl ContainerExecutor {
    pub fn new(
        docker: Docker,
        name_prefix: impl Into<String>,
        network_name: impl Into<String>,
        workspace_root_host: impl Into<String>,
        source_root_host: Option<String>,
    ) -> Self {
        Self {
            docker,
            name_prefix: name_prefix.into(),
            network_name: network_name.into(),
            workspace_root_host: workspace_root_host.into(),
            source_root_host,
        }
    }

    fn container_name(&self, spec: &StartWorkerSpec) -> String {
        format!("{}-{}-{}", self.name_prefix, spec.job_type.as_str(), spec.index)
    }

    async fn ensure_network(&self) -> Result<(), ExecutorError> {
        let networks = self.docker.list_networks::<String>(None).await?;
        if networks.iter().any(|n| n.name.as_deref() == Some(&self.network_name)) {
            return Ok(());
        }
        self.docker
            .create_network(CreateNetworkOptions {
                name: self.network_name.clone(),
                ..Default::default()
            })
            .await?;
        Ok(())
    }
}

#[async_trait]
impl WorkerExecutor for ContainerExecutor {
    fn execution_mode(&self) -> ExecutionMode {
        ExecutionMode::Containerized
    }

    async fn start_worker(&self, spec: &StartWorkerSpec) -> Result<String, ExecutorError> {
        self.ensure_network().await?;

        let image = spec
            .image
            .clone()
            .ok_or_else(|| ExecutorError::SpawnFailed("containerized worker missing image".into()))?;
        let name = self.container_name(spec);

        let container_workspace = "/workspace";
        let container_source = spec.source_root.as_ref().map(|_| "/source");

        let mut env = vec![
            format!("CLXO_WORKER_TYPE={}", spec.job_type.as_str()),
            format!("CLXO_WORKER_ID={}", spec.worker_id.as_str()),
            format!("CLXO_JOB_DB_PATH={}", spec.job_db_path.display()),
            format!("CLXO_WORKSPACE_ROOT={container_workspace}"),
            format!("CLXO_LOG_LEVEL={}", spec.log_level),
            format!("CLXO_HOST_PATH_PREFIX={}", self.workspace_root_host),
            format!("CLXO_CONTAINER_PATH_PREFIX={container_workspace}"),
        ];
        if let Some(cache_db) = &spec.cache_db_path {
            env.push(format!("CLXO_CACHE_DB_PATH={}", cache_db.display()));
        }
        if container_source.is_some() {
            env.push(format!("CLXO_SOURCE_ROOT={}", container_source.unwrap()));
        }
        for (k, v) in &spec.extra_env {
            env.push(format!("{k}={v}"));
        }

        let mut binds = vec![format!("{}:{container_workspace}:rw", self.workspace_root_host)];
        if let Some(source_host) = &self.source_root_host {
            binds.push(format!("{source_host}:/source:ro"));
        }

        let host_config = HostConfig {
            binds: Some(binds),
            memory: spec.memory_limit_mb.map(|mb| (mb * 1024 * 1024) as i64),
            network_mode: Some(self.network_name.clone()),
            ..Default::default()
        };

        let config = Config {
            image: Some(image),
            env: Some(env),
            host_config: Some(host_config),
            ..Default::default()
        };

        let created = self
            .docker
            .create_container(Some(CreateContainerOptions { name: name.clone(), platform: None }), config)
            .await?;
        self.docker
            .start_container(&created.id, None::<StartContainerOptions<String>>)
            .await?;
        Ok(created.id)
    }

    async fn stop_worker(&self, executor_id: &str, force: bool) -> Result<(), ExecutorError> {
        if force {
            self.docker
                .kill_container(executor_id, Some(KillContainerOptions { signal: "SIGKILL" }))
                .await?;
        } else {
            self.docker
                .stop_container(executor_id, Some(StopContainerOptions { t: 10 }))
                .await?;
        }
        Ok(())
    }

    async fn is_worker_running(&self, executor_id: &str) -> Result<bool, ExecutorError> {
        let inspect = match self.docker.inspect_container(executor_id, None).await {
            Ok(inspect) => inspect,
            Err(bollard::errors::Error::DockerResponseServerError { status_code: 404, .. }) => {
                return Ok(false)
            }
            Err(e) => return Err(e.into()),
        };
        Ok(inspect.state.and_then(|s| s.running).unwrap_or(false))
    }

    async fn get_worker_stats(&self, executor_id: &str) -> Result<WorkerStats, ExecutorError> {
        let mut stream = self.docker.stats(executor_id, Some(bollard::container::StatsOptions {
            stream: false,
            one_shot: true,
        }));
        let Some(sample) = stream.next().await else {
            return Ok(WorkerStats::default());
        };
        let sample = sample?;

        let cpu_delta = sample.cpu_stats.cpu_usage.total_usage as f64
            - sample.precpu_stats.cpu_usage.total_usage as f64;
        let system_delta = sample.cpu_stats.system_cpu_usage.unwrap_or(0) as f64
            - sample.precpu_stats.system_cpu_usage.unwrap_or(0) as f64;
        let online_cpus = sample.cpu_stats.online_cpus.unwrap_or(1).max(1) as f64;
        let cpu_percent = if system_delta > 0.0 {
            (cpu_delta / system_delta) * online_cpus * 100.0
        } else {
            0.0
        };

        Ok(WorkerStats {
            cpu_percent,
            memory_bytes: sample.memory_stats.usage.unwrap_or(0),
            uptime_secs: None,
        })
    }

    async fn cleanup(&self, executor_id: &str) -> Result<(), ExecutorError> {
        match self
            .docker
            .remove_container(executor_id, Some(RemoveContainerOptions { force: true, ..Default::default() }))
            .await
        {
            Ok(()) => Ok(()),
            Err(bollard::errors::Error::DockerResponseServerError { status_code: 404, .. }) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn get_container_logs(&self, executor_id: &str, tail_lines: usize) -> Result<String, ExecutorError> {
        let mut stream = self.docker.logs(
            executor_id,
            Some(LogsOptions::<String> {
                stdout: true,
                stderr: true,
                tail: tail_lines.to_string(),
                ..Default::default()
            }),
        );
        let mut out = String::new();
        while let Some(chunk) = stream.next().await {
            out.push_str(&chunk?.to_string());
        }
        Ok(out)
    }
}
