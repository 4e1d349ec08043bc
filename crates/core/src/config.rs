// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Orchestrator configuration.
//!
//! Design Notes call for replacing the original's module-level config
//! singleton with an explicit record threaded through constructors.
//! `Config` is loaded once (from TOML, with environment overrides for
//! the worker-launch contract in `spec.md` §6) and passed by reference
//! or clone into every component that needs it — nothing here is ever
//! read from a `static` or `OnceLock`.

use crate::job::JobType;
use crate::worker::ExecutionMode;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// How many workers of a given type to run, and how to run them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    pub job_type: JobType,
    pub count: u32,
    pub execution_mode: ExecutionMode,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub memory_limit_mb: Option<u64>,
}

/// Top-level orchestrator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub job_db_path: PathBuf,
    pub cache_db_path: PathBuf,
    pub workspace_root: PathBuf,
    #[serde(default)]
    pub source_root: Option<PathBuf>,
    pub workers: Vec<WorkerConfig>,
    #[serde(default = "Config::default_auto_start")]
    pub auto_start: bool,
    #[serde(default)]
    pub auto_stop: bool,
    #[serde(default)]
    pub reuse_workers: bool,
    #[serde(default)]
    pub incremental: bool,
    #[serde(default)]
    pub image_mode_shared: bool,
    #[serde(default, with = "duration_secs_opt")]
    pub poll_interval: Option<Duration>,
    #[serde(default, with = "duration_secs_opt")]
    pub completion_deadline: Option<Duration>,
    #[serde(default)]
    pub retention: RetentionPolicy,
}

impl Config {
    fn default_auto_start() -> bool {
        true
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(ConfigError::Parse)
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval.unwrap_or(Duration::from_millis(500))
    }

    pub fn completion_deadline(&self) -> Duration {
        self.completion_deadline
            .unwrap_or(Duration::from_secs(1200))
    }
}

/// Retention windows applied by each store's `cleanup_all` (`spec.md`
/// §4.1, §4.2).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetentionPolicy {
    pub completed_days: u32,
    pub failed_days: u32,
    pub cancelled_days: u32,
    pub events_days: u32,
    pub result_versions: u32,
    pub issues_days: u32,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            completed_days: 7,
            failed_days: 30,
            cancelled_days: 7,
            events_days: 30,
            result_versions: 3,
            issues_days: 30,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

mod duration_secs_opt {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(v: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        v.map(|d| d.as_secs_f64()).serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        let secs: Option<f64> = Option::deserialize(d)?;
        Ok(secs.map(Duration::from_secs_f64))
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
