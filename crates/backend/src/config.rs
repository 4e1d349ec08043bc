// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Skip writing a cache-hit's bytes back to `output_file` (assume
    /// the file from a prior run is already on disk) and skip copying a
    /// destination that already exists.
    pub incremental: bool,
    pub poll_interval: Duration,
    pub completion_deadline: Duration,
    /// Bounded wait for any `created` worker to activate before the
    /// worker-availability gate gives up (`spec.md` §4.7).
    pub worker_activation_wait: Duration,
    pub retention: clxo_core::RetentionPolicy,
}

impl BackendConfig {
    pub fn from_config(config: &clxo_core::Config) -> Self {
        Self {
            incremental: config.incremental,
            poll_interval: config.poll_interval(),
            completion_deadline: config.completion_deadline(),
            worker_activation_wait: Duration::from_secs(10),
            retention: config.retention,
        }
    }
}
