// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime resource stats surfaced by `WorkerExecutor::get_worker_stats`
//! (`spec.md` §4.3) — consulted by the Pool Manager's CPU-based hang
//! detection.

#[derive(Debug, Clone, Default)]
pub struct WorkerStats {
    pub cpu_percent: f64,
    pub memory_bytes: u64,
    /// `None` when the runtime exposes no uptime (e.g. a freshly created
    /// container still starting).
    pub uptime_secs: Option<u64>,
}
