// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Orchestrator-side tracing setup. Mirrors `clxo-worker`'s own
//! `bootstrap::init_tracing`, plus a rolling file appender for the
//! orchestrator's own log (workers write their own per-process logs).

use std::path::Path;

pub fn init(log_dir: &Path) -> tracing_appender::non_blocking::WorkerGuard {
    let level = std::env::var("CLXO_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let filter =
        tracing_subscriber::EnvFilter::try_new(&level).unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let _ = std::fs::create_dir_all(log_dir);
    let file_appender = tracing_appender::rolling::daily(log_dir, "clxo-orchestrator.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking)
        .with_ansi(false)
        .try_init();

    guard
}
