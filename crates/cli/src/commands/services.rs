// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::color::{context, header};
use crate::context::Context;
use crate::error::CliError;
use std::path::Path;

/// Starts every configured worker unconditionally, then runs the health
/// monitor in the foreground until `SIGINT`. A separate `stop-services`
/// invocation (or an operator's `Ctrl-C`) tears them back down — this
/// process owns no in-memory session state the next one could reuse.
pub async fn start(config_path: &Path) -> Result<(), CliError> {
    let ctx = Context::load(config_path).await?;

    let cleared = ctx.lifecycle.pool().clear_stale_rows().await?;
    if cleared > 0 {
        println!("{} cleared {cleared} stale worker rows from a prior run", context("info"));
    }

    let report = ctx.lifecycle.start_persistent_workers(&ctx.config.workers).await;
    for id in &report.started {
        println!("{} started worker {id}", header("ok"));
    }
    for (job_type, index, error) in &report.failed {
        eprintln!("{} worker {job_type}[{index}] failed to start: {error}", header("error"));
    }

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let monitor_handle = tokio::spawn(ctx.lifecycle.pool().clone().run_health_monitor(shutdown_rx));

    println!("{} health monitor running, press Ctrl-C to stop", context("info"));
    let _ = tokio::signal::ctrl_c().await;
    let _ = shutdown_tx.send(true);
    let _ = monitor_handle.await;

    Ok(())
}

/// Stops every worker currently registered, regardless of which session
/// started it.
pub async fn stop(config_path: &Path) -> Result<(), CliError> {
    let ctx = Context::load(config_path).await?;
    let workers = ctx.job_db.list_workers(None).await?;
    let ids: Vec<_> = workers.into_iter().map(|w| w.id).collect();
    ctx.lifecycle.stop_persistent_workers(&ids, false).await?;
    println!("{} stopped {} worker(s)", header("ok"), ids.len());
    Ok(())
}
