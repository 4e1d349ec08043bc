// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::color::{context, literal, muted};
use crate::context::Context;
use crate::error::CliError;
use std::path::Path;

pub async fn list(config_path: &Path) -> Result<(), CliError> {
    let ctx = Context::load(config_path).await?;
    let workers = ctx.job_db.list_workers(None).await?;

    if workers.is_empty() {
        println!("{}", muted("no workers registered"));
        return Ok(());
    }

    for worker in workers {
        println!(
            "{}  {}  {}  heartbeat={}ms  processed={} failed={}",
            literal(worker.id.as_str()),
            worker.worker_type,
            worker.status,
            worker.last_heartbeat_ms,
            worker.jobs_processed,
            worker.jobs_failed,
        );
    }
    Ok(())
}

/// Stops and removes every worker row, regardless of health — the
/// operator-invoked escape hatch for stuck or orphaned rows.
pub async fn cleanup(config_path: &Path) -> Result<(), CliError> {
    let ctx = Context::load(config_path).await?;
    let workers = ctx.job_db.list_workers(None).await?;
    let ids: Vec<_> = workers.into_iter().map(|w| w.id).collect();
    let count = ids.len();
    ctx.lifecycle.pool().stop_workers(&ids, true).await?;
    println!("{} removed {count} worker row(s)", context("ok"));
    Ok(())
}
