// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::context::Context;
use crate::error::CliError;
use crate::plan_file::PlanFile;
use crate::reporter::TerminalReporter;
use clxo_backend::Reporter;
use clxo_pipeline::PipelineDriver;
use std::path::Path;
use std::sync::Arc;

/// Runs one build: reuse/start configured workers per the Lifecycle
/// Manager's policy, drive the plan through every stage, then stop
/// whatever this session started. Returns `true` iff nothing failed.
pub async fn run(config_path: &Path, plan_path: &Path) -> Result<bool, CliError> {
    let ctx = Context::load(config_path).await?;

    let started = if ctx.lifecycle.should_start_workers(&ctx.config.workers).await? {
        let report = ctx.lifecycle.start_managed_workers(&ctx.config.workers).await?;
        for (job_type, index, error) in &report.failed {
            tracing::warn!(%job_type, index, %error, "worker failed to start");
        }
        report.started
    } else {
        Vec::new()
    };

    let plan = PlanFile::load(plan_path)?.into_build_plan();

    let reporter: Arc<dyn Reporter> = Arc::new(TerminalReporter);
    let backend = Arc::new(ctx.backend(reporter.clone()));
    let driver = PipelineDriver::new(backend.clone(), reporter);

    let run_result = driver.run(plan).await;

    if let Err(e) = ctx.lifecycle.stop_managed_workers(&started).await {
        tracing::warn!(error = %e, "failed to stop session-managed workers");
    }
    backend.shutdown().await?;

    Ok(run_result?)
}
