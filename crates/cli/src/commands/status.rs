// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::color::{context, header, literal};
use crate::context::Context;
use crate::error::CliError;
use clxo_core::JobType;
use std::path::Path;

const JOB_TYPES: [JobType; 3] = [JobType::Notebook, JobType::PlantUml, JobType::Drawio];

pub async fn run(config_path: &Path) -> Result<(), CliError> {
    let ctx = Context::load(config_path).await?;
    let counts = ctx.lifecycle.healthy_counts(&JOB_TYPES).await?;
    let workers = ctx.job_db.list_workers(None).await?;

    println!("{}", header("worker health"));
    for job_type in JOB_TYPES {
        let healthy = counts.get(&job_type).copied().unwrap_or(0);
        let total = workers.iter().filter(|w| w.worker_type == job_type).count();
        println!("  {:<10} {}/{} healthy", literal(job_type.as_str()), healthy, total);
    }

    let events = ctx.job_db.recent_events(10).await?;
    if !events.is_empty() {
        println!("{}", header("recent worker events"));
        for event in events {
            let worker = event.worker_id.as_ref().map(|id| id.as_str()).unwrap_or("-");
            let detail = event.detail.as_deref().unwrap_or("");
            println!("  {}", context(&format!("{} {} worker={worker} {detail}", event.at_ms, event.event_type)));
        }
    }
    Ok(())
}
