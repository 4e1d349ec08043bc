// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `clxo-worker-plantuml`: the PlantUML job-type worker process, spawned
//! by `clxo-pool` with the worker-launch environment contract set
//! (`spec.md` §6).

use clxo_worker::handlers::PlantUmlHandler;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    if let Err(e) = clxo_worker::bootstrap::run(Arc::new(PlantUmlHandler)).await {
        tracing::error!(error = %e, "plantuml worker exited with an error");
        std::process::exit(1);
    }
}
