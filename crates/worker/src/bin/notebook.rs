// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `clxo-worker-notebook`: the notebook job-type worker process, spawned
//! by `clxo-pool` with the worker-launch environment contract set
//! (`spec.md` §6).

use clxo_worker::handlers::NotebookHandler;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    if let Err(e) = clxo_worker::bootstrap::run(Arc::new(NotebookHandler)).await {
        tracing::error!(error = %e, "notebook worker exited with an error");
        std::process::exit(1);
    }
}
