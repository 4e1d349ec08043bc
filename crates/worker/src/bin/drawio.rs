// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `clxo-worker-drawio`: the Draw.io job-type worker process, spawned by
//! `clxo-pool` with the worker-launch environment contract set
//! (`spec.md` §6).

use clxo_worker::handlers::DrawioHandler;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    if let Err(e) = clxo_worker::bootstrap::run(Arc::new(DrawioHandler)).await {
        tracing::error!(error = %e, "drawio worker exited with an error");
        std::process::exit(1);
    }
}
