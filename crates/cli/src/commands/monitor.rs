// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::commands::status;
use crate::error::CliError;
use std::path::Path;
use std::time::Duration;

const REFRESH_INTERVAL: Duration = Duration::from_secs(5);

/// Re-renders `status` on a fixed interval until `Ctrl-C`.
pub async fn run(config_path: &Path) -> Result<(), CliError> {
    loop {
        print!("\x1b[2J\x1b[H");
        status::run(config_path).await?;

        tokio::select! {
            _ = tokio::time::sleep(REFRESH_INTERVAL) => {}
            _ = tokio::signal::ctrl_c() => return Ok(()),
        }
    }
}
