// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared subprocess-invocation helper for handlers that delegate to an
//! external converter binary (PlantUML, Draw.io, notebook renderers). A
//! missing binary is permanent — retrying won't make the tool appear;
//! every other failure (nonzero exit, timeout) is transient and eligible
//! for the worker loop's bounded crash-retry (`spec.md` §7).

use crate::handler::HandlerError;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

pub(crate) async fn run_piped(
    program: &str,
    args: &[&str],
    stdin_data: &[u8],
    timeout: Duration,
) -> Result<Vec<u8>, HandlerError> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| classify_spawn_error(program, &e))?;

    let mut stdin = child.stdin.take().ok_or_else(|| {
        HandlerError::Transient(format!("{program}: failed to open stdin pipe"))
    })?;
    let data = stdin_data.to_vec();
    let write_task = tokio::spawn(async move {
        let _ = stdin.write_all(&data).await;
    });

    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(result) => result.map_err(|e| HandlerError::Transient(format!("{program}: {e}")))?,
        Err(_) => {
            return Err(HandlerError::Transient(format!(
                "{program} timed out after {timeout:?}"
            )))
        }
    };
    let _ = write_task.await;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(HandlerError::Transient(format!(
            "{program} exited with {}: {stderr}",
            output.status
        )));
    }
    if output.stdout.is_empty() {
        return Err(HandlerError::Transient(format!(
            "{program} exited successfully but produced no output"
        )));
    }
    Ok(output.stdout)
}

pub(crate) fn classify_spawn_error(program: &str, e: &std::io::Error) -> HandlerError {
    if e.kind() == std::io::ErrorKind::NotFound {
        HandlerError::Permanent(format!("{program}: command not found"))
    } else {
        HandlerError::Transient(format!("{program}: {e}"))
    }
}
