// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Draw.io job handler. Unlike PlantUML, the draw.io CLI exports via
//! file paths rather than stdin/stdout, so the diagram source is staged
//! to a scratch file and the rendered output read back from another.

use crate::handler::{HandlerContext, HandlerError, HandlerOutput, JobHandler};
use crate::tool::classify_spawn_error;
use async_trait::async_trait;
use clxo_core::{CorrelationId, Job, JobPayload, JobType};
use std::time::Duration;
use tokio::process::Command;

const TIMEOUT: Duration = Duration::from_secs(60);

pub struct DrawioHandler;

#[async_trait]
impl JobHandler for DrawioHandler {
    fn job_type(&self) -> JobType {
        JobType::Drawio
    }

    async fn handle(&self, job: &Job, ctx: &HandlerContext) -> Result<HandlerOutput, HandlerError> {
        let JobPayload::Drawio(payload) = &job.payload else {
            return Err(HandlerError::Permanent(format!(
                "drawio worker received {:?} payload",
                job.payload.job_type()
            )));
        };
        let executable = ctx.drawio_executable.as_ref().ok_or_else(|| {
            HandlerError::Permanent("CLXO_DRAWIO_EXECUTABLE not set".to_string())
        })?;

        let scratch = std::env::temp_dir().join(format!("clxo-drawio-{}", CorrelationId::new().suffix()));
        tokio::fs::create_dir_all(&scratch)
            .await
            .map_err(|e| HandlerError::Transient(format!("scratch dir: {e}")))?;
        let input_path = scratch.join("in.drawio");
        let output_path = scratch.join(format!("out.{}", payload.format));

        tokio::fs::write(&input_path, payload.source_text.as_bytes())
            .await
            .map_err(|e| HandlerError::Transient(format!("write scratch input: {e}")))?;

        let output = Command::new(executable)
            .args(["--export", "--format", payload.format.as_str(), "--output"])
            .arg(&output_path)
            .arg(&input_path)
            .output()
            .await
            .map_err(|e| classify_spawn_error(executable.to_string_lossy().as_ref(), &e))?;

        let result = if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(HandlerError::Transient(format!(
                "drawio exited with {}: {stderr}",
                output.status
            )))
        } else {
            tokio::time::timeout(TIMEOUT, tokio::fs::read(&output_path))
                .await
                .map_err(|_| HandlerError::Transient("drawio export timed out".to_string()))?
                .map_err(|e| HandlerError::Transient(format!("read drawio output: {e}")))
                .map(|bytes| HandlerOutput { bytes, warnings: Vec::new() })
        };

        let _ = tokio::fs::remove_dir_all(&scratch).await;
        result
    }
}
