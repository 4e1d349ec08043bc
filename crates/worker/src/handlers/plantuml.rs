// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! PlantUML job handler: pipes diagram source into `java -jar
//! $CLXO_PLANTUML_JAR -pipe -t<format>` and returns its stdout.

use crate::handler::{HandlerContext, HandlerError, HandlerOutput, JobHandler};
use crate::tool::run_piped;
use async_trait::async_trait;
use clxo_core::{Job, JobPayload, JobType};
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(60);

pub struct PlantUmlHandler;

#[async_trait]
impl JobHandler for PlantUmlHandler {
    fn job_type(&self) -> JobType {
        JobType::PlantUml
    }

    async fn handle(&self, job: &Job, ctx: &HandlerContext) -> Result<HandlerOutput, HandlerError> {
        let JobPayload::PlantUml(payload) = &job.payload else {
            return Err(HandlerError::Permanent(format!(
                "plantuml worker received {:?} payload",
                job.payload.job_type()
            )));
        };
        let jar = ctx.plantuml_jar.as_ref().ok_or_else(|| {
            HandlerError::Permanent("CLXO_PLANTUML_JAR not set".to_string())
        })?;
        let jar = jar.to_str().ok_or_else(|| {
            HandlerError::Permanent("CLXO_PLANTUML_JAR is not valid UTF-8".to_string())
        })?;
        let flag = format!("-t{}", payload.format);

        let bytes = run_piped(
            "java",
            &["-jar", jar, "-pipe", "-charset", "UTF-8", flag.as_str()],
            payload.source_text.as_bytes(),
            TIMEOUT,
        )
        .await?;
        Ok(HandlerOutput { bytes, warnings: Vec::new() })
    }
}
