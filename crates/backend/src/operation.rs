// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! An `Operation` is what the Pipeline Driver hands the Backend: "make
//! `output_file` from `input_file` via this service, with this payload."
//! `service_name` is the driver's own vocabulary (one per pipeline
//! stage/target combination); the Backend's only job is mapping it onto
//! a `JobType` before anything else happens.

use crate::error::BackendError;
use clxo_core::{CorrelationId, JobPayload, JobType, OutputMetadata};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operation {
    pub service_name: String,
    pub input_file: String,
    pub output_file: String,
    pub content_hash: String,
    pub payload: JobPayload,
    #[serde(default)]
    pub correlation_id: CorrelationId,
}

impl Operation {
    pub fn job_type(&self) -> Result<JobType, BackendError> {
        match self.service_name.as_str() {
            "notebook-execute" | "notebook-speaker-html" | "notebook-completed-html"
            | "notebook-code-along" | "notebook-code" | "notebook-edit-script" => Ok(JobType::Notebook),
            "plantuml-render" => Ok(JobType::PlantUml),
            "drawio-render" => Ok(JobType::Drawio),
            other => Err(BackendError::UnknownService(other.to_string())),
        }
    }

    pub fn output_metadata(&self) -> OutputMetadata {
        self.payload.output_metadata()
    }
}
