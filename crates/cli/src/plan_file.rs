// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `build` command's input format: a declarative list of operations
//! already resolved per stage. Course-spec parsing — walking a course's
//! file set to produce this list — is an external collaborator; this
//! crate only consumes the result, the same way `Config::from_toml_str`
//! only consumes a finished TOML document.

use clxo_backend::Operation;
use clxo_pipeline::{BuildPlan, CopyOperation, Stage};
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
pub struct CopyEntry {
    pub src: PathBuf,
    pub dest: PathBuf,
    #[serde(default)]
    pub is_dir_group: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct PlanFile {
    #[serde(default)]
    pub image_mode_shared: bool,
    #[serde(default)]
    pub output_dirs: Vec<PathBuf>,
    #[serde(default)]
    pub image_conversion: Vec<Operation>,
    #[serde(default)]
    pub notebook_derivative: Vec<Operation>,
    #[serde(default)]
    pub html_speaker: Vec<Operation>,
    #[serde(default)]
    pub html_completed: Vec<Operation>,
    #[serde(default)]
    pub implicit_html_completed_executions: Vec<Operation>,
    #[serde(default)]
    pub copies: Vec<CopyEntry>,
}

#[derive(Debug, thiserror::Error)]
pub enum PlanFileError {
    #[error("failed to read plan file {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("failed to parse plan file: {0}")]
    Parse(#[from] toml::de::Error),
}

impl PlanFile {
    pub fn load(path: &std::path::Path) -> Result<Self, PlanFileError> {
        let text =
            std::fs::read_to_string(path).map_err(|source| PlanFileError::Read { path: path.to_path_buf(), source })?;
        Ok(toml::from_str(&text)?)
    }

    pub fn into_build_plan(self) -> BuildPlan {
        let mut plan = BuildPlan::new();
        plan.image_mode_shared = self.image_mode_shared;
        plan.output_dirs = self.output_dirs;
        plan.implicit_html_completed_executions = self.implicit_html_completed_executions;
        plan.stage_mut(Stage::ImageConversion).operations = self.image_conversion;
        plan.stage_mut(Stage::NotebookDerivative).operations = self.notebook_derivative;
        plan.stage_mut(Stage::HtmlSpeaker).operations = self.html_speaker;
        plan.stage_mut(Stage::HtmlCompleted).operations = self.html_completed;
        plan.copies = self
            .copies
            .into_iter()
            .map(|c| CopyOperation { src: c.src, dest: c.dest, is_dir_group: c.is_dir_group })
            .collect();
        plan
    }
}

#[cfg(test)]
#[path = "plan_file_tests.rs"]
mod tests;
