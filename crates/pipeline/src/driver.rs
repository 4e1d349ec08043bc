// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Pipeline Driver (`spec.md` §4.9): walks a pre-built plan stage by
//! stage, submitting every stage's operations to the Backend concurrently
//! and draining them to completion before the next stage starts.

use crate::error::PipelineError;
use crate::plan::{BuildPlan, CopyOperation, StagePlan};
use crate::stage::Stage;
use clxo_backend::{Backend, Operation, Reporter};
use clxo_core::{IssueSeverity, Warning};
use std::collections::HashMap;
use std::sync::Arc;

pub struct PipelineDriver {
    backend: Arc<Backend>,
    reporter: Arc<dyn Reporter>,
}

impl PipelineDriver {
    pub fn new(backend: Arc<Backend>, reporter: Arc<dyn Reporter>) -> Self {
        Self { backend, reporter }
    }

    /// Runs every stage in `Stage::ORDER`, returns `true` iff nothing
    /// failed across the whole build.
    pub async fn run(&self, mut plan: BuildPlan) -> Result<bool, PipelineError> {
        self.pre_scan(&plan).await?;

        let mut all_ok = true;
        for stage in Stage::ORDER {
            let Some(idx) = plan.stages.iter().position(|s| s.stage == stage) else { continue };
            let mut operations = std::mem::take(&mut plan.stages[idx].operations);

            if stage == Stage::HtmlSpeaker {
                operations.append(&mut plan.implicit_html_completed_executions);
            }
            if operations.is_empty() {
                continue;
            }

            self.submit_stage(stage, operations).await?;
            let ok = self.backend.wait_for_completion().await.map_err(|e| PipelineError::Stage(stage, e))?;
            all_ok &= ok;
        }

        self.run_copies(&plan.copies).await?;
        Ok(all_ok)
    }

    async fn pre_scan(&self, plan: &BuildPlan) -> Result<(), PipelineError> {
        for dir in &plan.output_dirs {
            tokio::fs::create_dir_all(dir).await?;
        }

        for issue in &plan.course_issues {
            self.reporter.warning(issue.file_path.as_deref().unwrap_or(""), issue);
        }

        for stage_plan in &plan.stages {
            self.check_duplicates(stage_plan, plan.image_mode_shared)?;
        }

        Ok(())
    }

    /// Two source files producing the same output path within a stage:
    /// a warning, unless it's an image-conversion collision under
    /// `image_mode = shared`, which aborts the build.
    fn check_duplicates(&self, stage_plan: &StagePlan, image_mode_shared: bool) -> Result<(), PipelineError> {
        let mut by_output: HashMap<&str, &str> = HashMap::new();

        for op in &stage_plan.operations {
            match by_output.get(op.output_file.as_str()) {
                Some(&existing) if existing != op.input_file.as_str() => {
                    if stage_plan.stage == Stage::ImageConversion && image_mode_shared {
                        return Err(PipelineError::ImageCollision {
                            image_file: op.input_file.clone(),
                            other_file: existing.to_string(),
                            output_path: op.output_file.clone(),
                        });
                    }
                    self.reporter.warning(
                        &op.input_file,
                        &Warning {
                            category: "duplicate_output".to_string(),
                            message: format!(
                                "{} and {} both produce {}",
                                existing, op.input_file, op.output_file
                            ),
                            severity: IssueSeverity::Warning,
                            file_path: Some(op.output_file.clone()),
                        },
                    );
                }
                _ => {
                    by_output.insert(&op.output_file, &op.input_file);
                }
            }
        }
        Ok(())
    }

    async fn submit_stage(&self, stage: Stage, operations: Vec<Operation>) -> Result<(), PipelineError> {
        let mut set = tokio::task::JoinSet::new();
        for op in operations {
            let backend = Arc::clone(&self.backend);
            set.spawn(async move { backend.execute_operation(op).await });
        }

        let mut first_err = None;
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    first_err.get_or_insert(e);
                }
                Err(join_err) => tracing::error!(%join_err, stage = %stage, "stage task panicked"),
            }
        }

        if let Some(e) = first_err {
            return Err(PipelineError::Stage(stage, e));
        }
        Ok(())
    }

    async fn run_copies(&self, copies: &[CopyOperation]) -> Result<(), PipelineError> {
        let mut set = tokio::task::JoinSet::new();
        for copy in copies.iter().cloned() {
            let backend = Arc::clone(&self.backend);
            set.spawn(async move {
                if copy.is_dir_group {
                    backend.copy_dir_group_to_output(&copy.src, &copy.dest).await
                } else {
                    backend.copy_file_to_output(&copy.src, &copy.dest).await
                }
            });
        }

        let mut first_err = None;
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    first_err.get_or_insert(e);
                }
                Err(join_err) => tracing::error!(%join_err, "copy task panicked"),
            }
        }

        if let Some(e) = first_err {
            return Err(PipelineError::Stage(Stage::Copy, e));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "driver_tests.rs"]
mod tests;
