// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::stage::Stage;
use clxo_backend::Operation;
use clxo_core::Warning;
use std::path::PathBuf;

/// All operations destined for one stage. Order within the vector carries
/// no meaning — the driver submits every entry concurrently.
#[derive(Debug, Clone)]
pub struct StagePlan {
    pub stage: Stage,
    pub operations: Vec<Operation>,
}

/// A plain file copy that doesn't go through a worker (e.g. static course
/// assets). `is_dir_group` copies every file directly under `src` into
/// `dest` rather than `src` itself.
#[derive(Debug, Clone)]
pub struct CopyOperation {
    pub src: PathBuf,
    pub dest: PathBuf,
    pub is_dir_group: bool,
}

/// Everything the driver needs to run one build: the operations already
/// planned per stage, the directories to pre-create, and the issues
/// carried over from whatever discovered the file set and built this
/// plan (course loading is outside this crate's scope).
#[derive(Debug, Clone, Default)]
pub struct BuildPlan {
    pub stages: Vec<StagePlan>,
    pub copies: Vec<CopyOperation>,
    pub output_dirs: Vec<PathBuf>,
    pub image_mode_shared: bool,
    pub course_issues: Vec<Warning>,
    /// Extra notebook-execution operations needed to populate the
    /// execution cache for completed-only HTML targets. Merged into the
    /// `HtmlSpeaker` stage's operations when the driver runs.
    pub implicit_html_completed_executions: Vec<Operation>,
}

impl BuildPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage_mut(&mut self, stage: Stage) -> &mut StagePlan {
        if let Some(pos) = self.stages.iter().position(|s| s.stage == stage) {
            &mut self.stages[pos]
        } else {
            self.stages.push(StagePlan { stage, operations: Vec::new() });
            self.stages.last_mut().expect("just pushed")
        }
    }
}
