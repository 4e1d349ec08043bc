// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::stage::Stage;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("stage {0} failed: {1}")]
    Stage(Stage, clxo_backend::BackendError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error(
        "image filename collision in shared image mode: {image_file:?} and {other_file:?} both resolve to {output_path}"
    )]
    ImageCollision { image_file: String, other_file: String, output_path: String },
}
