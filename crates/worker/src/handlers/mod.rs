// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Concrete `JobHandler`s for the three worker binaries. Each one is a
//! thin adapter onto an external tool — the conversion itself is an
//! external collaborator's job, not this crate's.

mod drawio;
mod notebook;
mod plantuml;

pub use drawio::DrawioHandler;
pub use notebook::NotebookHandler;
pub use plantuml::PlantUmlHandler;
