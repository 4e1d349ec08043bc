// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `clxo`: the content build orchestrator's CLI. Thin argument parsing
//! and exit-code handling over `clxo-backend`/`clxo-pipeline`/`clxo-pool`.

mod color;
mod commands;
mod context;
mod error;
mod exit_error;
mod logging;
mod plan_file;
mod reporter;

use clap::{Parser, Subcommand};
use exit_error::ExitError;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "clxo", version, about = "Content build orchestrator", styles = color::styles())]
struct Cli {
    /// Path to the orchestrator's TOML configuration.
    #[arg(long, global = true, default_value = "clxo.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one build from a plan file (`clxo-pipeline`'s input format).
    Build {
        /// Path to the build plan (TOML).
        plan_file: PathBuf,
    },
    /// Start every configured worker and run the health monitor until Ctrl-C.
    StartServices,
    /// Stop every currently registered worker.
    StopServices,
    /// Inspect or reset the worker pool.
    #[command(subcommand)]
    Workers(WorkersCommand),
    /// One-shot worker health snapshot.
    Status,
    /// Live-refreshing worker health view.
    Monitor,
}

#[derive(Subcommand)]
enum WorkersCommand {
    /// List every registered worker.
    List,
    /// Stop and remove every registered worker row.
    Cleanup,
}

async fn dispatch(cli: Cli) -> Result<ExitCode, ExitError> {
    match cli.command {
        Command::Build { plan_file } => {
            let ok = commands::build::run(&cli.config, &plan_file).await?;
            if ok {
                Ok(ExitCode::SUCCESS)
            } else {
                Err(ExitError::new(1, "build finished with failed jobs"))
            }
        }
        Command::StartServices => {
            commands::services::start(&cli.config).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::StopServices => {
            commands::services::stop(&cli.config).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Workers(WorkersCommand::List) => {
            commands::workers::list(&cli.config).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Workers(WorkersCommand::Cleanup) => {
            commands::workers::cleanup(&cli.config).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Status => {
            commands::status::run(&cli.config).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Monitor => {
            commands::monitor::run(&cli.config).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let _guard = logging::init(&cli.config.parent().unwrap_or(std::path::Path::new(".")).join(".clxo/logs"));

    match dispatch(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {}", color::header("error"), e);
            ExitCode::from(e.code as u8)
        }
    }
}
