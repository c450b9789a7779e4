// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! chief - YAML job orchestrator and scheduler.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{daemon, export_cron, preview, run, validate};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

pub const EXIT_OK: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
pub const EXIT_INTERRUPTED: i32 = 130;

#[derive(Parser)]
#[command(name = "chief", version, about = "YAML-driven job orchestrator and scheduler")]
struct Cli {
    /// Path to the chief YAML config
    #[arg(long, global = true, default_value = "chief.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the config and compile every schedule
    Validate,
    /// Show a friendly schedule preview
    Preview(preview::PreviewArgs),
    /// Run jobs once
    Run(run::RunArgs),
    /// Run the scheduler daemon loop
    Daemon(daemon::DaemonArgs),
    /// Export cron-compatible schedules
    ExportCron(export_cron::ExportCronArgs),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match dispatch(cli).await {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("Error: {}", format_error(&err));
            std::process::exit(EXIT_FAILURE);
        }
    }
}

async fn dispatch(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Validate => validate::handle(&cli.config),
        Commands::Preview(args) => preview::handle(&cli.config, args),
        Commands::Run(args) => run::handle(&cli.config, args).await,
        Commands::Daemon(args) => daemon::handle(&cli.config, args).await,
        Commands::ExportCron(args) => export_cron::handle(&cli.config, args),
    }
}

/// Format an anyhow error, deduplicating the chain.
///
/// When the top-level Display already contains every source message the
/// "Caused by" chain is redundant noise; otherwise render it in full.
fn format_error(err: &anyhow::Error) -> String {
    let top = err.to_string();
    let chain_redundant = err
        .chain()
        .skip(1)
        .all(|cause| top.contains(&cause.to_string()));
    if chain_redundant {
        return top;
    }
    let mut buf = top;
    for (i, cause) in err.chain().skip(1).enumerate() {
        buf.push_str(&format!("\n\nCaused by:\n    {}: {}", i, cause));
    }
    buf
}
