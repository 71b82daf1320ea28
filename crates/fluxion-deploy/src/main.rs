// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of FluxION.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

//! FluxION Deploy - entry point
//!
//! `fluxion-deploy compose <ARGS>...` forwards arguments to docker compose
//! with the overlays and environment derived from `deploy.env`.
//! `fluxion-deploy upgrade` runs the interactive upgrade workflow.

use anyhow::{Context, Result};
use clap::Parser;
use fluxion_deploy::cli::{self, Cli, Command, FAILURE_STATUS};
use fluxion_deploy::git::GitCli;
use fluxion_deploy::prompt::TerminalPrompter;
use fluxion_deploy::runtime::DockerCompose;
use std::process::ExitCode;
use tracing::error;

fn main() -> ExitCode {
    let opts = Cli::parse();

    if let Err(e) = init_logging() {
        eprintln!("Failed to initialize logging: {e:#}");
        return ExitCode::from(FAILURE_STATUS);
    }

    match run(opts) {
        Ok(status) => ExitCode::from(status),
        Err(e) => {
            error!("{e:#}");
            ExitCode::from(FAILURE_STATUS)
        }
    }
}

fn run(opts: Cli) -> Result<u8> {
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    let config = cli::load_toolkit(opts.root.as_deref(), &cwd)?;
    let runtime = DockerCompose::detect()?;

    match opts.command {
        Command::Compose { debug, args } => {
            Ok(cli::run_compose(&config, &runtime, debug, args.as_slice())?)
        }
        Command::Upgrade => {
            let git = GitCli::new(&config.root)?;
            let report = cli::run_upgrade(&config, &git, &runtime, &TerminalPrompter)?;
            for line in cli::report_lines(&report) {
                println!("{line}");
            }
            Ok(0)
        }
    }
}

/// Initialize tracing, respecting RUST_LOG
fn init_logging() -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new("fluxion_deploy=info"))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init()
        .map_err(|e| anyhow::anyhow!("{e}"))?;

    Ok(())
}
