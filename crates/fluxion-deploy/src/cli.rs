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

//! Command-line surface and command dispatch
//!
//! The binary only wires real collaborators (docker, git, the terminal) into
//! these functions.

use crate::compose::ComposeInvocation;
use crate::config::{ToolkitConfig, find_toolkit_root};
use crate::error::Result;
use crate::git::SourceControl;
use crate::prompt::Prompter;
use crate::runtime::ContainerRuntime;
use crate::upgrade::{CodeSyncOutcome, UpgradeController, UpgradeReport, VersionUpgradeOutcome};
use crate::version::VersionStore;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

/// Exit status for failures the tool reports itself
pub const FAILURE_STATUS: u8 = 1;

#[derive(Debug, Parser)]
#[command(name = "fluxion-deploy")]
#[command(version, about = "Run and upgrade a FluxION docker compose stack")]
pub struct Cli {
    /// Toolkit root (default: nearest ancestor containing compose/base.yml)
    #[arg(long, env = "FLUXION_DEPLOY_ROOT", value_name = "DIR")]
    pub root: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run docker compose with the configured overlays, e.g. `compose up -d`
    Compose {
        /// Print the resolved environment and arguments before running
        #[arg(long)]
        debug: bool,

        /// Arguments passed through to docker compose
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Update the toolkit checkout and upgrade the installed FluxION version
    Upgrade,
}

/// Find the toolkit root from `cwd` (or the explicit root) and load `deploy.env`
pub fn load_toolkit(explicit: Option<&Path>, cwd: &Path) -> Result<ToolkitConfig> {
    let root = find_toolkit_root(explicit, cwd)?;
    ToolkitConfig::load(&root)
}

/// Forward `args` to the runtime. Returns the runtime's exit status.
pub fn run_compose<S: AsRef<str>>(
    config: &ToolkitConfig,
    runtime: &dyn ContainerRuntime,
    debug: bool,
    args: &[S],
) -> Result<u8> {
    let installed = VersionStore::new(&config.root).installed()?;
    let mut invocation = ComposeInvocation::build(config, installed.as_str(), args)?;
    invocation.debug |= debug;

    let code = runtime.execute(&invocation)?;
    Ok(exit_status(code))
}

/// Runtime exit code as a process status; anything out of range is a failure
pub fn exit_status(code: i32) -> u8 {
    u8::try_from(code).unwrap_or(FAILURE_STATUS)
}

pub fn run_upgrade(
    config: &ToolkitConfig,
    git: &dyn SourceControl,
    runtime: &dyn ContainerRuntime,
    prompter: &dyn Prompter,
) -> Result<UpgradeReport> {
    UpgradeController::new(config, git, runtime, prompter).run()
}

/// Summary printed after an upgrade run
pub fn report_lines(report: &UpgradeReport) -> Vec<String> {
    let mut lines = Vec::new();

    lines.push(match &report.code {
        CodeSyncOutcome::NoUpdate | CodeSyncOutcome::UpToDate => {
            "Toolkit code: up to date".to_owned()
        }
        CodeSyncOutcome::Pulled {
            from_commit,
            to_commit,
        } => format!("Toolkit code: updated {from_commit} -> {to_commit}"),
        CodeSyncOutcome::Declined => "Toolkit code: update skipped".to_owned(),
    });

    match &report.version {
        VersionUpgradeOutcome::NoChange => lines.push("FluxION version: no change".to_owned()),
        VersionUpgradeOutcome::Declined => {
            lines.push("FluxION version: upgrade declined".to_owned());
        }
        VersionUpgradeOutcome::Aborted { services_stopped } => {
            lines.push("FluxION version: upgrade aborted, version unchanged".to_owned());
            if *services_stopped {
                lines.push(
                    "Services are still stopped. Start them with `fluxion-deploy compose up -d`."
                        .to_owned(),
                );
            }
        }
        VersionUpgradeOutcome::Upgraded {
            from,
            to,
            services_restarted,
        } => {
            lines.push(format!("FluxION version: upgraded {from} -> {to}"));
            if !services_restarted {
                lines.push(
                    "Start services with `fluxion-deploy compose up -d` when ready.".to_owned(),
                );
            }
        }
    }

    lines
}
