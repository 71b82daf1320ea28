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

//! Container runtime collaborator
//!
//! Executes a [`ComposeInvocation`] through `docker compose` (or the legacy
//! standalone `docker-compose`) and answers whether services are running.

use crate::compose::ComposeInvocation;
use crate::error::{DeployError, Result};
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tracing::{debug, info};

/// Sub-command used to query running services
pub const STATUS_ARGS: [&str; 1] = ["top"];

pub trait ContainerRuntime {
    /// Run the invocation with inherited stdio, returning the exit code
    fn execute(&self, invocation: &ComposeInvocation) -> Result<i32>;

    /// True if the project has running containers
    fn services_running(&self, invocation: &ComposeInvocation) -> Result<bool>;
}

/// How the compose engine is reached
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComposeCommand {
    /// `docker compose ...`
    Plugin(PathBuf),
    /// `docker-compose ...`
    Standalone(PathBuf),
}

#[derive(Debug, Clone)]
pub struct DockerCompose {
    command: ComposeCommand,
}

impl DockerCompose {
    pub fn new(command: ComposeCommand) -> Self {
        Self { command }
    }

    /// Prefer the compose plugin, fall back to the standalone binary
    pub fn detect() -> Result<Self> {
        if let Ok(docker) = which::which("docker") {
            let plugin_ok = Command::new(&docker)
                .args(["compose", "version"])
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .is_ok_and(|s| s.success());
            if plugin_ok {
                debug!("Using compose plugin of {}", docker.display());
                return Ok(Self::new(ComposeCommand::Plugin(docker)));
            }
        }

        let standalone =
            which::which("docker-compose").map_err(|_| DeployError::MissingBinary("docker"))?;
        debug!("Using standalone {}", standalone.display());
        Ok(Self::new(ComposeCommand::Standalone(standalone)))
    }

    /// Full command line (program excluded) for an invocation
    pub fn command_args(&self, invocation: &ComposeInvocation) -> Vec<OsString> {
        let mut args = Vec::new();
        if matches!(self.command, ComposeCommand::Plugin(_)) {
            args.push(OsString::from("compose"));
        }
        args.extend(invocation.compose_args());
        args
    }

    pub fn command(&self, invocation: &ComposeInvocation) -> Command {
        let program = match &self.command {
            ComposeCommand::Plugin(path) | ComposeCommand::Standalone(path) => path,
        };

        let mut cmd = Command::new(program);
        cmd.args(self.command_args(invocation))
            .envs(&invocation.env)
            .current_dir(&invocation.root);
        cmd
    }
}

impl ContainerRuntime for DockerCompose {
    fn execute(&self, invocation: &ComposeInvocation) -> Result<i32> {
        if invocation.debug {
            eprint!("{}", invocation.debug_dump());
        }

        let mut cmd = self.command(invocation);
        info!("Running compose {}", invocation.args.join(" "));
        let status = cmd.status()?;

        // Terminated by a signal
        Ok(status.code().unwrap_or(1))
    }

    fn services_running(&self, invocation: &ComposeInvocation) -> Result<bool> {
        let status_query = invocation.with_args(&STATUS_ARGS);
        if status_query.debug {
            eprint!("{}", status_query.debug_dump());
        }

        let output = self
            .command(&status_query)
            .stdin(Stdio::null())
            .output()?;

        if !output.status.success() {
            return Err(DeployError::ExternalCommand {
                command: format!("compose {}", STATUS_ARGS.join(" ")),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        Ok(!String::from_utf8_lossy(&output.stdout).trim().is_empty())
    }
}

/// Turn a non-zero exit code into an [`DeployError::ExternalCommand`]
pub fn ensure_success(invocation: &ComposeInvocation, code: i32) -> Result<()> {
    if code == 0 {
        Ok(())
    } else {
        Err(DeployError::ExternalCommand {
            command: format!("compose {}", invocation.args.join(" ")),
            status: format!("exit code {code}"),
            stderr: String::new(),
        })
    }
}
