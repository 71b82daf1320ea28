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

//! Source-control collaborator used by the code sync phase

use crate::error::{DeployError, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use tracing::debug;

pub const CHANGELOG_FILE: &str = "CHANGELOG.md";

/// Remote tracking ref of the current branch
const UPSTREAM: &str = "@{u}";

pub trait SourceControl {
    fn current_branch(&self) -> Result<String>;

    fn short_commit(&self) -> Result<String>;

    /// Dry-run fetch; true if the remote has anything new
    fn remote_has_updates(&self) -> Result<bool>;

    fn fetch(&self) -> Result<()>;

    /// True if HEAD already equals the fetched upstream
    fn local_matches_remote(&self) -> Result<bool>;

    /// Zero-context diff of the changelog between HEAD and upstream
    fn changelog_diff(&self) -> Result<String>;

    fn pull_fast_forward(&self) -> Result<()>;
}

/// `git` executable driven in the toolkit root
#[derive(Debug, Clone)]
pub struct GitCli {
    git: PathBuf,
    repo_dir: PathBuf,
}

impl GitCli {
    pub fn new(repo_dir: &Path) -> Result<Self> {
        let git = which::which("git").map_err(|_| DeployError::MissingBinary("git"))?;
        Ok(Self {
            git,
            repo_dir: repo_dir.to_path_buf(),
        })
    }

    fn run(&self, args: &[&str]) -> Result<Output> {
        let mut cmd = Command::new(&self.git);
        cmd.args(args)
            .current_dir(&self.repo_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        debug!(command = ?cmd, "Running git");
        let output = cmd.output()?;

        if !output.status.success() {
            return Err(DeployError::ExternalCommand {
                command: format!("git {}", args.join(" ")),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        Ok(output)
    }

    fn stdout(&self, args: &[&str]) -> Result<String> {
        let output = self.run(args)?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_owned())
    }
}

impl SourceControl for GitCli {
    fn current_branch(&self) -> Result<String> {
        self.stdout(&["rev-parse", "--abbrev-ref", "HEAD"])
    }

    fn short_commit(&self) -> Result<String> {
        self.stdout(&["rev-parse", "--short", "HEAD"])
    }

    fn remote_has_updates(&self) -> Result<bool> {
        // git reports fetched refs on stderr
        let output = self.run(&["fetch", "--dry-run"])?;
        Ok(!output.stdout.trim_ascii().is_empty() || !output.stderr.trim_ascii().is_empty())
    }

    fn fetch(&self) -> Result<()> {
        self.run(&["fetch"]).map(|_| ())
    }

    fn local_matches_remote(&self) -> Result<bool> {
        let local = self.stdout(&["rev-parse", "HEAD"])?;
        let remote = self.stdout(&["rev-parse", UPSTREAM])?;
        Ok(local == remote)
    }

    fn changelog_diff(&self) -> Result<String> {
        self.stdout(&["diff", "--unified=0", "HEAD", UPSTREAM, "--", CHANGELOG_FILE])
    }

    fn pull_fast_forward(&self) -> Result<()> {
        self.run(&["pull", "--ff-only"]).map(|_| ())
    }
}

/// Added changelog lines from a unified diff, without the leading `+`
pub fn notable_changes(diff: &str) -> Vec<String> {
    diff.lines()
        .filter(|line| !line.starts_with("+++"))
        .filter_map(|line| line.strip_prefix('+'))
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty())
        .map(str::to_owned)
        .collect()
}
