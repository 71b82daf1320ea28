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

//! Interactive upgrade workflow
//!
//! Two phases run in sequence:
//!
//! 1. **Code sync**: fetch the toolkit repository and, after confirmation,
//!    fast-forward the working copy.
//! 2. **Version upgrade**: if the shipped (seed) version is newer than the
//!    installed one, stop services, back up and replace the installed version
//!    record, then optionally start services again.
//!
//! Declined prompts are reported through the outcome enums. Only refusing to
//! stop running services before a swap is an error.

use crate::compose::ComposeInvocation;
use crate::config::ToolkitConfig;
use crate::error::{DeployError, Result};
use crate::git::{SourceControl, notable_changes};
use crate::lock::UpgradeLock;
use crate::prompt::Prompter;
use crate::runtime::{ContainerRuntime, STATUS_ARGS, ensure_success};
use crate::telemetry::{UpgradeEvent, report_event};
use crate::version::{VersionRecord, VersionStore};
use std::fmt;
use tracing::{info, warn};

const RELEASE_NOTES_URL: &str = "https://github.com/SolarE-cz/fluxion/releases";

/// Prompts the workflow may issue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    PullCode,
    ConfirmUpgrade,
    StopServices,
    ConfirmProceed,
    RestartServices,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub step: Step,
    pub accepted: bool,
}

/// Run-scoped state, discarded when the run ends
#[derive(Debug, Clone, Default)]
pub struct UpgradeSession {
    pub branch: Option<String>,
    pub commit: Option<String>,
    pub services_stopped_by_session: bool,
    pub decisions: Vec<Decision>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeSyncOutcome {
    /// Dry-run fetch found nothing new
    NoUpdate,
    /// Fetched, but HEAD already matches upstream
    UpToDate,
    Pulled { from_commit: String, to_commit: String },
    Declined,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionUpgradeOutcome {
    /// Seed version is not newer than the installed one
    NoChange,
    Declined,
    /// Refused after services were (possibly) stopped. Nothing was swapped.
    Aborted { services_stopped: bool },
    Upgraded {
        from: VersionRecord,
        to: VersionRecord,
        services_restarted: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradeReport {
    pub code: CodeSyncOutcome,
    pub version: VersionUpgradeOutcome,
}

pub struct UpgradeController<'a> {
    config: &'a ToolkitConfig,
    versions: VersionStore,
    git: &'a dyn SourceControl,
    runtime: &'a dyn ContainerRuntime,
    prompter: &'a dyn Prompter,
    session: UpgradeSession,
}

impl fmt::Debug for UpgradeController<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpgradeController")
            .field("root", &self.config.root)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl<'a> UpgradeController<'a> {
    pub fn new(
        config: &'a ToolkitConfig,
        git: &'a dyn SourceControl,
        runtime: &'a dyn ContainerRuntime,
        prompter: &'a dyn Prompter,
    ) -> Self {
        Self {
            config,
            versions: VersionStore::new(&config.root),
            git,
            runtime,
            prompter,
            session: UpgradeSession::default(),
        }
    }

    pub fn session(&self) -> &UpgradeSession {
        &self.session
    }

    /// Code sync, then version upgrade
    pub fn run(&mut self) -> Result<UpgradeReport> {
        let code = self.sync_code()?;
        let version = self.upgrade_version()?;
        Ok(UpgradeReport { code, version })
    }

    pub fn sync_code(&mut self) -> Result<CodeSyncOutcome> {
        let branch = self.git.current_branch()?;
        let commit = self.git.short_commit()?;
        info!("Toolkit on branch {branch} at {commit}");
        self.session.branch = Some(branch.clone());
        self.session.commit = Some(commit.clone());

        if !self.git.remote_has_updates()? {
            info!("No toolkit code updates on {branch}");
            return Ok(CodeSyncOutcome::NoUpdate);
        }

        self.git.fetch()?;
        if self.git.local_matches_remote()? {
            info!("Toolkit code is up to date");
            return Ok(CodeSyncOutcome::UpToDate);
        }

        let changes = notable_changes(&self.git.changelog_diff()?);
        self.prompter
            .notify(&format!("Toolkit code updates are available on {branch}."));
        if changes.is_empty() {
            self.prompter.notify("No notable changes listed.");
        } else {
            self.prompter.notify("Notable changes:");
            for line in &changes {
                self.prompter.notify(&format!("  {line}"));
            }
        }

        if !self.ask(Step::PullCode, "Pull the latest toolkit code")? {
            info!("Toolkit code update skipped");
            return Ok(CodeSyncOutcome::Declined);
        }

        self.git.pull_fast_forward()?;
        let to_commit = self.git.short_commit()?;
        info!("Toolkit code updated {commit} -> {to_commit}");
        let _ = report_event(&UpgradeEvent::CodePulled {
            branch,
            from_commit: commit.clone(),
            to_commit: to_commit.clone(),
        });
        self.session.commit = Some(to_commit.clone());

        Ok(CodeSyncOutcome::Pulled {
            from_commit: commit,
            to_commit,
        })
    }

    pub fn upgrade_version(&mut self) -> Result<VersionUpgradeOutcome> {
        let installed = self.versions.installed()?;
        let seed = self.versions.seed()?;

        if !installed.is_upgrade_to(&seed) {
            info!("Installed version {installed} is current (shipped: {seed})");
            return Ok(VersionUpgradeOutcome::NoChange);
        }

        let _lock = UpgradeLock::acquire(&self.config.root)?;
        let current = self.versions.installed()?;
        if current != installed {
            return Err(DeployError::ConcurrentChange {
                expected: installed.to_string(),
                found: current.to_string(),
            });
        }

        self.prompter
            .notify(&format!("A new version is available: {installed} -> {seed}"));
        if installed.is_major_bump_to(&seed) {
            warn!("Major version upgrade {installed} -> {seed}");
            self.prompter.notify(&format!(
                "This is a major version upgrade. Read the release notes at {RELEASE_NOTES_URL} before continuing."
            ));
        }

        if !self.ask(Step::ConfirmUpgrade, &format!("Upgrade to {seed}"))? {
            info!("Upgrade to {seed} declined");
            return Ok(VersionUpgradeOutcome::Declined);
        }
        let _ = report_event(&UpgradeEvent::UpgradeStarted {
            from_version: installed.to_string(),
            to_version: seed.to_string(),
        });

        self.stop_running_services(&installed)?;

        self.prompter.notify(
            "Services are stopped. Back up your data directories now if you want a restore point.",
        );
        if !self.ask(Step::ConfirmProceed, "Proceed with the upgrade")? {
            let services_stopped = self.session.services_stopped_by_session;
            if services_stopped {
                warn!("Upgrade aborted, services stopped by this run remain stopped");
            }
            let _ = report_event(&UpgradeEvent::UpgradeAborted {
                step: "confirm_proceed".to_owned(),
                services_stopped,
            });
            return Ok(VersionUpgradeOutcome::Aborted { services_stopped });
        }

        self.versions.swap(&seed)?;
        let _ = report_event(&UpgradeEvent::VersionSwapped {
            from_version: installed.to_string(),
            to_version: seed.to_string(),
            backup_path: self.versions.backup_path().display().to_string(),
        });

        let services_restarted = self.maybe_restart(&seed)?;

        Ok(VersionUpgradeOutcome::Upgraded {
            from: installed,
            to: seed,
            services_restarted,
        })
    }

    /// Refusing to stop live services is fatal
    fn stop_running_services(&mut self, installed: &VersionRecord) -> Result<()> {
        let status = self.invocation(installed, &STATUS_ARGS)?;
        if !self.runtime.services_running(&status)? {
            info!("No services running");
            return Ok(());
        }

        if !self.ask(
            Step::StopServices,
            "Services are running and must be stopped before upgrading. Stop them now",
        )? {
            let _ = report_event(&UpgradeEvent::UpgradeAborted {
                step: "stop_services".to_owned(),
                services_stopped: false,
            });
            return Err(DeployError::Declined(
                "services must be stopped before the installed version can change".to_owned(),
            ));
        }

        let stop = status.with_args(&["stop"]);
        ensure_success(&stop, self.runtime.execute(&stop)?)?;
        self.session.services_stopped_by_session = true;
        let _ = report_event(&UpgradeEvent::ServicesStopped);
        Ok(())
    }

    fn maybe_restart(&mut self, version: &VersionRecord) -> Result<bool> {
        if !self.session.services_stopped_by_session {
            return Ok(false);
        }

        if !self.ask(Step::RestartServices, &format!("Start services with {version}"))? {
            self.prompter
                .notify("Services remain stopped. Start them with `fluxion-deploy compose up -d`.");
            return Ok(false);
        }

        let up = self.invocation(version, &["up", "-d"])?;
        ensure_success(&up, self.runtime.execute(&up)?)?;
        let _ = report_event(&UpgradeEvent::ServicesRestarted);
        Ok(true)
    }

    fn invocation(&self, version: &VersionRecord, args: &[&str]) -> Result<ComposeInvocation> {
        ComposeInvocation::build(self.config, version.as_str(), args)
    }

    fn ask(&mut self, step: Step, question: &str) -> Result<bool> {
        let accepted = self.prompter.confirm(question)?;
        self.session.decisions.push(Decision { step, accepted });
        Ok(accepted)
    }
}
