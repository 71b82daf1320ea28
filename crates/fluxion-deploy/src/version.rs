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

//! Version record parsing, comparison and the on-disk version store

use crate::error::{DeployError, Result};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const SEED_VERSION_FILE: &str = "VERSION";
pub const INSTALLED_VERSION_FILE: &str = ".installed-version";
pub const BACKUP_VERSION_FILE: &str = ".installed-version.bak";

const RC_SUFFIX: &str = "-RC";

/// A validated `MAJOR.MINOR.PATCH[-RC]` version string
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionRecord(String);

impl VersionRecord {
    /// Validate against `^\d+\.\d+\.\d+(-RC)?$`
    pub fn parse(s: &str) -> Result<Self> {
        let core = s.strip_suffix(RC_SUFFIX).unwrap_or(s);
        let parts: Vec<&str> = core.split('.').collect();

        let valid = parts.len() == 3
            && parts
                .iter()
                .all(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()));

        if valid {
            Ok(Self(s.to_owned()))
        } else {
            Err(DeployError::InvalidVersion(s.to_owned()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric major component
    pub fn major(&self) -> u64 {
        self.0
            .split('.')
            .next()
            .and_then(|m| m.parse().ok())
            .unwrap_or(u64::MAX)
    }

    pub fn is_release_candidate(&self) -> bool {
        self.0.ends_with(RC_SUFFIX)
    }

    /// Returns true if `candidate` should replace `self`.
    ///
    /// The comparison is lexicographic over the full strings, not per
    /// component. It only orders correctly while every component keeps the
    /// same digit width (`4.2.9` sorts after `4.10.0`).
    pub fn is_upgrade_to(&self, candidate: &VersionRecord) -> bool {
        candidate.0 > self.0
    }

    /// Major component strictly increases from `self` to `candidate`
    pub fn is_major_bump_to(&self, candidate: &VersionRecord) -> bool {
        candidate.major() > self.major()
    }
}

impl fmt::Display for VersionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// File-backed installed/seed/backup version slots inside the toolkit root
#[derive(Debug, Clone)]
pub struct VersionStore {
    seed_path: PathBuf,
    installed_path: PathBuf,
    backup_path: PathBuf,
}

impl VersionStore {
    pub fn new(root: &Path) -> Self {
        Self {
            seed_path: root.join(SEED_VERSION_FILE),
            installed_path: root.join(INSTALLED_VERSION_FILE),
            backup_path: root.join(BACKUP_VERSION_FILE),
        }
    }

    pub fn installed_path(&self) -> &Path {
        &self.installed_path
    }

    pub fn backup_path(&self) -> &Path {
        &self.backup_path
    }

    pub fn seed(&self) -> Result<VersionRecord> {
        read_version(&self.seed_path)
    }

    /// Read the installed version, seeding it on first run
    pub fn installed(&self) -> Result<VersionRecord> {
        if !self.installed_path.exists() {
            let seed = self.seed()?;
            info!(
                "No installed version recorded, initializing {} with {seed}",
                self.installed_path.display()
            );
            write_atomic(&self.installed_path, seed.as_str())?;
            return Ok(seed);
        }
        read_version(&self.installed_path)
    }

    /// Back up the installed record, then replace it with `new`.
    pub fn swap(&self, new: &VersionRecord) -> Result<()> {
        fs::copy(&self.installed_path, &self.backup_path)?;
        info!(
            "Backed up {} to {}",
            self.installed_path.display(),
            self.backup_path.display()
        );

        write_atomic(&self.installed_path, new.as_str())?;
        info!("Installed version set to {new}");
        Ok(())
    }
}

fn read_version(path: &Path) -> Result<VersionRecord> {
    let content = fs::read_to_string(path).map_err(|e| {
        DeployError::Config(format!("Failed to read version file {}: {e}", path.display()))
    })?;
    VersionRecord::parse(content.trim())
}

fn write_atomic(path: &Path, version: &str) -> Result<()> {
    let temp_path = path.with_extension("tmp");
    let written =
        fs::write(&temp_path, format!("{version}\n")).and_then(|()| fs::rename(&temp_path, path));
    if let Err(e) = written {
        let _ = fs::remove_file(&temp_path);
        return Err(e.into());
    }
    Ok(())
}
