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

//! Exclusive lock file guarding the version swap
//!
//! The file records the holder's pid. A lock left behind by a process that
//! no longer exists (killed at a prompt, for example) is reclaimed.

use crate::error::{DeployError, Result};
use chrono::Utc;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const LOCK_FILE: &str = ".upgrade.lock";

/// Held while an upgrade may mutate the version record. Removed on drop.
#[derive(Debug)]
pub struct UpgradeLock {
    path: PathBuf,
}

impl UpgradeLock {
    pub fn acquire(root: &Path) -> Result<Self> {
        let path = root.join(LOCK_FILE);
        match Self::create(path) {
            Err(DeployError::Locked(path)) => match holder_pid(&path) {
                Some(pid) if !process_alive(pid) => {
                    warn!("Reclaiming {} left by exited process {pid}", path.display());
                    match fs::remove_file(&path) {
                        Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
                        _ => Self::create(path),
                    }
                }
                _ => Err(DeployError::Locked(path)),
            },
            result => result,
        }
    }

    fn create(path: PathBuf) -> Result<Self> {
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(DeployError::Locked(path));
            }
            Err(e) => return Err(e.into()),
        };

        // From here on a failed write still removes the file on drop
        let lock = Self { path };
        writeln!(file, "pid={}", std::process::id())?;
        writeln!(file, "acquired_at={}", Utc::now().to_rfc3339())?;
        debug!("Acquired {}", lock.path.display());

        Ok(lock)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for UpgradeLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            warn!("Failed to remove {}: {e}", self.path.display());
        }
    }
}

/// Pid recorded in a lock file. `None` if unreadable or not yet written.
fn holder_pid(path: &Path) -> Option<i32> {
    fs::read_to_string(path)
        .ok()?
        .lines()
        .find_map(|line| line.strip_prefix("pid="))?
        .trim()
        .parse()
        .ok()
        .filter(|pid| *pid > 0)
}

#[cfg(unix)]
fn process_alive(pid: i32) -> bool {
    use nix::errno::Errno;
    use nix::sys::signal;
    use nix::unistd::Pid;

    // Signal 0 only checks for existence; EPERM still means it exists
    !matches!(signal::kill(Pid::from_raw(pid), None), Err(Errno::ESRCH))
}

#[cfg(not(unix))]
fn process_alive(_pid: i32) -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_lock_is_exclusive_and_released() {
        let dir = TempDir::new().unwrap();

        let lock = UpgradeLock::acquire(dir.path()).unwrap();
        assert!(lock.path().exists());
        assert!(
            fs::read_to_string(lock.path())
                .unwrap()
                .starts_with("pid=")
        );

        let err = UpgradeLock::acquire(dir.path()).unwrap_err();
        assert!(matches!(err, DeployError::Locked(_)));

        drop(lock);
        assert!(!dir.path().join(LOCK_FILE).exists());
        assert!(UpgradeLock::acquire(dir.path()).is_ok());
    }

    /// Pid of a child that has already been reaped
    #[cfg(unix)]
    fn exited_pid() -> u32 {
        let mut child = std::process::Command::new("true").spawn().unwrap();
        let pid = child.id();
        child.wait().unwrap();
        pid
    }

    #[cfg(unix)]
    #[test]
    fn test_lock_of_exited_process_is_reclaimed() {
        let dir = TempDir::new().unwrap();
        std::mem::forget(UpgradeLock::acquire(dir.path()).unwrap());
        fs::write(
            dir.path().join(LOCK_FILE),
            format!("pid={}\nacquired_at=2025-01-01T00:00:00+00:00\n", exited_pid()),
        )
        .unwrap();

        let lock = UpgradeLock::acquire(dir.path()).unwrap();
        let pid = i32::try_from(std::process::id()).unwrap();
        assert_eq!(holder_pid(lock.path()), Some(pid));
    }

    #[test]
    fn test_leaked_lock_of_live_process_still_blocks() {
        let dir = TempDir::new().unwrap();
        std::mem::forget(UpgradeLock::acquire(dir.path()).unwrap());

        let err = UpgradeLock::acquire(dir.path()).unwrap_err();
        assert!(matches!(err, DeployError::Locked(_)));
    }

    #[test]
    fn test_lock_without_pid_is_not_reclaimed() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(LOCK_FILE), "").unwrap();

        let err = UpgradeLock::acquire(dir.path()).unwrap_err();
        assert!(matches!(err, DeployError::Locked(_)));
        assert!(dir.path().join(LOCK_FILE).exists());
    }
}
