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

//! Error types for the deploy crate

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeployError {
    #[error("toolkit root not found (looked for {marker} from {})", .start.display())]
    RootNotFound { start: PathBuf, marker: &'static str },

    #[error("config error: {0}")]
    Config(String),

    #[error("invalid version {0:?}, expected MAJOR.MINOR.PATCH with optional -RC suffix")]
    InvalidVersion(String),

    #[error("required executable not found: {0}")]
    MissingBinary(&'static str),

    #[error("`{command}` exited with {status}{}", stderr_suffix(.stderr))]
    ExternalCommand {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("aborted: {0}")]
    Declined(String),

    #[error("upgrade lock {} is held by another run (remove it if stale)", .0.display())]
    Locked(PathBuf),

    #[error("installed version changed from {expected} to {found} during the upgrade")]
    ConcurrentChange { expected: String, found: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("event serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Coarse classification used for reporting and exit handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    ExternalCommand,
    UserDeclinedFatal,
}

impl DeployError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::RootNotFound { .. }
            | Self::Config(_)
            | Self::InvalidVersion(_)
            | Self::MissingBinary(_)
            | Self::Locked(_)
            | Self::ConcurrentChange { .. }
            | Self::Io(_)
            | Self::Json(_) => ErrorKind::Configuration,
            Self::ExternalCommand { .. } => ErrorKind::ExternalCommand,
            Self::Declined(_) => ErrorKind::UserDeclinedFatal,
        }
    }
}

fn stderr_suffix(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(": {trimmed}")
    }
}

pub type Result<T> = std::result::Result<T, DeployError>;
