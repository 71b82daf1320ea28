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

//! FluxION Deploy - compose invocation builder and upgrade workflow
//!
//! Turns the toolkit's `deploy.env` into a `docker compose` invocation with
//! the right overlays and environment, and drives the interactive upgrade of
//! both the toolkit checkout and the pinned application version.

pub mod cli;
pub mod compose;
pub mod config;
pub mod error;
pub mod git;
pub mod lock;
pub mod prompt;
pub mod runtime;
pub mod telemetry;
pub mod upgrade;
pub mod version;

pub use compose::ComposeInvocation;
pub use config::{Feature, ToolkitConfig, find_toolkit_root};
pub use error::{DeployError, ErrorKind};
pub use upgrade::{
    CodeSyncOutcome, UpgradeController, UpgradeReport, UpgradeSession, VersionUpgradeOutcome,
};
pub use version::{VersionRecord, VersionStore};
