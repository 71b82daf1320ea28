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

//! Compose invocation builder
//!
//! Maps a [`ToolkitConfig`] and the installed version onto the ordered overlay
//! list, the environment exported to the runtime and the trailing sub-command.
//! Nothing here touches the process environment; the runtime applies `env`
//! to the child process only.

use crate::config::{BASE_OVERLAY, Feature, PathSetting, ToolkitConfig};
use crate::error::Result;
use crate::version::VersionRecord;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fmt::Write as _;
use std::path::PathBuf;

/// User-supplied overlay merged after every feature overlay
pub const OVERRIDE_OVERLAY: &str = "docker-compose.override.yml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposeInvocation {
    /// Working directory of the runtime process
    pub root: PathBuf,

    pub project_name: String,

    /// Absolute overlay paths in merge order
    pub overlays: Vec<PathBuf>,

    /// Variables exported to the runtime process
    pub env: BTreeMap<String, String>,

    /// Trailing sub-command and arguments (`up -d`, `stop`, ...)
    pub args: Vec<String>,

    pub debug: bool,
}

impl ComposeInvocation {
    /// Build the invocation for `installed`, failing on a malformed version
    /// before anything is executed.
    pub fn build<S: AsRef<str>>(
        config: &ToolkitConfig,
        installed: &str,
        args: &[S],
    ) -> Result<Self> {
        let version = VersionRecord::parse(installed)?;

        Ok(Self {
            root: config.root.clone(),
            project_name: config.project_name.clone(),
            overlays: select_overlays(config),
            env: build_env(config, &version),
            args: args.iter().map(|a| a.as_ref().to_owned()).collect(),
            debug: config.debug,
        })
    }

    /// Same overlays and environment with a different sub-command
    #[must_use]
    pub fn with_args<S: AsRef<str>>(&self, args: &[S]) -> Self {
        Self {
            args: args.iter().map(|a| a.as_ref().to_owned()).collect(),
            ..self.clone()
        }
    }

    /// Arguments following the compose command itself
    pub fn compose_args(&self) -> Vec<OsString> {
        let mut out: Vec<OsString> = vec!["-p".into(), self.project_name.clone().into()];
        for overlay in &self.overlays {
            out.push("-f".into());
            out.push(overlay.clone().into_os_string());
        }
        out.extend(self.args.iter().map(OsString::from));
        out
    }

    /// Human-readable dump of the resolved variables and arguments
    pub fn debug_dump(&self) -> String {
        let mut out = String::from("Resolved environment:\n");
        for (key, value) in &self.env {
            let _ = writeln!(out, "  {key}={value}");
        }
        out.push_str("Compose arguments:\n ");
        for arg in self.compose_args() {
            let _ = write!(out, " {}", arg.to_string_lossy());
        }
        out.push('\n');
        out
    }
}

fn select_overlays(config: &ToolkitConfig) -> Vec<PathBuf> {
    let mut overlays = vec![config.root.join(BASE_OVERLAY)];

    overlays.extend(
        Feature::ORDERED
            .into_iter()
            .filter(|f| config.features.is_enabled(*f))
            .map(|f| config.root.join(f.overlay())),
    );

    let user_override = config.root.join(OVERRIDE_OVERLAY);
    if user_override.is_file() {
        overlays.push(user_override);
    }

    overlays
}

fn build_env(config: &ToolkitConfig, version: &VersionRecord) -> BTreeMap<String, String> {
    let mut env = BTreeMap::new();

    env.insert("APP_IMAGE".to_owned(), format!("{}:{version}", config.image()));
    env.insert("APP_VERSION".to_owned(), version.to_string());
    env.insert(
        "BIND_ADDRESS".to_owned(),
        config.effective_bind_address().to_owned(),
    );

    for setting in PathSetting::ALL {
        if let Some(path) = config.resolved_path(setting) {
            env.insert(setting.key().to_owned(), path.to_string_lossy().into_owned());
        }
    }

    if let Some(port) = &config.http_port {
        env.insert("HTTP_PORT".to_owned(), port.clone());
    }
    if let Some(port) = &config.https_port {
        env.insert("HTTPS_PORT".to_owned(), port.clone());
    }

    env
}
