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

//! Toolkit root discovery and `deploy.env` loading

use crate::error::{DeployError, Result};
use std::path::{Path, PathBuf};
use tracing::{trace, warn};

pub const CONFIG_FILE: &str = "deploy.env";
pub const BASE_OVERLAY: &str = "compose/base.yml";

const DEFAULT_PROJECT_NAME: &str = "fluxion";
const DEFAULT_IMAGE: &str = "ghcr.io/solare-cz/fluxion";
const DEFAULT_SERVER_IMAGE: &str = "ghcr.io/solare-cz/fluxion-server";
pub const WILDCARD_BIND_ADDRESS: &str = "0.0.0.0";

/// Optional features, in the order their overlays are merged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    Cache,
    Datastore,
    DockerAccess,
    Proxy,
}

impl Feature {
    pub const ORDERED: [Feature; 4] = [
        Self::Cache,
        Self::Datastore,
        Self::DockerAccess,
        Self::Proxy,
    ];

    pub fn config_key(self) -> &'static str {
        match self {
            Self::Cache => "ENABLE_CACHE",
            Self::Datastore => "ENABLE_DATASTORE",
            Self::DockerAccess => "ENABLE_DOCKER_ACCESS",
            Self::Proxy => "ENABLE_PROXY",
        }
    }

    /// Overlay file, relative to the toolkit root
    pub fn overlay(self) -> &'static str {
        match self {
            Self::Cache => "compose/cache.yml",
            Self::Datastore => "compose/datastore.yml",
            Self::DockerAccess => "compose/docker-socket.yml",
            Self::Proxy => "compose/proxy.yml",
        }
    }
}

/// Path-valued settings, exported under the same name once made absolute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathSetting {
    AppDataDir,
    DbDataDir,
    CacheDataDir,
    TlsCertPath,
    TlsKeyPath,
    ProxyConfigPath,
}

impl PathSetting {
    pub const ALL: [PathSetting; 6] = [
        Self::AppDataDir,
        Self::DbDataDir,
        Self::CacheDataDir,
        Self::TlsCertPath,
        Self::TlsKeyPath,
        Self::ProxyConfigPath,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Self::AppDataDir => "APP_DATA_DIR",
            Self::DbDataDir => "DB_DATA_DIR",
            Self::CacheDataDir => "CACHE_DATA_DIR",
            Self::TlsCertPath => "TLS_CERT_PATH",
            Self::TlsKeyPath => "TLS_KEY_PATH",
            Self::ProxyConfigPath => "PROXY_CONFIG_PATH",
        }
    }

    fn index(self) -> usize {
        match self {
            Self::AppDataDir => 0,
            Self::DbDataDir => 1,
            Self::CacheDataDir => 2,
            Self::TlsCertPath => 3,
            Self::TlsKeyPath => 4,
            Self::ProxyConfigPath => 5,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeatureFlags {
    pub cache: bool,
    pub datastore: bool,
    pub docker_access: bool,
    pub proxy: bool,
}

impl FeatureFlags {
    pub fn is_enabled(&self, feature: Feature) -> bool {
        match feature {
            Feature::Cache => self.cache,
            Feature::Datastore => self.datastore,
            Feature::DockerAccess => self.docker_access,
            Feature::Proxy => self.proxy,
        }
    }

    fn set(&mut self, feature: Feature, enabled: bool) {
        match feature {
            Feature::Cache => self.cache = enabled,
            Feature::Datastore => self.datastore = enabled,
            Feature::DockerAccess => self.docker_access = enabled,
            Feature::Proxy => self.proxy = enabled,
        }
    }
}

/// Settings read from `deploy.env`. Immutable for the duration of a run.
#[derive(Debug, Clone)]
pub struct ToolkitConfig {
    /// Toolkit root every relative path is resolved against
    pub root: PathBuf,

    pub features: FeatureFlags,

    pub project_name: String,

    /// Explicit image override (`IMAGE_NAME`)
    pub image_name: Option<String>,

    pub server_edition: bool,

    /// Raw path settings, indexed by `PathSetting`
    paths: [Option<String>; 6],

    /// `PUBLIC_BIND_ADDRESS`, unset means wildcard
    pub bind_address: Option<String>,

    pub http_port: Option<String>,
    pub https_port: Option<String>,

    pub debug: bool,
}

impl ToolkitConfig {
    /// Defaults for a root with an empty configuration
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            features: FeatureFlags::default(),
            project_name: DEFAULT_PROJECT_NAME.to_owned(),
            image_name: None,
            server_edition: false,
            paths: Default::default(),
            bind_address: None,
            http_port: None,
            https_port: None,
            debug: false,
        }
    }

    /// Build from `(key, value)` pairs. Unknown keys and empty values are ignored.
    pub fn from_pairs<I, K, V>(root: impl Into<PathBuf>, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut config = Self::new(root);
        for (key, value) in pairs {
            let value: String = value.into();
            if value.is_empty() {
                continue;
            }
            config.apply(key.as_ref(), value);
        }
        config
    }

    /// Load `<root>/deploy.env`. A relative root is made absolute first.
    pub fn load(root: &Path) -> Result<Self> {
        let root = std::path::absolute(root)?;
        let path = root.join(CONFIG_FILE);
        if !path.exists() {
            return Err(DeployError::Config(format!(
                "Configuration file {} not found",
                path.display()
            )));
        }

        let iter = dotenvy::from_path_iter(&path).map_err(|e| {
            DeployError::Config(format!("Failed to open {}: {e}", path.display()))
        })?;
        let pairs = iter
            .collect::<std::result::Result<Vec<(String, String)>, _>>()
            .map_err(|e| {
                DeployError::Config(format!("Failed to parse {}: {e}", path.display()))
            })?;

        let config = Self::from_pairs(root, pairs);
        if config.bind_address.is_none() {
            warn!("PUBLIC_BIND_ADDRESS is not set, binding to {WILDCARD_BIND_ADDRESS}");
        }
        Ok(config)
    }

    fn apply(&mut self, key: &str, value: String) {
        if let Some(feature) = Feature::ORDERED.into_iter().find(|f| f.config_key() == key) {
            self.features.set(feature, is_true(&value));
            return;
        }
        if let Some(setting) = PathSetting::ALL.into_iter().find(|p| p.key() == key) {
            self.paths[setting.index()] = Some(value);
            return;
        }

        match key {
            "PROJECT_NAME" => self.project_name = value,
            "IMAGE_NAME" => self.image_name = Some(value),
            "SERVER_EDITION" => self.server_edition = is_true(&value),
            "PUBLIC_BIND_ADDRESS" => self.bind_address = Some(value),
            "HTTP_PORT" => self.http_port = Some(value),
            "HTTPS_PORT" => self.https_port = Some(value),
            "DEBUG" => self.debug = is_true(&value),
            _ => trace!("Ignoring unrecognized configuration key {key}"),
        }
    }

    /// Image repository without tag
    pub fn image(&self) -> &str {
        match (&self.image_name, self.server_edition) {
            (Some(name), _) => name.as_str(),
            (None, true) => DEFAULT_SERVER_IMAGE,
            (None, false) => DEFAULT_IMAGE,
        }
    }

    pub fn raw_path(&self, setting: PathSetting) -> Option<&str> {
        self.paths[setting.index()].as_deref()
    }

    /// Path setting made absolute against the toolkit root
    pub fn resolved_path(&self, setting: PathSetting) -> Option<PathBuf> {
        self.raw_path(setting).map(|raw| self.root.join(raw))
    }

    /// Bind address, falling back to the wildcard address. `load` warns
    /// about the fallback once.
    pub fn effective_bind_address(&self) -> &str {
        self.bind_address.as_deref().unwrap_or(WILDCARD_BIND_ADDRESS)
    }
}

/// Only the literal `true` enables a flag
fn is_true(value: &str) -> bool {
    value == "true"
}

/// Locate the toolkit root.
///
/// An explicit root must contain the base overlay and, when relative, is taken
/// relative to `start`. Otherwise `start` and its ancestors are searched for
/// the first directory that does. The returned root is always absolute.
pub fn find_toolkit_root(explicit: Option<&Path>, start: &Path) -> Result<PathBuf> {
    let start = std::path::absolute(start)?;

    if let Some(root) = explicit {
        let root = start.join(root);
        if root.join(BASE_OVERLAY).is_file() {
            return Ok(root);
        }
        return Err(DeployError::RootNotFound {
            start: root,
            marker: BASE_OVERLAY,
        });
    }

    start
        .ancestors()
        .find(|dir| dir.join(BASE_OVERLAY).is_file())
        .map(Path::to_path_buf)
        .ok_or_else(|| DeployError::RootNotFound {
            start: start.clone(),
            marker: BASE_OVERLAY,
        })
}
