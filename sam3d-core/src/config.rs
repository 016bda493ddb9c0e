//! Configuration for checkpoint verification.
//!
//! Uses `figment` for layered configuration: defaults -> user config file ->
//! workspace config file -> explicit overrides. Configuration is read from
//! `~/.config/sam3d/config.toml` and/or `.sam3d/config.toml` in the workspace.
//! Environment variables are never consulted. The resolver itself never reads
//! configuration; only the CLI does.

use crate::discovery::DiscoveryOptions;
use figment::{
    Figment,
    providers::{Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings for locating and verifying checkpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyConfig {
    /// Checkpoint root, relative to the current directory unless absolute.
    #[serde(default = "default_checkpoints_dir")]
    pub checkpoints_dir: PathBuf,
    /// Accumulate the total tree size during verification.
    #[serde(default = "default_true")]
    pub measure_size: bool,
    /// Number of files listed by `inspect`.
    #[serde(default = "default_report_limit")]
    pub report_limit: usize,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            checkpoints_dir: default_checkpoints_dir(),
            measure_size: true,
            report_limit: default_report_limit(),
        }
    }
}

impl VerifyConfig {
    pub fn discovery_options(&self) -> DiscoveryOptions {
        DiscoveryOptions {
            measure_size: self.measure_size,
        }
    }
}

fn default_checkpoints_dir() -> PathBuf {
    PathBuf::from("checkpoints")
}

fn default_report_limit() -> usize {
    3
}

fn default_true() -> bool {
    true
}

/// Values given on the command line. Unset fields leave the file layers alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkpoints_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub measure_size: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_limit: Option<usize>,
}

/// Path of the workspace-level config file.
pub fn workspace_config_path(workspace: &Path) -> PathBuf {
    workspace.join(".sam3d").join("config.toml")
}

/// Load configuration with layered merging.
pub fn load_config(
    workspace: Option<&Path>,
    overrides: &ConfigOverrides,
) -> Result<VerifyConfig, Box<figment::Error>> {
    let mut figment = Figment::from(Serialized::defaults(VerifyConfig::default()));

    // User-level config
    if let Some(config_dir) = directories::ProjectDirs::from("dev", "sam3d", "sam3d") {
        let user_config = config_dir.config_dir().join("config.toml");
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    // Workspace-level config
    if let Some(ws) = workspace {
        let ws_config = workspace_config_path(ws);
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    figment
        .merge(Serialized::defaults(overrides))
        .extract()
        .map_err(Box::new)
}
