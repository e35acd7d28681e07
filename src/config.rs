//! VNet configuration
//!
//! Lookup order:
//! 1. Explicit `--config` path (must exist)
//! 2. `<profile>/vnet.toml`
//! 3. Built-in defaults

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::paths;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub stack: StackConfig,
    pub ssh: SshConfig,
    pub diag: DiagConfig,
}

/// Network stack helper settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StackConfig {
    /// Helper executable implementing the network stack
    pub helper: PathBuf,
    /// Extra arguments appended to every helper invocation
    pub extra_args: Vec<String>,
    /// How long to wait for the helper's readiness report
    pub start_timeout_secs: u64,
    /// How long the helper gets to exit after SIGTERM before it is killed
    pub shutdown_grace_secs: u64,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            helper: PathBuf::from("vnet-stack"),
            extra_args: Vec::new(),
            start_timeout_secs: 30,
            shutdown_grace_secs: 5,
        }
    }
}

impl StackConfig {
    pub fn start_timeout(&self) -> Duration {
        Duration::from_secs(self.start_timeout_secs)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SshConfig {
    /// OpenSSH client config to update; `~/.ssh/config` when unset
    pub config_path: Option<PathBuf>,
}

impl SshConfig {
    pub fn resolved_config_path(&self) -> PathBuf {
        self.config_path
            .clone()
            .unwrap_or_else(paths::user_ssh_config)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DiagConfig {
    pub check_routes: bool,
    pub check_dns: bool,
}

impl Default for DiagConfig {
    fn default() -> Self {
        Self {
            check_routes: true,
            check_dns: true,
        }
    }
}

impl Config {
    /// Load the configuration for a profile.
    pub fn load(explicit_path: Option<&Path>, profile: &Path) -> Result<Self> {
        let path = match explicit_path {
            Some(path) => {
                if !path.exists() {
                    bail!("Config file not found: {}", path.display());
                }
                path.to_path_buf()
            }
            None => {
                let path = paths::config_file(profile);
                if !path.exists() {
                    debug!(profile = %profile.display(), "no config file, using defaults");
                    return Ok(Self::default());
                }
                path
            }
        };

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config file: {}", path.display()))?;
        let config = Self::parse(&content)
            .with_context(|| format!("parsing config file: {}", path.display()))?;

        info!(config_file = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}
