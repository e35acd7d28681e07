use std::path::{Path, PathBuf};

use directories::BaseDirs;

/// Profile directory name under the user's home directory
const PROFILE_DIR: &str = ".vnet";

/// Resolve the full profile directory.
///
/// An explicit home path is used as-is. Otherwise the profile lives in
/// `~/.vnet`, falling back to the temp dir when no home directory is known.
pub fn full_profile_path(home: Option<&Path>) -> PathBuf {
    if let Some(home) = home {
        return home.to_path_buf();
    }
    let base = BaseDirs::new()
        .map(|dirs| dirs.home_dir().to_path_buf())
        .unwrap_or_else(std::env::temp_dir);
    base.join(PROFILE_DIR)
}

/// Per-profile configuration file
pub fn config_file(profile: &Path) -> PathBuf {
    profile.join("vnet.toml")
}

/// OpenSSH-compatible config generated for VNet hosts
pub fn vnet_ssh_config(profile: &Path) -> PathBuf {
    profile.join("vnet_ssh_config")
}

/// The user's OpenSSH client config (`~/.ssh/config`)
pub fn user_ssh_config() -> PathBuf {
    BaseDirs::new()
        .map(|dirs| dirs.home_dir().to_path_buf())
        .unwrap_or_else(std::env::temp_dir)
        .join(".ssh")
        .join("config")
}
