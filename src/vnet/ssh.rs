//! Make OpenSSH aware of VNet's generated config.
//!
//! VNet writes `<profile>/vnet_ssh_config` with `Host` entries for VNet
//! addresses. The user's `~/.ssh/config` only needs an `Include` of that
//! file, placed before any `Host` block so it applies globally.

use anyhow::{bail, Context, Result};
use std::io::Write;
use std::path::Path;
use tracing::info;

use crate::paths;

const BEGIN_MARKER: &str = "# Begin generated VNet configuration";
const END_MARKER: &str = "# End generated VNet configuration";

/// Add the VNet `Include` block to `ssh_config` unless it is already there.
///
/// The file is replaced atomically: readers see either the old or the new
/// contents, never a partial write.
pub fn auto_configure_openssh(profile: &Path, ssh_config: &Path) -> Result<()> {
    let existing = match std::fs::read_to_string(ssh_config) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => {
            return Err(e).with_context(|| format!("reading {}", ssh_config.display()));
        }
    };

    if existing.lines().any(|line| line.trim() == BEGIN_MARKER) {
        info!(ssh_config = %ssh_config.display(), "OpenSSH config already includes VNet config");
        return Ok(());
    }

    let block = include_block(&paths::vnet_ssh_config(profile))?;
    let updated = if existing.is_empty() {
        block
    } else {
        format!("{}\n{}", block, existing)
    };

    write_atomic(ssh_config, &updated)?;
    info!(ssh_config = %ssh_config.display(), "added VNet config to OpenSSH config");
    Ok(())
}

fn include_block(vnet_config: &Path) -> Result<String> {
    let path = vnet_config
        .to_str()
        .with_context(|| format!("non UTF-8 path: {}", vnet_config.display()))?;
    if path.contains('"') {
        bail!("cannot include {} in OpenSSH config: path contains a quote", path);
    }
    Ok(format!(
        "{}\nInclude \"{}\"\n{}\n",
        BEGIN_MARKER, path, END_MARKER
    ))
}

/// Replace the file `path` refers to.
///
/// A symlinked config is followed and its target rewritten, keeping the
/// link and the target's permissions.
fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let target = match std::fs::canonicalize(path) {
        Ok(target) => target,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => path.to_path_buf(),
        Err(e) => return Err(e).with_context(|| format!("resolving {}", path.display())),
    };
    let dir = match target.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    create_private_dir(dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("creating temp file in {}", dir.display()))?;
    tmp.write_all(content.as_bytes())
        .with_context(|| format!("writing {}", tmp.path().display()))?;

    // New files keep NamedTempFile's 0600
    match std::fs::metadata(&target) {
        Ok(meta) => tmp
            .as_file()
            .set_permissions(meta.permissions())
            .with_context(|| format!("copying permissions of {}", target.display()))?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e).with_context(|| format!("reading {}", target.display())),
    }
    tmp.as_file()
        .sync_all()
        .with_context(|| format!("syncing {}", tmp.path().display()))?;

    tmp.persist(&target)
        .map_err(|e| e.error)
        .with_context(|| format!("replacing {}", target.display()))?;
    Ok(())
}

fn create_private_dir(dir: &Path) -> Result<()> {
    if dir.is_dir() {
        return Ok(());
    }
    let mut builder = std::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder
        .create(dir)
        .with_context(|| format!("creating {}", dir.display()))
}
