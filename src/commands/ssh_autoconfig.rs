use anyhow::{Context, Result};
use async_trait::async_trait;

use super::VnetCommand;
use crate::context::CliContext;
use crate::paths;
use crate::vnet::ssh;

/// `vnet-ssh-autoconfig`: include VNet's generated OpenSSH config in the
/// user's `~/.ssh/config`.
pub struct VnetSshAutoConfigCommand;

#[async_trait]
impl VnetCommand for VnetSshAutoConfigCommand {
    fn name(&self) -> &'static str {
        "vnet-ssh-autoconfig"
    }

    async fn run(&self, ctx: &CliContext) -> Result<()> {
        let profile = paths::full_profile_path(ctx.home_path());
        let ssh_config = ctx.config().ssh.resolved_config_path();
        let target = ssh_config.clone();
        tokio::task::spawn_blocking(move || ssh::auto_configure_openssh(&profile, &target))
            .await
            .context("OpenSSH config task panicked")?
            .with_context(|| format!("configuring {} for VNet", ssh_config.display()))
    }
}
