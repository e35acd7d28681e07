//! macOS-only VNet commands.

use anyhow::Result;
use async_trait::async_trait;

use super::VnetCommand;
use crate::cli::args::AdminSetupArgs;
use crate::context::CliContext;
use crate::vnet::admin::{run_admin_process, AdminMode};

/// `vnet-admin-setup`: privileged network setup for one user process,
/// normally launched through an authorization prompt.
pub struct VnetAdminSetupCommand {
    args: AdminSetupArgs,
}

impl VnetAdminSetupCommand {
    pub fn new(args: AdminSetupArgs) -> Self {
        Self { args }
    }
}

#[async_trait]
impl VnetCommand for VnetAdminSetupCommand {
    fn name(&self) -> &'static str {
        "vnet-admin-setup"
    }

    async fn run(&self, ctx: &CliContext) -> Result<()> {
        let mode = AdminMode::Setup {
            socket_path: self.args.socket_path.clone(),
            ipv6_prefix: self.args.ipv6_prefix.clone(),
            dns_addr: self.args.dns_addr.clone(),
            euid: self.args.euid,
            egid: self.args.egid,
        };
        run_admin_process(ctx.cancel_token(), &ctx.config().stack, mode).await
    }
}

/// `vnet-daemon`: the admin process registered as a launch daemon.
pub struct VnetDaemonCommand;

#[async_trait]
impl VnetCommand for VnetDaemonCommand {
    fn name(&self) -> &'static str {
        "vnet-daemon"
    }

    async fn run(&self, ctx: &CliContext) -> Result<()> {
        run_admin_process(ctx.cancel_token(), &ctx.config().stack, AdminMode::Daemon).await
    }
}
