//! Windows-only VNet commands.
//!
//! The admin process runs as the `VNet` Windows service; the user process
//! starts it on demand.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;
use tracing::{info, warn};

use super::VnetCommand;
use crate::cli::args::ServiceArgs;
use crate::context::CliContext;
use crate::vnet::admin::{run_admin_process, AdminMode};

const SERVICE_NAME: &str = "VNet";

/// `vnet-service`: entry point of the Windows service.
pub struct VnetServiceCommand {
    args: ServiceArgs,
}

impl VnetServiceCommand {
    pub fn new(args: ServiceArgs) -> Self {
        Self { args }
    }
}

#[async_trait]
impl VnetCommand for VnetServiceCommand {
    fn name(&self) -> &'static str {
        "vnet-service"
    }

    async fn run(&self, ctx: &CliContext) -> Result<()> {
        let mode = AdminMode::Service {
            user_sid: self.args.user_sid.clone(),
        };
        run_admin_process(ctx.cancel_token(), &ctx.config().stack, mode).await
    }
}

/// `vnet-install-service`
pub struct VnetInstallServiceCommand;

#[async_trait]
impl VnetCommand for VnetInstallServiceCommand {
    fn name(&self) -> &'static str {
        "vnet-install-service"
    }

    async fn run(&self, _ctx: &CliContext) -> Result<()> {
        let exe = std::env::current_exe().context("locating current executable")?;
        sc(&create_args(&exe)).await?;
        info!(service = SERVICE_NAME, "installed VNet service");
        Ok(())
    }
}

/// `vnet-uninstall-service`
pub struct VnetUninstallServiceCommand;

#[async_trait]
impl VnetCommand for VnetUninstallServiceCommand {
    fn name(&self) -> &'static str {
        "vnet-uninstall-service"
    }

    async fn run(&self, _ctx: &CliContext) -> Result<()> {
        // The service may not be running
        if let Err(e) = sc(&["stop".to_string(), SERVICE_NAME.to_string()]).await {
            warn!(error = %e, "failed to stop VNet service");
        }
        sc(&["delete".to_string(), SERVICE_NAME.to_string()]).await?;
        info!(service = SERVICE_NAME, "uninstalled VNet service");
        Ok(())
    }
}

fn create_args(exe: &Path) -> Vec<String> {
    vec![
        "create".to_string(),
        SERVICE_NAME.to_string(),
        "binPath=".to_string(),
        format!("\"{}\" vnet-service", exe.display()),
        "start=".to_string(),
        "demand".to_string(),
        "DisplayName=".to_string(),
        "VNet".to_string(),
    ]
}

async fn sc(args: &[String]) -> Result<()> {
    let output = Command::new("sc.exe")
        .args(args)
        .output()
        .await
        .context("running sc.exe")?;
    if !output.status.success() {
        bail!(
            "sc.exe {} failed ({}): {}",
            args.join(" "),
            output.status,
            String::from_utf8_lossy(&output.stdout).trim()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_args() {
        let args = create_args(Path::new(r"C:\Program Files\VNet\vnetctl.exe"));
        assert_eq!(args[0], "create");
        assert_eq!(args[1], "VNet");
        assert_eq!(args[3], r#""C:\Program Files\VNet\vnetctl.exe" vnet-service"#);
        assert_eq!(&args[4..6], ["start=", "demand"]);
    }
}
