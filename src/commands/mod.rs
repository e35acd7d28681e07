//! VNet sub-commands.
//!
//! Every sub-command implements [`VnetCommand`]. Privileged commands only
//! exist on some platforms; their factories return [`NotSupported`] elsewhere
//! and the parser never registers them there.

pub mod run;
pub mod ssh_autoconfig;

#[cfg(target_os = "macos")]
pub mod darwin;
#[cfg(target_os = "windows")]
pub mod windows;

pub use run::VnetRunCommand;
pub use ssh_autoconfig::VnetSshAutoConfigCommand;

use anyhow::Result;
use async_trait::async_trait;

use crate::cli::args::{AdminSetupArgs, ServiceArgs};
use crate::context::CliContext;

#[async_trait]
pub trait VnetCommand: Send + Sync {
    /// Sub-command name as registered with the parser
    fn name(&self) -> &'static str;

    /// Only called when `name()` is the sub-command selected on the command line
    async fn run(&self, ctx: &CliContext) -> Result<()>;
}

/// Stand-in for a command this platform does not implement.
///
/// Never registered with the parser, so `run` being called means dispatch is
/// broken.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotSupported;

#[async_trait]
impl VnetCommand for NotSupported {
    fn name(&self) -> &'static str {
        ""
    }

    async fn run(&self, _ctx: &CliContext) -> Result<()> {
        panic!("NotSupported::run should never be called, this is a bug")
    }
}

#[cfg_attr(not(target_os = "macos"), allow(unused_variables))]
pub fn admin_setup_command(args: AdminSetupArgs) -> Box<dyn VnetCommand> {
    #[cfg(target_os = "macos")]
    {
        Box::new(darwin::VnetAdminSetupCommand::new(args))
    }
    #[cfg(not(target_os = "macos"))]
    {
        Box::new(NotSupported)
    }
}

pub fn daemon_command() -> Box<dyn VnetCommand> {
    #[cfg(target_os = "macos")]
    {
        Box::new(darwin::VnetDaemonCommand)
    }
    #[cfg(not(target_os = "macos"))]
    {
        Box::new(NotSupported)
    }
}

#[cfg_attr(not(target_os = "windows"), allow(unused_variables))]
pub fn service_command(args: ServiceArgs) -> Box<dyn VnetCommand> {
    #[cfg(target_os = "windows")]
    {
        Box::new(windows::VnetServiceCommand::new(args))
    }
    #[cfg(not(target_os = "windows"))]
    {
        Box::new(NotSupported)
    }
}

pub fn install_service_command() -> Box<dyn VnetCommand> {
    #[cfg(target_os = "windows")]
    {
        Box::new(windows::VnetInstallServiceCommand)
    }
    #[cfg(not(target_os = "windows"))]
    {
        Box::new(NotSupported)
    }
}

pub fn uninstall_service_command() -> Box<dyn VnetCommand> {
    #[cfg(target_os = "windows")]
    {
        Box::new(windows::VnetUninstallServiceCommand)
    }
    #[cfg(not(target_os = "windows"))]
    {
        Box::new(NotSupported)
    }
}

/// Names of all commands this build can run
pub fn supported_commands() -> Vec<&'static str> {
    let all: Vec<Box<dyn VnetCommand>> = vec![
        Box::new(VnetRunCommand::new(false)),
        Box::new(VnetSshAutoConfigCommand),
        admin_setup_command(AdminSetupArgs::default()),
        daemon_command(),
        service_command(ServiceArgs::default()),
        install_service_command(),
        uninstall_service_command(),
    ];
    all.iter()
        .map(|cmd| cmd.name())
        .filter(|name| !name.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::context::Output;
    use tokio_util::sync::CancellationToken;

    #[test]
    fn test_not_supported_has_empty_name() {
        assert_eq!(NotSupported.name(), "");
    }

    #[tokio::test]
    #[should_panic(expected = "this is a bug")]
    async fn test_not_supported_run_panics() {
        let ctx = CliContext::new(CancellationToken::new(), None, Config::default())
            .with_output(Output::buffer());
        let _ = NotSupported.run(&ctx).await;
    }

    #[test]
    fn test_supported_commands_always_include_portable_ones() {
        let names = supported_commands();
        assert!(names.contains(&"vnet"));
        assert!(names.contains(&"vnet-ssh-autoconfig"));
        assert!(names.iter().all(|n| !n.is_empty()));
    }

    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    #[test]
    fn test_privileged_commands_not_supported() {
        assert_eq!(admin_setup_command(AdminSetupArgs::default()).name(), "");
        assert_eq!(daemon_command().name(), "");
        assert_eq!(service_command(ServiceArgs::default()).name(), "");
        assert_eq!(install_service_command().name(), "");
        assert_eq!(uninstall_service_command().name(), "");
        assert_eq!(supported_commands(), vec!["vnet", "vnet-ssh-autoconfig"]);
    }

    #[cfg(target_os = "macos")]
    #[test]
    fn test_macos_commands() {
        assert_eq!(admin_setup_command(AdminSetupArgs::default()).name(), "vnet-admin-setup");
        assert_eq!(daemon_command().name(), "vnet-daemon");
        assert_eq!(service_command(ServiceArgs::default()).name(), "");
        assert_eq!(install_service_command().name(), "");
        assert_eq!(uninstall_service_command().name(), "");
    }

    #[cfg(target_os = "windows")]
    #[test]
    fn test_windows_commands() {
        assert_eq!(admin_setup_command(AdminSetupArgs::default()).name(), "");
        assert_eq!(daemon_command().name(), "");
        assert_eq!(service_command(ServiceArgs::default()).name(), "vnet-service");
        assert_eq!(install_service_command().name(), "vnet-install-service");
        assert_eq!(uninstall_service_command().name(), "vnet-uninstall-service");
    }
}
