use super::args::{Commands, PlatformCommands};
use crate::commands::{VnetCommand, VnetRunCommand, VnetSshAutoConfigCommand};

impl Commands {
    /// The command to run for this sub-command
    pub fn into_command(self) -> Box<dyn VnetCommand> {
        match self {
            Commands::Vnet(args) => Box::new(VnetRunCommand::new(args.diag)),
            Commands::VnetSshAutoconfig => Box::new(VnetSshAutoConfigCommand),
            Commands::Platform(cmd) => cmd.into_command(),
        }
    }
}

#[cfg(target_os = "macos")]
impl PlatformCommands {
    fn into_command(self) -> Box<dyn VnetCommand> {
        match self {
            PlatformCommands::VnetAdminSetup(args) => crate::commands::admin_setup_command(args),
            PlatformCommands::VnetDaemon => crate::commands::daemon_command(),
        }
    }
}

#[cfg(target_os = "windows")]
impl PlatformCommands {
    fn into_command(self) -> Box<dyn VnetCommand> {
        match self {
            PlatformCommands::VnetService(args) => crate::commands::service_command(args),
            PlatformCommands::VnetInstallService => crate::commands::install_service_command(),
            PlatformCommands::VnetUninstallService => {
                crate::commands::uninstall_service_command()
            }
        }
    }
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
impl PlatformCommands {
    fn into_command(self) -> Box<dyn VnetCommand> {
        match self {}
    }
}
