use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "vnetctl",
    version,
    about = "VNet, a virtual network for TCP application access"
)]
pub struct Cli {
    /// Profile directory (default: ~/.vnet)
    #[arg(long, global = true, env = "VNET_HOME")]
    pub home: Option<PathBuf>,

    /// Config file (default: <profile>/vnet.toml)
    #[arg(long, global = true, env = "VNET_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start VNet, a virtual network for TCP application access
    #[command(name = "vnet")]
    Vnet(VnetArgs),

    /// Automatically include VNet's generated OpenSSH-compatible config file in ~/.ssh/config
    #[command(name = "vnet-ssh-autoconfig")]
    VnetSshAutoconfig,

    // Privileged commands of the current platform
    #[command(flatten)]
    Platform(PlatformCommands),
}

#[cfg(target_os = "macos")]
#[derive(Subcommand, Debug)]
pub enum PlatformCommands {
    /// Set up the network for VNet (run with administrator privileges)
    #[command(name = "vnet-admin-setup", hide = true)]
    VnetAdminSetup(AdminSetupArgs),

    /// Run the VNet launch daemon
    #[command(name = "vnet-daemon", hide = true)]
    VnetDaemon,
}

#[cfg(target_os = "windows")]
#[derive(Subcommand, Debug)]
pub enum PlatformCommands {
    /// Run the VNet Windows service
    #[command(name = "vnet-service", hide = true)]
    VnetService(ServiceArgs),

    /// Install the VNet Windows service
    #[command(name = "vnet-install-service", hide = true)]
    VnetInstallService,

    /// Uninstall the VNet Windows service
    #[command(name = "vnet-uninstall-service", hide = true)]
    VnetUninstallService,
}

/// No privileged commands on this platform: registers nothing, so the
/// parser can never select one.
#[cfg(not(any(target_os = "macos", target_os = "windows")))]
#[derive(Debug)]
pub enum PlatformCommands {}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
impl clap::FromArgMatches for PlatformCommands {
    fn from_arg_matches(_matches: &clap::ArgMatches) -> Result<Self, clap::Error> {
        Err(clap::Error::new(clap::error::ErrorKind::InvalidSubcommand))
    }

    fn update_from_arg_matches(&mut self, _matches: &clap::ArgMatches) -> Result<(), clap::Error> {
        match *self {}
    }
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
impl Subcommand for PlatformCommands {
    fn augment_subcommands(cmd: clap::Command) -> clap::Command {
        cmd
    }

    fn augment_subcommands_for_update(cmd: clap::Command) -> clap::Command {
        cmd
    }

    fn has_subcommand(_name: &str) -> bool {
        false
    }
}

#[derive(Args, Debug, Default, Clone)]
pub struct VnetArgs {
    /// Run diagnostics after starting VNet
    #[arg(long, hide = true)]
    pub diag: bool,
}

#[derive(Args, Debug, Default, Clone)]
pub struct AdminSetupArgs {
    /// Socket the user process listens on
    #[arg(long)]
    pub socket_path: String,

    /// IPv6 prefix routed into VNet
    #[arg(long)]
    pub ipv6_prefix: String,

    /// Address of VNet's DNS server
    #[arg(long)]
    pub dns_addr: String,

    /// Effective user ID of the user process
    #[arg(long)]
    pub euid: u32,

    /// Effective group ID of the user process
    #[arg(long)]
    pub egid: u32,
}

#[derive(Args, Debug, Default, Clone)]
pub struct ServiceArgs {
    /// SID of the user the service runs VNet for
    #[arg(long)]
    pub user_sid: String,
}
