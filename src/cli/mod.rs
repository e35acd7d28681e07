pub mod args;
pub mod types;

pub use args::{AdminSetupArgs, Cli, Commands, PlatformCommands, ServiceArgs, VnetArgs};
