pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod paths;
pub mod vnet;

// Re-export core types for convenience
pub use commands::{NotSupported, VnetCommand};
pub use context::CliContext;
