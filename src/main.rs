use anyhow::Result;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;
use vnetctl::cli::Cli;
use vnetctl::config::Config;
use vnetctl::context::{self, CliContext};
use vnetctl::paths;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Logs go to stderr, stdout is reserved for user-facing lines.
    // Only use colors when stderr is a TTY
    let level = if cli.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_target(true)
        .with_ansi(atty::is(atty::Stream::Stderr))
        .with_writer(std::io::stderr)
        .init();

    let result = run(cli).await;

    // Handle errors
    if let Err(e) = &result {
        error!("Error: {:#}", e);
        std::process::exit(1);
    }

    result
}

async fn run(cli: Cli) -> Result<()> {
    let profile = paths::full_profile_path(cli.home.as_deref());
    let config = Config::load(cli.config.as_deref(), &profile)?;

    let cancel = CancellationToken::new();
    context::cancel_on_signals(cancel.clone());
    let ctx = CliContext::new(cancel, cli.home, config);

    // Dispatch to the selected command
    let command = cli.cmd.into_command();
    debug!(command = command.name(), "running command");
    command.run(&ctx).await
}
