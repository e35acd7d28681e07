//! Per-invocation execution context shared by all VNet commands.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::Config;
use crate::paths;

/// State for one CLI invocation.
///
/// Owned by `main` and borrowed by every command's `run`.
pub struct CliContext {
    cancel: CancellationToken,
    home_path: Option<PathBuf>,
    config: Arc<Config>,
    output: Output,
}

impl CliContext {
    pub fn new(cancel: CancellationToken, home_path: Option<PathBuf>, config: Config) -> Self {
        Self {
            cancel,
            home_path,
            config: Arc::new(config),
            output: Output::Stdout,
        }
    }

    /// Replace the user-visible output sink
    pub fn with_output(mut self, output: Output) -> Self {
        self.output = output;
        self
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Home path as given on the command line (`--home` / `VNET_HOME`)
    pub fn home_path(&self) -> Option<&Path> {
        self.home_path.as_deref()
    }

    /// Resolved profile directory
    pub fn profile_path(&self) -> PathBuf {
        paths::full_profile_path(self.home_path())
    }

    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    pub fn output(&self) -> &Output {
        &self.output
    }

    /// Run `f` once the invocation is cancelled.
    ///
    /// The callback is dropped without running if the returned guard is
    /// dropped first.
    pub fn after_cancel<F>(&self, f: F) -> AfterCancel
    where
        F: FnOnce() + Send + 'static,
    {
        let cancel = self.cancel.clone();
        AfterCancel(tokio::spawn(async move {
            cancel.cancelled().await;
            f();
        }))
    }
}

/// Guard for a callback registered with [`CliContext::after_cancel`]
pub struct AfterCancel(JoinHandle<()>);

impl Drop for AfterCancel {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Sink for user-visible output lines.
///
/// Logs go to stderr through tracing; this is what the user reads on stdout.
/// Write errors (a closed pipe, a full disk) are logged and otherwise
/// ignored.
#[derive(Clone)]
pub enum Output {
    Stdout,
    Buffer(Arc<Mutex<Vec<String>>>),
    Writer(Arc<Mutex<Box<dyn Write + Send>>>),
}

impl Output {
    /// In-memory sink, used to observe output in tests
    pub fn buffer() -> Self {
        Output::Buffer(Arc::new(Mutex::new(Vec::new())))
    }

    pub fn writer(w: impl Write + Send + 'static) -> Self {
        Output::Writer(Arc::new(Mutex::new(Box::new(w))))
    }

    pub fn println(&self, line: &str) {
        match self {
            Output::Stdout => write_line(&mut std::io::stdout().lock(), line),
            Output::Buffer(lines) => {
                if let Ok(mut lines) = lines.lock() {
                    lines.push(line.to_string());
                }
            }
            Output::Writer(w) => {
                if let Ok(mut w) = w.lock() {
                    write_line(&mut *w, line);
                }
            }
        }
    }

    /// Lines written so far (only recorded for buffers)
    pub fn lines(&self) -> Vec<String> {
        match self {
            Output::Stdout | Output::Writer(_) => Vec::new(),
            Output::Buffer(lines) => lines.lock().map(|l| l.clone()).unwrap_or_default(),
        }
    }
}

fn write_line(w: &mut dyn Write, line: &str) {
    if let Err(e) = writeln!(w, "{}", line).and_then(|()| w.flush()) {
        debug!(error = %e, line, "dropped output line");
    }
}

/// Cancel `token` on SIGINT or SIGTERM.
pub fn cancel_on_signals(token: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        wait_for_signal().await;
        token.cancel();
    })
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let (mut sigterm, mut sigint) = match (
        signal(SignalKind::terminate()),
        signal(SignalKind::interrupt()),
    ) {
        (Ok(term), Ok(int)) => (term, int),
        (Err(e), _) | (_, Err(e)) => {
            tracing::warn!(error = %e, "failed to install signal handlers");
            return std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
        _ = sigint.recv() => info!("received SIGINT, shutting down"),
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("received Ctrl-C, shutting down"),
        Err(e) => {
            tracing::warn!(error = %e, "failed to install Ctrl-C handler");
            std::future::pending::<()>().await
        }
    }
}
