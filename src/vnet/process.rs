use anyhow::{Context, Result};
use async_trait::async_trait;
use std::ffi::OsString;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tokio::process::{Child, ChildStdout, Command};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{ClientApplication, NetworkStackInfo, ProcessHandle};
use crate::config::StackConfig;

/// Failures talking to the network stack helper before it is ready
#[derive(Debug, thiserror::Error)]
pub enum HelperError {
    #[error("network stack helper exited before reporting readiness ({0})")]
    ExitedBeforeReady(ExitStatus),
    #[error("invalid readiness report from network stack helper")]
    BadReadiness(#[source] serde_json::Error),
    #[error("timed out after {0:?} waiting for network stack helper")]
    Timeout(Duration),
    #[error("cancelled while starting network stack helper")]
    Cancelled,
    #[error("reading network stack helper output")]
    Io(#[from] std::io::Error),
}

/// A spawned network stack helper process.
///
/// Command line: `<helper> [extra_args...] <mode args...>`. The helper prints
/// one JSON line with its [`NetworkStackInfo`] once the stack is up, then
/// runs until it exits on its own or is asked to stop with SIGTERM.
pub struct Helper {
    child: Child,
    stdout: Lines<BufReader<ChildStdout>>,
    grace: Duration,
}

impl Helper {
    pub fn spawn(stack: &StackConfig, mode_args: Vec<OsString>) -> Result<Self> {
        info!(target: "vnet-stack", helper = %stack.helper.display(), "starting network stack helper");

        let mut child = Command::new(&stack.helper)
            .args(&stack.extra_args)
            .args(mode_args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("spawning {}", stack.helper.display()))?;

        let stdout = child
            .stdout
            .take()
            .context("network stack helper stdout not captured")?;

        // stderr is relayed for the whole lifetime of the helper
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    warn!(target: "vnet-stack", "{}", line);
                }
            });
        }

        Ok(Self {
            child,
            stdout: BufReader::new(stdout).lines(),
            grace: stack.shutdown_grace(),
        })
    }

    /// Wait for the readiness report.
    ///
    /// The helper is killed when `self` is dropped, so an error here leaves
    /// nothing running.
    pub async fn wait_ready(
        &mut self,
        cancel: &CancellationToken,
        timeout: Duration,
    ) -> Result<NetworkStackInfo, HelperError> {
        let line = tokio::select! {
            _ = cancel.cancelled() => return Err(HelperError::Cancelled),
            line = tokio::time::timeout(timeout, self.stdout.next_line()) => {
                line.map_err(|_| HelperError::Timeout(timeout))??
            }
        };

        match line {
            Some(line) => {
                let info: NetworkStackInfo =
                    serde_json::from_str(line.trim()).map_err(HelperError::BadReadiness)?;
                info!(
                    target: "vnet-stack",
                    interface = %info.interface_name,
                    ipv6_prefix = %info.ipv6_prefix,
                    dns = %info.dns_ipv6,
                    "network stack ready"
                );
                Ok(info)
            }
            None => {
                let status = self.child.wait().await?;
                Err(HelperError::ExitedBeforeReady(status))
            }
        }
    }

    /// Run until the helper exits or `closer` is cancelled.
    ///
    /// Exiting after a close request is a clean shutdown whatever the exit
    /// status; exiting on its own with a failure status is an error.
    pub async fn supervise(mut self, closer: CancellationToken) -> Result<()> {
        let mut stdout = self.stdout;
        tokio::spawn(async move {
            while let Ok(Some(line)) = stdout.next_line().await {
                debug!(target: "vnet-stack", "{}", line);
            }
        });

        tokio::select! {
            status = self.child.wait() => {
                let status = status.context("waiting for network stack helper")?;
                if !status.success() {
                    anyhow::bail!("network stack helper exited unexpectedly ({})", status);
                }
                info!(target: "vnet-stack", "network stack helper exited");
                Ok(())
            }
            _ = closer.cancelled() => {
                terminate(&mut self.child, self.grace).await?;
                info!(target: "vnet-stack", "network stack helper stopped");
                Ok(())
            }
        }
    }
}

/// SIGTERM, then kill once the grace period runs out
#[cfg(unix)]
async fn terminate(child: &mut Child, grace: Duration) -> Result<()> {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    let Some(pid) = child.id() else {
        // Already reaped
        return Ok(());
    };

    if let Err(e) = kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
        debug!(target: "vnet-stack", error = %e, "SIGTERM failed");
    }
    match tokio::time::timeout(grace, child.wait()).await {
        Ok(status) => {
            let status = status.context("waiting for network stack helper")?;
            debug!(target: "vnet-stack", status = %status, "helper exited after SIGTERM");
            Ok(())
        }
        Err(_) => {
            warn!(target: "vnet-stack", grace = ?grace, "helper ignored SIGTERM, killing");
            child.kill().await.context("killing network stack helper")
        }
    }
}

#[cfg(not(unix))]
async fn terminate(child: &mut Child, _grace: Duration) -> Result<()> {
    child.kill().await.context("killing network stack helper")
}

/// The VNet user process, backed by a network stack helper.
pub struct UserProcess {
    info: NetworkStackInfo,
    closer: CancellationToken,
    supervisor: Mutex<Option<JoinHandle<Result<()>>>>,
}

impl UserProcess {
    /// Start the helper in user mode and wait until it reports readiness.
    ///
    /// Returns early with [`HelperError::Cancelled`] if `cancel` fires first.
    pub async fn start(cancel: &CancellationToken, app: &ClientApplication) -> Result<Self> {
        let stack = &app.config().stack;
        let mode_args = vec![
            OsString::from("user"),
            OsString::from("--profile"),
            app.profile_path().as_os_str().to_owned(),
        ];

        let mut helper = Helper::spawn(stack, mode_args)?;
        let info = helper
            .wait_ready(cancel, stack.start_timeout())
            .await
            .context("starting VNet user process")?;

        let closer = CancellationToken::new();
        let supervisor = tokio::spawn(helper.supervise(closer.clone()));

        Ok(Self {
            info,
            closer,
            supervisor: Mutex::new(Some(supervisor)),
        })
    }
}

#[async_trait]
impl ProcessHandle for UserProcess {
    fn network_stack_info(&self) -> NetworkStackInfo {
        self.info.clone()
    }

    fn close(&self) {
        self.closer.cancel();
    }

    async fn wait(&self) -> Result<()> {
        let supervisor = self
            .supervisor
            .lock()
            .await
            .take()
            .context("VNet user process already waited on")?;
        supervisor.await.context("VNet supervisor task panicked")?
    }
}
