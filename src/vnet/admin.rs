//! The privileged half of VNet.
//!
//! Platform commands (macOS admin setup and daemon, Windows service) all end
//! up here: run the network stack helper in admin mode until the invocation
//! is cancelled or the helper exits.

use anyhow::{Context, Result};
use std::ffi::OsString;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::process::{Helper, HelperError};
use crate::config::StackConfig;

/// How the admin process was launched
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminMode {
    /// Started on demand for one user process
    Setup {
        socket_path: String,
        ipv6_prefix: String,
        dns_addr: String,
        euid: u32,
        egid: u32,
    },
    /// Long-running system daemon
    Daemon,
    /// Windows service started on behalf of one user
    Service { user_sid: String },
}

impl AdminMode {
    /// Helper arguments for this mode
    pub fn helper_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["admin".into()];
        match self {
            AdminMode::Setup {
                socket_path,
                ipv6_prefix,
                dns_addr,
                euid,
                egid,
            } => {
                args.extend(
                    [
                        "--socket-path".to_string(),
                        socket_path.clone(),
                        "--ipv6-prefix".to_string(),
                        ipv6_prefix.clone(),
                        "--dns-addr".to_string(),
                        dns_addr.clone(),
                        "--euid".to_string(),
                        euid.to_string(),
                        "--egid".to_string(),
                        egid.to_string(),
                    ]
                    .map(OsString::from),
                );
            }
            AdminMode::Daemon => args.push("--daemon".into()),
            AdminMode::Service { user_sid } => {
                args.push("--service".into());
                args.push("--user-sid".into());
                args.push(user_sid.into());
            }
        }
        args
    }
}

/// Run the admin process until `cancel` fires or the helper exits.
pub async fn run_admin_process(
    cancel: &CancellationToken,
    stack: &StackConfig,
    mode: AdminMode,
) -> Result<()> {
    info!(mode = ?mode, "starting VNet admin process");

    let mut helper = Helper::spawn(stack, mode.helper_args())?;
    match helper.wait_ready(cancel, stack.start_timeout()).await {
        Ok(_) => {}
        Err(HelperError::Cancelled) => {
            info!("cancelled before the network stack was ready");
            return Ok(());
        }
        Err(e) => return Err(e).context("starting VNet admin process"),
    }

    helper.supervise(cancel.clone()).await
}
