//! Boundary to the VNet network stack.
//!
//! The stack itself runs in an external helper executable. This module
//! starts and supervises it, and hosts the pieces of VNet that run on the
//! client side: diagnostics, SSH auto-configuration and the privileged admin
//! process used by the platform commands.

pub mod admin;
pub mod diag;
pub mod process;
pub mod ssh;

pub use process::{HelperError, UserProcess};

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::Config;
use crate::context::CliContext;

/// Snapshot of the running network stack, as reported by the helper
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkStackInfo {
    /// TUN interface carrying VNet traffic
    pub interface_name: String,
    /// IPv6 prefix routed into VNet, in CIDR form
    pub ipv6_prefix: String,
    /// Address of VNet's DNS server
    pub dns_ipv6: String,
}

/// Client-side view of the user's profile handed to the network stack
#[derive(Debug, Clone)]
pub struct ClientApplication {
    profile_path: PathBuf,
    config: Arc<Config>,
}

impl ClientApplication {
    /// Bind to the context's profile; fails if the profile does not exist.
    pub fn new(ctx: &CliContext) -> Result<Self> {
        let profile_path = ctx.profile_path();
        if !profile_path.is_dir() {
            bail!(
                "profile directory {} does not exist, log in first",
                profile_path.display()
            );
        }
        Ok(Self::from_parts(profile_path, ctx.config().clone()))
    }

    pub fn from_parts(profile_path: PathBuf, config: Arc<Config>) -> Self {
        Self {
            profile_path,
            config,
        }
    }

    pub fn profile_path(&self) -> &Path {
        &self.profile_path
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

/// A running VNet user process
#[async_trait]
pub trait ProcessHandle: Send + Sync {
    fn network_stack_info(&self) -> NetworkStackInfo;

    /// Ask the process to shut down. Idempotent; safe to call while another
    /// task is in `wait`.
    fn close(&self);

    /// Block until the process terminates. `Ok` on clean shutdown.
    async fn wait(&self) -> Result<()>;
}

/// Entry points into the VNet library used by the commands
#[async_trait]
pub trait Vnet: Send + Sync {
    /// Start the user process. Blocks until the stack is ready, fails, or
    /// `cancel` fires.
    async fn start(
        &self,
        cancel: &CancellationToken,
        app: ClientApplication,
    ) -> Result<Arc<dyn ProcessHandle>>;

    async fn run_diagnostics(&self, info: NetworkStackInfo) -> Result<()>;
}

/// The real VNet backend: a helper process plus host diagnostics
pub struct HelperVnet {
    config: Arc<Config>,
}

impl HelperVnet {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Vnet for HelperVnet {
    async fn start(
        &self,
        cancel: &CancellationToken,
        app: ClientApplication,
    ) -> Result<Arc<dyn ProcessHandle>> {
        let process = UserProcess::start(cancel, &app).await?;
        Ok(Arc::new(process))
    }

    async fn run_diagnostics(&self, info: NetworkStackInfo) -> Result<()> {
        let report = diag::run_diagnostics(&self.config.diag, &info).await?;
        for check in &report.checks {
            info!(target: "vnet-diag", check = check.name, outcome = %check.outcome, "diagnostic check");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Output;

    #[test]
    fn test_network_stack_info_from_json() {
        let info: NetworkStackInfo = serde_json::from_str(
            r#"{"interface_name":"utun4","ipv6_prefix":"fd5e:1:2::/64","dns_ipv6":"fd5e:1:2::2"}"#,
        )
        .unwrap();
        assert_eq!(info.interface_name, "utun4");
        assert_eq!(info.dns_ipv6, "fd5e:1:2::2");
    }

    #[test]
    fn test_client_application_requires_profile() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        let ctx = CliContext::new(CancellationToken::new(), Some(missing), Config::default())
            .with_output(Output::buffer());

        let err = ClientApplication::new(&ctx).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_client_application_binds_profile() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = CliContext::new(
            CancellationToken::new(),
            Some(dir.path().to_path_buf()),
            Config::default(),
        );

        let app = ClientApplication::new(&ctx).unwrap();
        assert_eq!(app.profile_path(), dir.path());
    }
}
