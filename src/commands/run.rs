use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{error, info};

use super::VnetCommand;
use crate::context::{CliContext, Output};
use crate::vnet::{ClientApplication, HelperVnet, NetworkStackInfo, Vnet};

/// `vnet`: run the VNet user process in the foreground until it exits or
/// the invocation is cancelled.
pub struct VnetRunCommand {
    /// Run diagnostics once VNet is ready
    run_diag: bool,
    backend: Option<Arc<dyn Vnet>>,
}

impl VnetRunCommand {
    pub fn new(run_diag: bool) -> Self {
        Self {
            run_diag,
            backend: None,
        }
    }

    /// Use `backend` instead of the network stack helper
    pub fn with_backend(run_diag: bool, backend: Arc<dyn Vnet>) -> Self {
        Self {
            run_diag,
            backend: Some(backend),
        }
    }

    fn backend(&self, ctx: &CliContext) -> Arc<dyn Vnet> {
        match &self.backend {
            Some(backend) => backend.clone(),
            None => Arc::new(HelperVnet::new(ctx.config().clone())),
        }
    }
}

#[async_trait]
impl VnetCommand for VnetRunCommand {
    fn name(&self) -> &'static str {
        "vnet"
    }

    async fn run(&self, ctx: &CliContext) -> Result<()> {
        let app = ClientApplication::new(ctx).context("creating VNet client application")?;
        let vnet = self.backend(ctx);

        let process = vnet
            .start(ctx.cancel_token(), app)
            .await
            .context("starting VNet")?;
        ctx.output().println("VNet is ready.");

        if self.run_diag {
            spawn_diagnostics(vnet, process.network_stack_info(), ctx.output().clone());
        }

        let _close_on_cancel = {
            let process = process.clone();
            ctx.after_cancel(move || {
                info!("closing VNet user process");
                process.close();
            })
        };

        process.wait().await.context("VNet user process")
    }
}

/// Fire-and-forget: failures are logged, never returned.
fn spawn_diagnostics(vnet: Arc<dyn Vnet>, info: NetworkStackInfo, output: Output) {
    tokio::spawn(async move {
        output.println("Running diagnostics.");
        if let Err(e) = vnet.run_diagnostics(info).await {
            error!(error = %format!("{:#}", e), "Ran into a problem while running diagnostics");
            return;
        }
        output.println("Done running diagnostics.");
    });
}
