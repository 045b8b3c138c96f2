// Forbid accidental printing; the terminal belongs to the dashboard while it
// runs and everything else goes through `tracing`.
#![deny(clippy::print_stdout, clippy::print_stderr)]

use std::sync::Arc;

use anyhow::Context;
use ktop_core::ExitReason;
use ktop_core::Orchestrator;
use ktop_kube::KubeMetricsSource;
use tracing::info;

mod cli;
pub mod config;
pub mod input;
mod key_hint;
mod logging;
pub mod render;
mod tui;

pub use cli::Cli;

use crate::config::Settings;
use crate::render::RenderContext;
use crate::render::TerminalRenderer;
use crate::tui::TerminalSession;

/// Resolve settings, connect to the cluster, and run the dashboard until the
/// user quits or a refresh fails.
pub async fn run_main(cli: Cli) -> anyhow::Result<ExitReason> {
    let file = config::load_file(cli.config.as_deref())?;
    let settings = Settings::resolve(&cli, file)?;
    let _log_guard = logging::init(&settings.log_dir)?;
    info!(
        interval = ?settings.interval,
        history = settings.history,
        policy = ?settings.policy,
        "starting ktop"
    );

    let source = KubeMetricsSource::connect(&settings.kube)
        .await
        .context("failed to connect to the cluster")?;
    let context = RenderContext {
        scope: source.namespaces().to_string(),
        interval: settings.interval,
    };
    let orchestrator = Orchestrator::new(Arc::new(source), settings.orchestrator_config());

    let session = TerminalSession::enter().context("failed to set up the terminal")?;
    let terminal = session
        .terminal()
        .context("failed to set up the terminal")?;
    let mut renderer = TerminalRenderer::new(terminal, context);
    let shutdown = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!("failed to listen for ctrl-c: {err}");
            std::future::pending::<()>().await;
        }
    };

    let reason = orchestrator
        .run(input::terminal_events(), &mut renderer, shutdown)
        .await;
    drop(renderer);
    drop(session);

    let reason = reason?;
    info!(?reason, "ktop exited");
    Ok(reason)
}
