//! CLI entrypoint: configuration, collaborator wiring, and the driver
//! task that owns the workflow controller.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::cli::Cli;
use crate::tui::{self, Notice};
use isqforge_config::{Config, GeminiConfig};
use isqforge_export::XlsxExporter;
use isqforge_wizard::{Command, DryRunAi, InquiryAi, LlmInquiryAi, WizardController};

/// Run the wizard.
///
/// # Errors
///
/// Returns an error for configuration problems, backend construction
/// failures, or terminal setup failures. AI call failures during the
/// session surface inside the wizard, not here.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    isqforge_utils::logging::init_tracing(cli.verbose)
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))?;

    let mut config =
        Config::discover(cli.config.as_deref()).context("failed to load configuration")?;
    apply_cli_overrides(&mut config, &cli);

    let ai: Arc<dyn InquiryAi> = if cli.dry_run {
        info!("dry-run mode: using canned results, no provider calls");
        Arc::new(DryRunAi)
    } else {
        Arc::new(LlmInquiryAi::from_config(&config).context("failed to construct LLM backend")?)
    };
    let exporter = Arc::new(XlsxExporter::from_config(&config));

    let controller = WizardController::new(ai, exporter);
    let states = controller.subscribe();
    let (commands_tx, commands_rx) = mpsc::unbounded_channel();
    let (notices_tx, notices_rx) = mpsc::unbounded_channel();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build async runtime")?;

    // The driver owns the controller; the TUI only sees snapshots and a
    // command sender.
    let driver = runtime.spawn(drive(controller, commands_rx, notices_tx));

    let result = tui::run_wizard(states, commands_tx, notices_rx);

    driver.abort();
    runtime.shutdown_background();

    result
}

/// Forward commands into the controller and surface export outcomes.
///
/// Exporter failures are the one thing the controller does not absorb;
/// they land here, get logged, and the session keeps going.
async fn drive(
    mut controller: WizardController,
    mut commands: mpsc::UnboundedReceiver<Command>,
    notices: mpsc::UnboundedSender<Notice>,
) {
    while let Some(command) = commands.recv().await {
        match controller.dispatch(command).await {
            Ok(Some(path)) => {
                info!(path = %path.display(), "workbook exported");
                let _ = notices.send(Notice::Exported(path));
            }
            Ok(None) => {}
            Err(err) => {
                error!(error = %err, "workbook export failed");
                let _ = notices.send(Notice::ExportFailed(err.to_string()));
            }
        }
    }
}

fn apply_cli_overrides(config: &mut Config, cli: &Cli) {
    if let Some(model) = &cli.model {
        config
            .llm
            .gemini
            .get_or_insert_with(GeminiConfig::default)
            .model = Some(model.clone());
    }
    if let Some(output_dir) = &cli.output_dir {
        config.export.output_dir = Some(output_dir.clone());
    }
}
