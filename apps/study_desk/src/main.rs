mod backend_bridge;
mod config;
mod controller;
mod ui;

use std::{io, path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::Parser;
use client_core::{StudyApi, StudyClient};
use crossbeam_channel::{bounded, unbounded};
use tracing_subscriber::EnvFilter;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::UiEvent;
use crate::ui::terminal::{self, TerminalUi};

#[derive(Parser, Debug)]
#[command(about = "Terminal client for the PDF study assistant")]
struct Args {
    /// Base URL of the backend API, e.g. http://localhost:5000/api
    #[arg(long)]
    api_url: Option<String>,
    /// Per-request timeout in seconds; 0 disables it
    #[arg(long)]
    timeout_secs: Option<u64>,
    /// Config file to use instead of the per-user default
    #[arg(long)]
    config: Option<PathBuf>,
    /// Delete modules without asking for confirmation
    #[arg(long)]
    yes: bool,
    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_filter: String,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.log_filter))
        .context("invalid log filter")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let mut settings = config::load_settings(args.config.as_deref())?;
    if let Some(api_url) = args.api_url {
        settings.api_base_url = api_url;
    }
    if let Some(secs) = args.timeout_secs {
        settings.request_timeout_secs = Some(secs);
    }
    if args.yes {
        settings.confirm_deletes = false;
    }
    tracing::info!(api_base_url = %settings.api_base_url, "starting study desk");

    let client = StudyClient::new(settings.client_config())
        .with_context(|| format!("invalid API base URL '{}'", settings.api_base_url))?;
    let api: Arc<dyn StudyApi> = Arc::new(client);

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(64);
    let (ui_tx, ui_rx) = unbounded::<UiEvent>();
    let worker = backend_bridge::runtime::launch(api, cmd_rx, ui_tx);

    let ui = TerminalUi::new(cmd_tx, settings.confirm_deletes);
    let input_rx = terminal::spawn_stdin_reader();
    terminal::run(ui, input_rx, ui_rx, &mut io::stdout()).context("terminal i/o failed")?;

    // `run` consumed the UI and with it the last command sender.
    if worker.join().is_err() {
        tracing::error!("backend worker panicked");
    }
    Ok(())
}
