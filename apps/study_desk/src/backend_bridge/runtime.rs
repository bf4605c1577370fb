//! Backend worker: owns the async runtime, runs queued commands concurrently
//! and reports each completion back to the UI thread.

use std::{
    sync::Arc,
    thread::{self, JoinHandle},
};

use client_core::StudyApi;
use crossbeam_channel::{Receiver, Sender};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::{
    events::{UiError, UiErrorContext, UiEvent},
    orchestration::execute_command,
};

/// Runs until the command queue disconnects. Commands are spawned as
/// independent tasks, so completions may arrive in any order.
pub fn launch(
    api: Arc<dyn StudyApi>,
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.send(UiEvent::Error(UiError::transport(
                    UiErrorContext::BackendStartup,
                    format!("backend worker startup failure: failed to build runtime: {err}"),
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        runtime.block_on(async move {
            tracing::debug!("backend worker ready");
            while let Ok(cmd) = cmd_rx.recv() {
                let api = Arc::clone(&api);
                let ui_tx = ui_tx.clone();
                tokio::spawn(async move {
                    let name = cmd.name();
                    let event = execute_command(api.as_ref(), cmd).await;
                    if ui_tx.send(event).is_err() {
                        tracing::debug!(command = name, "ui gone; dropping completion");
                    }
                });
            }
            tracing::debug!("command queue closed; backend worker stopping");
        });
    })
}
