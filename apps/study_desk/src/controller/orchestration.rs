//! Command orchestration: queueing reducer output for the backend worker and
//! mapping each executed command's outcome back into a `UiEvent`.

use client_core::{StudyApi, UploadRequest};
use crossbeam_channel::{Sender, TrySendError};
use tracing::{debug, warn};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::{
    events::{UiError, UiErrorContext, UiEvent},
    state::{AppState, Notice},
};

pub fn dispatch_backend_command(
    cmd_tx: &Sender<BackendCommand>,
    cmd: BackendCommand,
    state: &mut AppState,
) {
    let cmd_name = cmd.name();
    let mutating = cmd.is_mutating();

    let failure = match cmd_tx.try_send(cmd) {
        Ok(()) => {
            debug!(command = cmd_name, "queued ui->backend command");
            return;
        }
        Err(TrySendError::Full(_)) => "Command queue is full; please retry",
        Err(TrySendError::Disconnected(_)) => {
            "Backend worker disconnected (possible startup/runtime failure); restart the app"
        }
    };

    warn!(command = cmd_name, failure, "failed to queue backend command");
    // The command will never complete, so the flag it set must not linger.
    if mutating {
        state.pending = None;
    }
    state.notice = Some(Notice::error(failure));
}

pub fn dispatch_backend_commands(
    cmd_tx: &Sender<BackendCommand>,
    cmds: Vec<BackendCommand>,
    state: &mut AppState,
) {
    for cmd in cmds {
        dispatch_backend_command(cmd_tx, cmd, state);
    }
}

/// Runs one command against the backend and reports how it ended.
pub async fn execute_command(api: &dyn StudyApi, cmd: BackendCommand) -> UiEvent {
    match cmd {
        BackendCommand::RefreshModules { seq } => match api.list_modules().await {
            Ok(modules) => UiEvent::ModulesLoaded { seq, modules },
            Err(err) => UiEvent::ModulesLoadFailed {
                seq,
                error: UiError::transport(UiErrorContext::Refresh, err.to_string()),
            },
        },
        BackendCommand::UploadModule {
            path,
            file_name,
            module_name,
            content_type,
        } => {
            let bytes = match tokio::fs::read(&path).await {
                Ok(bytes) => bytes,
                Err(err) => {
                    return UiEvent::UploadFailed {
                        module_name,
                        error: UiError::validation(
                            UiErrorContext::Upload,
                            format!("could not read '{}': {err}", path.display()),
                        ),
                    };
                }
            };
            let upload = UploadRequest {
                file_name,
                module_name: module_name.clone(),
                content_type,
                bytes,
            };
            match api.upload_module(upload).await {
                Ok(response) => UiEvent::ModuleUploaded {
                    module_name,
                    pdf_id: response.pdf_id,
                },
                Err(err) => UiEvent::UploadFailed {
                    module_name,
                    error: UiError::transport(UiErrorContext::Upload, err.to_string()),
                },
            }
        }
        BackendCommand::DeleteModule { module_id } => match api.delete_module(module_id).await {
            Ok(()) => UiEvent::ModuleDeleted { module_id },
            Err(err) => UiEvent::DeleteFailed {
                module_id,
                error: UiError::transport(UiErrorContext::Delete, err.to_string()),
            },
        },
        BackendCommand::LoadConversation {
            module_id,
            generation,
        } => match api.list_conversations(module_id).await {
            Ok(entries) => UiEvent::ConversationLoaded {
                module_id,
                generation,
                entries,
            },
            Err(err) => UiEvent::ConversationLoadFailed {
                module_id,
                generation,
                error: UiError::transport(UiErrorContext::LoadConversation, err.to_string()),
            },
        },
        BackendCommand::Ask {
            module_id,
            question,
        } => match api.ask(module_id, &question).await {
            Ok(_) => UiEvent::QuestionAnswered { module_id },
            Err(err) => UiEvent::AskFailed {
                module_id,
                error: UiError::transport(UiErrorContext::Ask, err.to_string()),
            },
        },
        BackendCommand::CheckHealth { announce } => match api.health().await {
            Ok(health) => UiEvent::HealthChecked {
                healthy: health.is_ok(),
                message: health.message,
                announce,
            },
            Err(err) => UiEvent::HealthCheckFailed {
                error: UiError::transport(UiErrorContext::Health, err.to_string()),
                announce,
            },
        },
        BackendCommand::FetchModuleDetail { module_id } => {
            match api.module_detail(module_id).await {
                Ok(detail) => UiEvent::ModuleDetailLoaded { detail },
                Err(err) => UiEvent::ModuleDetailFailed {
                    module_id,
                    error: UiError::transport(UiErrorContext::ModuleDetail, err.to_string()),
                },
            }
        }
    }
}

#[cfg(test)]
#[path = "../tests/orchestration_tests.rs"]
mod tests;
