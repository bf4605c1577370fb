//! State transitions. Every user intent and backend completion goes through
//! here and yields the commands to run next; nothing else mutates `AppState`.

use std::path::Path;

use shared::domain::ModuleId;
use tracing::{debug, info, warn};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::{
    events::{UiError, UiErrorContext, UiEvent},
    state::{AppState, ConversationStore, Notice, PendingOperation, ValidationError},
};

pub const UPLOAD_SUCCESS_NOTICE: &str = "PDF uploaded successfully!";
pub const DELETE_SUCCESS_NOTICE: &str = "Module deleted";

/// Selection transition. Clears the conversation immediately and, for a new
/// subject, schedules its fetch as the next command.
pub fn on_selection_change(
    conversations: &mut ConversationStore,
    prev: Option<ModuleId>,
    next: Option<ModuleId>,
) -> Vec<BackendCommand> {
    debug!(
        prev = prev.map(|id| id.0),
        next = next.map(|id| id.0),
        "selection changed"
    );
    conversations.reset(next);
    match next {
        Some(module_id) => vec![load_for(conversations, module_id)],
        None => Vec::new(),
    }
}

fn load_for(conversations: &mut ConversationStore, module_id: ModuleId) -> BackendCommand {
    let generation = conversations.begin_load(module_id);
    BackendCommand::LoadConversation {
        module_id,
        generation,
    }
}

/// File name without directories and without its last extension.
pub fn default_module_name(file_name: &str) -> String {
    let path = Path::new(file_name);
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.starts_with('.') || path.extension().is_some())
        .unwrap_or_default()
}

fn guess_content_type(file_name: &str) -> String {
    mime_guess::from_path(file_name)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

impl AppState {
    fn ensure_idle(&self) -> Result<(), ValidationError> {
        if self.is_pending() {
            return Err(ValidationError::Busy);
        }
        Ok(())
    }

    fn finish_pending(&mut self) {
        if let Some(op) = self.pending.take() {
            debug!(?op, "pending operation finished");
        }
    }

    fn surface(&mut self, error: &UiError) {
        debug!(context = ?error.context(), category = ?error.category(), "surfacing error");
        self.notice = Some(Notice::error(error.user_message()));
    }

    fn change_selection(&mut self, next: Option<ModuleId>) -> Vec<BackendCommand> {
        let prev = self.modules.selected_id();
        self.modules.set_selected(next);
        on_selection_change(&mut self.conversations, prev, next)
    }

    pub fn refresh_modules(&mut self) -> Vec<BackendCommand> {
        let seq = self.modules.begin_refresh();
        vec![BackendCommand::RefreshModules { seq }]
    }

    /// Selecting a module not in the list is a no-op with a diagnostic.
    pub fn select_module(
        &mut self,
        module_id: ModuleId,
    ) -> Result<Vec<BackendCommand>, ValidationError> {
        if !self.modules.contains(module_id) {
            warn!(
                module_id = module_id.0,
                "ignoring selection of module absent from the module list"
            );
            return Err(ValidationError::UnknownModule(module_id));
        }
        Ok(self.change_selection(Some(module_id)))
    }

    pub fn clear_selection(&mut self) -> Vec<BackendCommand> {
        self.change_selection(None)
    }

    pub fn request_upload(
        &mut self,
        path: &Path,
        module_name: Option<&str>,
    ) -> Result<Vec<BackendCommand>, ValidationError> {
        self.ensure_idle()?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let module_name = match module_name {
            Some(name) => name.trim().to_string(),
            None => default_module_name(&file_name),
        };
        if module_name.is_empty() {
            return Err(ValidationError::EmptyModuleName);
        }

        info!(%file_name, %module_name, "upload requested");
        self.pending = Some(PendingOperation::Upload {
            module_name: module_name.clone(),
        });
        Ok(vec![BackendCommand::UploadModule {
            path: path.to_path_buf(),
            content_type: guess_content_type(&file_name),
            file_name,
            module_name,
        }])
    }

    pub fn request_delete(
        &mut self,
        module_id: ModuleId,
        confirmed: bool,
    ) -> Result<Vec<BackendCommand>, ValidationError> {
        self.ensure_idle()?;
        if !confirmed {
            return Err(ValidationError::DeleteNotConfirmed);
        }
        if !self.modules.contains(module_id) {
            return Err(ValidationError::UnknownModule(module_id));
        }

        info!(module_id = module_id.0, "delete requested");
        self.pending = Some(PendingOperation::Delete { module_id });
        Ok(vec![BackendCommand::DeleteModule { module_id }])
    }

    /// The question input is read-only while an operation is pending.
    pub fn set_question(&mut self, text: impl Into<String>) -> Result<(), ValidationError> {
        self.ensure_idle()?;
        self.question_input = text.into();
        Ok(())
    }

    pub fn submit_question(&mut self) -> Result<Vec<BackendCommand>, ValidationError> {
        self.ensure_idle()?;
        if self.question_input.trim().is_empty() {
            return Err(ValidationError::EmptyQuestion);
        }
        let module_id = self
            .modules
            .selected_id()
            .ok_or(ValidationError::NoModuleSelected)?;

        info!(module_id = module_id.0, "question submitted");
        self.pending = Some(PendingOperation::Ask { module_id });
        Ok(vec![BackendCommand::Ask {
            module_id,
            question: self.question_input.clone(),
        }])
    }

    /// Health check requested by the user; the result becomes a notice.
    pub fn check_health(&mut self) -> Vec<BackendCommand> {
        vec![BackendCommand::CheckHealth { announce: true }]
    }

    /// Health check at startup; the result is only logged.
    pub fn startup_health_check(&mut self) -> Vec<BackendCommand> {
        vec![BackendCommand::CheckHealth { announce: false }]
    }

    pub fn show_module_detail(
        &mut self,
        module_id: ModuleId,
    ) -> Result<Vec<BackendCommand>, ValidationError> {
        if !self.modules.contains(module_id) {
            return Err(ValidationError::UnknownModule(module_id));
        }
        Ok(vec![BackendCommand::FetchModuleDetail { module_id }])
    }

    /// Surfaces a locally rejected intent.
    pub fn reject(&mut self, context: UiErrorContext, err: &ValidationError) {
        debug!(?context, %err, "intent rejected locally");
        self.surface(&UiError::from_validation(context, err));
    }

    pub fn apply_event(&mut self, event: UiEvent) -> Vec<BackendCommand> {
        match event {
            UiEvent::Error(error) => {
                self.surface(&error);
                Vec::new()
            }
            UiEvent::ModulesLoaded { seq, modules } => {
                let count = modules.len();
                if !self.modules.apply_refresh(seq, modules) {
                    debug!(seq, "discarding superseded module list");
                    return Vec::new();
                }
                debug!(seq, count, "module list replaced");
                match self.modules.selected_id() {
                    Some(selected) if !self.modules.contains(selected) => {
                        warn!(
                            module_id = selected.0,
                            "selected module no longer listed; clearing selection"
                        );
                        self.change_selection(None)
                    }
                    _ => Vec::new(),
                }
            }
            UiEvent::ModulesLoadFailed { seq, error } => {
                warn!(seq, error = error.message(), "module refresh failed; keeping previous list");
                Vec::new()
            }
            UiEvent::ModuleUploaded {
                module_name,
                pdf_id,
            } => {
                self.finish_pending();
                info!(%module_name, pdf_id = pdf_id.map(|id| id.0), "upload complete");
                self.notice = Some(Notice::info(UPLOAD_SUCCESS_NOTICE));
                self.refresh_modules()
            }
            UiEvent::UploadFailed { module_name, error } => {
                self.finish_pending();
                warn!(%module_name, error = error.message(), "upload failed");
                self.surface(&error);
                Vec::new()
            }
            UiEvent::ModuleDeleted { module_id } => {
                self.finish_pending();
                self.notice = Some(Notice::info(DELETE_SUCCESS_NOTICE));
                if self
                    .module_detail
                    .as_ref()
                    .is_some_and(|detail| detail.id == module_id)
                {
                    self.module_detail = None;
                }
                let mut commands = self.refresh_modules();
                if self.modules.selected_id() == Some(module_id) {
                    commands.extend(self.change_selection(None));
                }
                commands
            }
            UiEvent::DeleteFailed { module_id, error } => {
                self.finish_pending();
                warn!(module_id = module_id.0, error = error.message(), "delete failed");
                self.surface(&error);
                Vec::new()
            }
            UiEvent::ConversationLoaded {
                module_id,
                generation,
                entries,
            } => {
                if !self
                    .conversations
                    .apply_loaded(module_id, generation, entries)
                {
                    debug!(
                        module_id = module_id.0,
                        generation,
                        subject = self.conversations.subject().map(|id| id.0),
                        current_generation = self.conversations.generation(),
                        "discarding stale conversation response"
                    );
                }
                Vec::new()
            }
            UiEvent::ConversationLoadFailed {
                module_id,
                generation,
                error,
            } => {
                warn!(
                    module_id = module_id.0,
                    generation,
                    error = error.message(),
                    "conversation fetch failed; keeping previous entries"
                );
                self.conversations.apply_failed(module_id, generation);
                Vec::new()
            }
            UiEvent::QuestionAnswered { module_id } => {
                self.finish_pending();
                self.question_input.clear();
                if self.modules.selected_id() == Some(module_id) {
                    vec![load_for(&mut self.conversations, module_id)]
                } else {
                    debug!(
                        module_id = module_id.0,
                        "selection moved during ask; skipping reload"
                    );
                    Vec::new()
                }
            }
            UiEvent::AskFailed { module_id, error } => {
                self.finish_pending();
                warn!(module_id = module_id.0, error = error.message(), "ask failed");
                self.surface(&error);
                Vec::new()
            }
            UiEvent::HealthChecked {
                healthy,
                message,
                announce,
            } => {
                if healthy {
                    info!(%message, "backend healthy");
                } else {
                    warn!(%message, "backend reports a problem");
                }
                if announce {
                    self.notice = Some(if healthy {
                        Notice::info(format!("Backend healthy: {message}"))
                    } else {
                        Notice::error(format!("Backend reports a problem: {message}"))
                    });
                }
                Vec::new()
            }
            UiEvent::HealthCheckFailed { error, announce } => {
                warn!(error = error.message(), "health check failed");
                if announce {
                    self.surface(&error);
                }
                Vec::new()
            }
            UiEvent::ModuleDetailLoaded { detail } => {
                self.module_detail = Some(detail);
                Vec::new()
            }
            UiEvent::ModuleDetailFailed { module_id, error } => {
                warn!(module_id = module_id.0, error = error.message(), "module detail fetch failed");
                self.surface(&error);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
#[path = "../tests/reducer_tests.rs"]
mod tests;
