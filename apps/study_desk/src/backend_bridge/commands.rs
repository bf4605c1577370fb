//! Backend commands queued from the controller to the backend worker.

use shared::domain::ModuleId;
use std::path::PathBuf;

/// One network operation. Read-only commands carry the stamp their response
/// must present to be applied; mutating ones run under the pending flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCommand {
    RefreshModules {
        seq: u64,
    },
    UploadModule {
        path: PathBuf,
        file_name: String,
        module_name: String,
        content_type: String,
    },
    DeleteModule {
        module_id: ModuleId,
    },
    LoadConversation {
        module_id: ModuleId,
        generation: u64,
    },
    Ask {
        module_id: ModuleId,
        question: String,
    },
    /// `announce` is set when the user asked; startup checks are only logged.
    CheckHealth {
        announce: bool,
    },
    FetchModuleDetail {
        module_id: ModuleId,
    },
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            BackendCommand::RefreshModules { .. } => "refresh_modules",
            BackendCommand::UploadModule { .. } => "upload_module",
            BackendCommand::DeleteModule { .. } => "delete_module",
            BackendCommand::LoadConversation { .. } => "load_conversation",
            BackendCommand::Ask { .. } => "ask",
            BackendCommand::CheckHealth { .. } => "check_health",
            BackendCommand::FetchModuleDetail { .. } => "fetch_module_detail",
        }
    }

    /// Commands that change server state or advance the conversation.
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            BackendCommand::UploadModule { .. }
                | BackendCommand::DeleteModule { .. }
                | BackendCommand::Ask { .. }
        )
    }
}
