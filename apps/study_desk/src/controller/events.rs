//! Backend completion events and error modeling for the study controller.

use shared::domain::{ConversationEntry, Module, ModuleDetail, ModuleId};

use crate::controller::state::ValidationError;

/// Completion of a `BackendCommand`, delivered to the UI thread.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    Error(UiError),
    ModulesLoaded {
        seq: u64,
        modules: Vec<Module>,
    },
    ModulesLoadFailed {
        seq: u64,
        error: UiError,
    },
    ModuleUploaded {
        module_name: String,
        pdf_id: Option<ModuleId>,
    },
    UploadFailed {
        module_name: String,
        error: UiError,
    },
    ModuleDeleted {
        module_id: ModuleId,
    },
    DeleteFailed {
        module_id: ModuleId,
        error: UiError,
    },
    ConversationLoaded {
        module_id: ModuleId,
        generation: u64,
        entries: Vec<ConversationEntry>,
    },
    ConversationLoadFailed {
        module_id: ModuleId,
        generation: u64,
        error: UiError,
    },
    QuestionAnswered {
        module_id: ModuleId,
    },
    AskFailed {
        module_id: ModuleId,
        error: UiError,
    },
    HealthChecked {
        healthy: bool,
        message: String,
        announce: bool,
    },
    HealthCheckFailed {
        error: UiError,
        announce: bool,
    },
    ModuleDetailLoaded {
        detail: ModuleDetail,
    },
    ModuleDetailFailed {
        module_id: ModuleId,
        error: UiError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Transport,
    Validation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    Refresh,
    Upload,
    Delete,
    LoadConversation,
    Ask,
    Select,
    Health,
    ModuleDetail,
}

impl UiErrorContext {
    pub fn label(self) -> &'static str {
        match self {
            UiErrorContext::BackendStartup => "Startup",
            UiErrorContext::Refresh => "Module list",
            UiErrorContext::Upload => "Upload",
            UiErrorContext::Delete => "Delete",
            UiErrorContext::LoadConversation => "Conversation",
            UiErrorContext::Ask => "Question",
            UiErrorContext::Select => "Selection",
            UiErrorContext::Health => "Health check",
            UiErrorContext::ModuleDetail => "Module detail",
        }
    }
}

pub fn classify_transport_failure(message: &str) -> String {
    let lower = message.to_ascii_lowercase();
    if lower.contains("error sending request")
        || lower.contains("connection refused")
        || lower.contains("dns")
        || lower.contains("timed out")
    {
        "Server unreachable; check the API URL/network and retry.".to_string()
    } else {
        message.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn transport(context: UiErrorContext, message: impl Into<String>) -> Self {
        Self {
            category: UiErrorCategory::Transport,
            context,
            message: message.into(),
        }
    }

    pub fn validation(context: UiErrorContext, message: impl Into<String>) -> Self {
        Self {
            category: UiErrorCategory::Validation,
            context,
            message: message.into(),
        }
    }

    pub fn from_validation(context: UiErrorContext, err: &ValidationError) -> Self {
        Self::validation(context, err.to_string())
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Text shown to the user.
    pub fn user_message(&self) -> String {
        let detail = match self.category {
            UiErrorCategory::Transport => classify_transport_failure(&self.message),
            UiErrorCategory::Validation => self.message.clone(),
        };
        format!("{} failed: {detail}", self.context.label())
    }
}
