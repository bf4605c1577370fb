//! Application state: module store, conversation store, selection, pending flag.

use shared::domain::{ConversationEntry, Module, ModuleDetail, ModuleId};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("enter a question first")]
    EmptyQuestion,
    #[error("select a module first")]
    NoModuleSelected,
    #[error("delete was not confirmed")]
    DeleteNotConfirmed,
    #[error("module name must not be empty")]
    EmptyModuleName,
    #[error("module {0} is not in the current module list")]
    UnknownModule(ModuleId),
    #[error("another operation is still in progress")]
    Busy,
}

/// The single mutating operation allowed in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingOperation {
    Upload { module_name: String },
    Delete { module_id: ModuleId },
    Ask { module_id: ModuleId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeSeverity {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub severity: NoticeSeverity,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            severity: NoticeSeverity::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: NoticeSeverity::Error,
            message: message.into(),
        }
    }
}

/// Known modules plus the selection. The list is only ever replaced whole.
#[derive(Debug, Default)]
pub struct ModuleStore {
    modules: Vec<Module>,
    selected: Option<ModuleId>,
    issued_seq: u64,
    applied_seq: u64,
}

impl ModuleStore {
    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    pub fn contains(&self, module_id: ModuleId) -> bool {
        self.modules.iter().any(|module| module.id == module_id)
    }

    pub fn get(&self, module_id: ModuleId) -> Option<&Module> {
        self.modules.iter().find(|module| module.id == module_id)
    }

    pub fn selected_id(&self) -> Option<ModuleId> {
        self.selected
    }

    /// The selected module, if it is still part of the list.
    pub fn selected(&self) -> Option<&Module> {
        self.selected.and_then(|id| self.get(id))
    }

    pub(crate) fn set_selected(&mut self, selected: Option<ModuleId>) {
        self.selected = selected;
    }

    /// Stamps a new refresh request.
    pub fn begin_refresh(&mut self) -> u64 {
        self.issued_seq += 1;
        self.issued_seq
    }

    /// Replaces the list if `seq` is newer than the last applied refresh.
    /// Selection is deliberately left alone; callers re-validate it.
    pub fn apply_refresh(&mut self, seq: u64, modules: Vec<Module>) -> bool {
        if seq <= self.applied_seq {
            return false;
        }
        self.applied_seq = seq;
        self.modules = modules;
        true
    }
}

/// Conversation of the current subject module.
#[derive(Debug, Default)]
pub struct ConversationStore {
    subject: Option<ModuleId>,
    entries: Vec<ConversationEntry>,
    generation: u64,
    loading: bool,
    loaded: bool,
}

impl ConversationStore {
    pub fn subject(&self) -> Option<ModuleId> {
        self.subject
    }

    pub fn entries(&self) -> &[ConversationEntry] {
        &self.entries
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// True once a response for the current subject has been applied.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Drops all entries and retargets the store. Bumps the generation so any
    /// fetch still in flight is recognised as stale.
    pub fn reset(&mut self, subject: Option<ModuleId>) {
        self.subject = subject;
        self.entries.clear();
        self.generation += 1;
        self.loading = false;
        self.loaded = false;
    }

    /// Stamps a new fetch for `module_id` and returns its generation.
    pub fn begin_load(&mut self, module_id: ModuleId) -> u64 {
        if self.subject != Some(module_id) {
            self.reset(Some(module_id));
        }
        self.generation += 1;
        self.loading = true;
        self.generation
    }

    fn is_current(&self, module_id: ModuleId, generation: u64) -> bool {
        self.subject == Some(module_id) && self.generation == generation
    }

    pub fn apply_loaded(
        &mut self,
        module_id: ModuleId,
        generation: u64,
        entries: Vec<ConversationEntry>,
    ) -> bool {
        if !self.is_current(module_id, generation) {
            return false;
        }
        self.entries = entries;
        self.loading = false;
        self.loaded = true;
        true
    }

    /// Ends the current fetch without touching the entries.
    pub fn apply_failed(&mut self, module_id: ModuleId, generation: u64) -> bool {
        if !self.is_current(module_id, generation) {
            return false;
        }
        self.loading = false;
        true
    }
}

/// All UI-facing state. Mutated only on the UI thread, through the reducer.
#[derive(Debug, Default)]
pub struct AppState {
    pub modules: ModuleStore,
    pub conversations: ConversationStore,
    pub question_input: String,
    pub pending: Option<PendingOperation>,
    pub notice: Option<Notice>,
    pub module_detail: Option<ModuleDetail>,
}

impl AppState {
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}
