//! Plain-text rendering of `AppState`.

use std::fmt::Write as _;

use crate::controller::state::{AppState, NoticeSeverity, PendingOperation};

pub const NO_MODULES_PLACEHOLDER: &str = "No modules yet. Upload a PDF to start.";
pub const NO_QUESTIONS_PLACEHOLDER: &str = "No questions yet. Ask something to get started!";
pub const WELCOME_PLACEHOLDER: &str =
    "Select a module from the list or upload a new PDF to get started.";

pub fn render(state: &AppState) -> String {
    let mut out = String::new();
    let modules = state.modules.modules();
    let selected = state.modules.selected_id();

    let _ = writeln!(out, "== Your Modules ({}) ==", modules.len());
    if modules.is_empty() {
        let _ = writeln!(out, "  {NO_MODULES_PLACEHOLDER}");
    }
    for module in modules {
        let marker = if selected == Some(module.id) { '>' } else { ' ' };
        let _ = writeln!(out, "{marker} [{}] {}", module.id, module.module_name);
    }

    let _ = writeln!(out);
    match state.modules.selected() {
        None => {
            let _ = writeln!(out, "{WELCOME_PLACEHOLDER}");
        }
        Some(module) => {
            let uploaded = module
                .upload_day()
                .map(|day| day.format("%b %-d, %Y").to_string())
                .unwrap_or_else(|| module.upload_date.clone());
            let _ = writeln!(out, "-- {} (Uploaded: {uploaded}) --", module.module_name);
            let conversations = &state.conversations;
            if conversations.entries().is_empty() {
                if conversations.is_loading() && !conversations.is_loaded() {
                    let _ = writeln!(out, "  Loading conversation...");
                } else {
                    let _ = writeln!(out, "  {NO_QUESTIONS_PLACEHOLDER}");
                }
            }
            for entry in conversations.entries() {
                let _ = writeln!(out, "  Q: {}", entry.question);
                let _ = writeln!(out, "  A: {}", entry.answer);
            }
            let _ = writeln!(out, "Question: {}", state.question_input);
        }
    }

    if let Some(detail) = &state.module_detail {
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "-- Module {} content ({}) --",
            detail.id, detail.filename
        );
        let _ = writeln!(out, "{}", excerpt(&detail.content, 600));
    }

    match &state.pending {
        Some(PendingOperation::Upload { module_name }) => {
            let _ = writeln!(out, "[Uploading {module_name}...]");
        }
        Some(PendingOperation::Delete { module_id }) => {
            let _ = writeln!(out, "[Deleting module {module_id}...]");
        }
        Some(PendingOperation::Ask { .. }) => {
            let _ = writeln!(out, "[Processing...]");
        }
        None => {}
    }

    if let Some(notice) = &state.notice {
        let prefix = match notice.severity {
            NoticeSeverity::Info => "*",
            NoticeSeverity::Error => "!",
        };
        let _ = writeln!(out, "{prefix} {}", notice.message);
    }
    out
}

fn excerpt(content: &str, max_chars: usize) -> String {
    let mut chars = content.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}
