//! Line-oriented front end. Owns `AppState` on the UI thread, turns typed
//! commands into reducer intents and re-renders after every state change.

use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
    thread,
};

use crossbeam_channel::{select, unbounded, Receiver, Sender};
use shared::domain::ModuleId;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::{
    events::{UiErrorContext, UiEvent},
    orchestration::dispatch_backend_commands,
    state::{AppState, Notice, ValidationError},
};
use crate::ui::view;

pub const DELETE_CONFIRMATION_PROMPT: &str = "Delete this module? This cannot be undone. [y/N]";

const HELP: &str = "\
commands:
  modules | refresh          reload the module list
  select <id> | deselect     change the selected module
  upload <path> [name]       upload a PDF (name defaults to the file name;
                             quote a path that contains spaces)
  delete <id>                delete a module (asks for confirmation)
  question <text>            edit the question without sending it
  ask [text]                 send the question for the selected module
  show <id>                  show a module's extracted content
  health                     check the backend
  view | help | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Refresh,
    Select(ModuleId),
    Deselect,
    Upload {
        path: PathBuf,
        module_name: Option<String>,
    },
    Delete(ModuleId),
    Question(String),
    Ask(Option<String>),
    Show(ModuleId),
    Health,
    View,
    Help,
    Quit,
}

fn parse_module_id(verb: &str, arg: &str) -> Result<ModuleId, String> {
    arg.parse::<ModuleId>()
        .map_err(|_| format!("usage: {verb} <module id>"))
}

const UPLOAD_USAGE: &str = "usage: upload <path> [name] (quote a path that contains spaces)";

/// Splits `<path> [name]`, where the path may be wrapped in double quotes.
fn split_upload_args(rest: &str) -> Result<(&str, Option<String>), String> {
    let (path, name) = match rest.strip_prefix('"') {
        Some(quoted) => quoted
            .split_once('"')
            .ok_or_else(|| "unterminated quote in upload path".to_string())?,
        None => rest.split_once(char::is_whitespace).unwrap_or((rest, "")),
    };
    if path.is_empty() {
        return Err(UPLOAD_USAGE.to_string());
    }
    let name = name.trim();
    Ok((path, (!name.is_empty()).then(|| name.to_string())))
}

pub fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    match verb.to_ascii_lowercase().as_str() {
        "modules" | "refresh" => Ok(Command::Refresh),
        "select" => parse_module_id("select", rest).map(Command::Select),
        "deselect" => Ok(Command::Deselect),
        "upload" => {
            let (path, name) = split_upload_args(rest)?;
            Ok(Command::Upload {
                path: PathBuf::from(path),
                module_name: name,
            })
        }
        "delete" => parse_module_id("delete", rest).map(Command::Delete),
        "question" => Ok(Command::Question(rest.to_string())),
        "ask" => Ok(Command::Ask((!rest.is_empty()).then(|| rest.to_string()))),
        "show" => parse_module_id("show", rest).map(Command::Show),
        "health" => Ok(Command::Health),
        "view" => Ok(Command::View),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        "" => Ok(Command::View),
        other => Err(format!("unknown command '{other}'; type 'help'")),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOutcome {
    Render,
    Print(&'static str),
    Prompt(&'static str),
    Quit,
}

pub struct TerminalUi {
    state: AppState,
    cmd_tx: Sender<BackendCommand>,
    confirm_deletes: bool,
    awaiting_delete_confirmation: Option<ModuleId>,
}

impl TerminalUi {
    pub fn new(cmd_tx: Sender<BackendCommand>, confirm_deletes: bool) -> Self {
        Self {
            state: AppState::default(),
            cmd_tx,
            confirm_deletes,
            awaiting_delete_confirmation: None,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn awaiting_delete_confirmation(&self) -> bool {
        self.awaiting_delete_confirmation.is_some()
    }

    fn dispatch(&mut self, cmds: Vec<BackendCommand>) {
        dispatch_backend_commands(&self.cmd_tx, cmds, &mut self.state);
    }

    fn dispatch_or_reject(
        &mut self,
        context: UiErrorContext,
        result: Result<Vec<BackendCommand>, ValidationError>,
    ) {
        match result {
            Ok(cmds) => self.dispatch(cmds),
            Err(err) => self.state.reject(context, &err),
        }
    }

    /// Initial module fetch plus a health check.
    pub fn start(&mut self) {
        let mut cmds = self.state.refresh_modules();
        cmds.extend(self.state.startup_health_check());
        self.dispatch(cmds);
    }

    pub fn handle_event(&mut self, event: UiEvent) {
        let cmds = self.state.apply_event(event);
        self.dispatch(cmds);
    }

    pub fn process_ui_events(&mut self, ui_rx: &Receiver<UiEvent>) {
        while let Ok(event) = ui_rx.try_recv() {
            self.handle_event(event);
        }
    }

    pub fn handle_line(&mut self, line: &str) -> LineOutcome {
        self.state.notice = None;

        if let Some(module_id) = self.awaiting_delete_confirmation.take() {
            let answer = line.trim().to_ascii_lowercase();
            match answer.as_str() {
                "y" | "yes" | "n" | "no" | "" => {
                    let confirmed = answer.starts_with('y');
                    let result = self.state.request_delete(module_id, confirmed);
                    self.dispatch_or_reject(UiErrorContext::Delete, result);
                    return LineOutcome::Render;
                }
                // Anything else abandons the prompt and runs as a command.
                _ => tracing::info!(
                    module_id = module_id.0,
                    "delete not confirmed; running input as a command"
                ),
            }
        }

        let command = match parse_command(line) {
            Ok(command) => command,
            Err(usage) => {
                self.state.notice = Some(Notice::error(usage));
                return LineOutcome::Render;
            }
        };

        match command {
            Command::Refresh => {
                let cmds = self.state.refresh_modules();
                self.dispatch(cmds);
            }
            Command::Select(module_id) => {
                let result = self.state.select_module(module_id);
                self.dispatch_or_reject(UiErrorContext::Select, result);
            }
            Command::Deselect => {
                let cmds = self.state.clear_selection();
                self.dispatch(cmds);
            }
            Command::Upload { path, module_name } => {
                let result = self.state.request_upload(&path, module_name.as_deref());
                self.dispatch_or_reject(UiErrorContext::Upload, result);
            }
            Command::Delete(module_id) => {
                if !self.confirm_deletes {
                    let result = self.state.request_delete(module_id, true);
                    self.dispatch_or_reject(UiErrorContext::Delete, result);
                } else if self.state.is_pending() {
                    self.state.reject(UiErrorContext::Delete, &ValidationError::Busy);
                } else {
                    self.awaiting_delete_confirmation = Some(module_id);
                    return LineOutcome::Prompt(DELETE_CONFIRMATION_PROMPT);
                }
            }
            Command::Question(text) => {
                if let Err(err) = self.state.set_question(text) {
                    self.state.reject(UiErrorContext::Ask, &err);
                }
            }
            Command::Ask(text) => {
                if let Some(text) = text {
                    if let Err(err) = self.state.set_question(text) {
                        self.state.reject(UiErrorContext::Ask, &err);
                        return LineOutcome::Render;
                    }
                }
                let result = self.state.submit_question();
                self.dispatch_or_reject(UiErrorContext::Ask, result);
            }
            Command::Show(module_id) => {
                let result = self.state.show_module_detail(module_id);
                self.dispatch_or_reject(UiErrorContext::ModuleDetail, result);
            }
            Command::Health => {
                let cmds = self.state.check_health();
                self.dispatch(cmds);
            }
            Command::View => {}
            Command::Help => return LineOutcome::Print(HELP),
            Command::Quit => return LineOutcome::Quit,
        }
        LineOutcome::Render
    }
}

/// Feeds stdin lines into a channel so the UI loop can wait on input and
/// backend completions together.
pub fn spawn_stdin_reader() -> Receiver<String> {
    let (tx, rx) = unbounded();
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(err) => {
                    tracing::warn!("stdin read failed: {err}");
                    break;
                }
            }
        }
    });
    rx
}

enum Wake {
    Line(String),
    Event(UiEvent),
    Closed,
}

pub fn run(
    mut ui: TerminalUi,
    input_rx: Receiver<String>,
    ui_rx: Receiver<UiEvent>,
    out: &mut impl Write,
) -> io::Result<()> {
    ui.start();
    write!(out, "{}", view::render(ui.state()))?;
    writeln!(out, "type 'help' for commands")?;
    out.flush()?;

    loop {
        let wake = select! {
            recv(input_rx) -> line => line.map(Wake::Line).unwrap_or(Wake::Closed),
            recv(ui_rx) -> event => event.map(Wake::Event).unwrap_or(Wake::Closed),
        };
        match wake {
            Wake::Line(line) => match ui.handle_line(&line) {
                LineOutcome::Quit => break,
                LineOutcome::Print(text) => writeln!(out, "{text}")?,
                LineOutcome::Prompt(prompt) => write!(out, "{prompt} ")?,
                LineOutcome::Render => write!(out, "{}", view::render(ui.state()))?,
            },
            Wake::Event(event) => {
                ui.handle_event(event);
                ui.process_ui_events(&ui_rx);
                write!(out, "{}", view::render(ui.state()))?;
                if ui.awaiting_delete_confirmation() {
                    write!(out, "{DELETE_CONFIRMATION_PROMPT} ")?;
                }
            }
            Wake::Closed => break,
        }
        out.flush()?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../tests/terminal_tests.rs"]
mod tests;
