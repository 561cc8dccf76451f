//! Interactive command console on top of the registry.

use super::completion::{CompletionPhase, CompletionState};
use super::history::HistoryBuffer;
use crate::com::{ComError, Registry};
use crate::script::ScriptExecutor;
use log::debug;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Default capacity of the command and return value histories.
pub const DEFAULT_HISTORY_SIZE: usize = 100;

/// How the current command is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConsoleMode {
    /// `<name> <args>` lines parsed by the registry.
    #[default]
    Command,
    /// Text handed to the script executor.
    Script,
}

impl fmt::Display for ConsoleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsoleMode::Command => f.write_str("command"),
            ConsoleMode::Script => f.write_str("script"),
        }
    }
}

impl FromStr for ConsoleMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "command" | "com" => Ok(ConsoleMode::Command),
            "script" | "lua" => Ok(ConsoleMode::Script),
            other => Err(format!("Unknown console mode '{}'", other)),
        }
    }
}

/// Command console: editing buffer, histories and completion.
///
/// Errors from executed commands never escape: their message becomes the
/// stored return value.
pub struct Console {
    registry: Arc<Registry>,
    script: Option<Box<dyn ScriptExecutor>>,
    mode: ConsoleMode,
    commands: HistoryBuffer<String>,
    return_values: HistoryBuffer<String>,
    current: String,
    history_index: usize,
    completion: CompletionState,
}

impl Console {
    pub fn new(registry: Arc<Registry>, history_size: usize) -> Self {
        Self {
            registry,
            script: None,
            mode: ConsoleMode::default(),
            commands: HistoryBuffer::new(history_size),
            return_values: HistoryBuffer::new(history_size),
            current: String::new(),
            history_index: 0,
            completion: CompletionState::default(),
        }
    }

    /// Attaches the executor used in [`ConsoleMode::Script`].
    pub fn with_script_executor(mut self, executor: Box<dyn ScriptExecutor>) -> Self {
        self.script = Some(executor);
        self
    }

    pub fn set_script_executor(&mut self, executor: Box<dyn ScriptExecutor>) {
        self.script = Some(executor);
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn mode(&self) -> ConsoleMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: ConsoleMode) {
        self.mode = mode;
        self.completion.reset();
    }

    pub fn toggle_mode(&mut self) -> ConsoleMode {
        let mode = match self.mode {
            ConsoleMode::Command => ConsoleMode::Script,
            ConsoleMode::Script => ConsoleMode::Command,
        };
        self.set_mode(mode);
        mode
    }

    pub fn commands(&self) -> &HistoryBuffer<String> {
        &self.commands
    }

    pub fn return_values(&self) -> &HistoryBuffer<String> {
        &self.return_values
    }

    pub fn current_command(&self) -> &str {
        &self.current
    }

    pub fn completion(&self) -> &CompletionState {
        &self.completion
    }

    /// Replaces the editing buffer, e.g. after a key press.
    pub fn set_current_command(&mut self, text: &str) {
        self.current = text.to_string();
        self.completion
            .update(text, self.mode == ConsoleMode::Script);
    }

    /// Completes the fragment being edited with the next matching name.
    ///
    /// Returns `false` if nothing matches; the buffer is left untouched then.
    pub fn complete(&mut self) -> bool {
        let candidates = match self.completion.phase() {
            CompletionPhase::Function => self.registry.function_names(),
            CompletionPhase::Domain => {
                // Functions without a domain sit directly on the prefix table.
                let mut names: BTreeSet<String> = self.registry.domains().into_iter().collect();
                names.extend(self.registry.functions_in_domain(""));
                names.into_iter().collect()
            }
            CompletionPhase::DomainFunction => {
                self.registry.functions_in_domain(self.completion.domain())
            }
        };
        match self.completion.next_match(&candidates) {
            Some(name) => {
                self.current = self.completion.completed(name);
                true
            }
            None => false,
        }
    }

    /// Executes the current command and records it with its return value.
    ///
    /// Returns the recorded return value text.
    pub fn execute(&mut self) -> String {
        let line = std::mem::take(&mut self.current);
        let result = match self.mode {
            ConsoleMode::Command => self.registry.call_text(&line),
            ConsoleMode::Script => match self.script.as_mut() {
                Some(executor) => executor.execute_script(&line),
                None => Err(ComError::Script("no script executor attached".into())),
            },
        };
        let ret = result.unwrap_or_else(|e| e.to_string());
        debug!(target: "console", "{} > {} => {}", self.mode, line, ret);

        self.commands.push(line);
        self.return_values.push(ret.clone());
        self.history_index = self.commands.len() - 1;
        self.completion.reset();
        ret
    }

    /// Loads the history entry at the cursor and moves the cursor forward,
    /// wrapping to the oldest entry. No-op on an empty history.
    pub fn next_command(&mut self) {
        if let Some(entry) = self.commands.get(self.history_index) {
            self.current = entry.clone();
            self.history_index = (self.history_index + 1) % self.commands.len();
        }
    }

    /// Loads the history entry at the cursor and moves the cursor backward,
    /// wrapping to the newest entry. No-op on an empty history.
    pub fn prev_command(&mut self) {
        if let Some(entry) = self.commands.get(self.history_index) {
            self.current = entry.clone();
            self.history_index = self
                .history_index
                .checked_sub(1)
                .unwrap_or(self.commands.len() - 1);
        }
    }
}
