//! Interactive console over the command interface.
//!
//! - [`history`] - Bounded ring buffer for commands and return values
//! - [`completion`] - Tab-completion phases and match cycling
//! - [`console`] - Editing buffer, execution and history navigation

pub mod completion;
#[allow(clippy::module_inception)]
pub mod console;
pub mod history;

pub use completion::{CompletionPhase, CompletionState};
pub use console::{Console, ConsoleMode, DEFAULT_HISTORY_SIZE};
pub use history::HistoryBuffer;
