//! comconsole library.
//!
//! A generic command interface: subsystems register typed functions under
//! string names, callers invoke them directly, from text or from scripts, and
//! functions mutating thread-owned state are funneled through per-domain
//! writer queues drained by the owning thread.
//!
//! - [`com`] - Registry, signature table, commands and writer queues
//! - [`console`] - Interactive console with history and completion
//! - [`script`] - Script executor seam and the Lua bridge
//! - [`config`] - INI configuration
//! - [`sandbox`] - Demo subsystem with its own physics thread

pub mod catalog;
pub mod com;
pub mod config;
pub mod console;
pub mod luarc_generator;
pub mod sandbox;
pub mod script;
pub mod stub_generator;
