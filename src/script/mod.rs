//! Script execution seam of the console.
//!
//! The console hands script-mode text to a [`ScriptExecutor`] without knowing
//! the language behind it. With the `lua` feature a [`LuaBridge`] exposes the
//! registry to Lua.

use crate::com::ComError;

#[cfg(feature = "lua")]
pub mod lua_bridge;

#[cfg(feature = "lua")]
pub use lua_bridge::LuaBridge;

/// Runs a chunk of script text and renders its result.
pub trait ScriptExecutor {
    fn execute_script(&mut self, text: &str) -> Result<String, ComError>;
}

impl<F> ScriptExecutor for F
where
    F: FnMut(&str) -> Result<String, ComError>,
{
    fn execute_script(&mut self, text: &str) -> Result<String, ComError> {
        self(text)
    }
}
