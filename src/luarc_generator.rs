//! Generator for `.luarc.json`, the Lua Language Server configuration.
//!
//! The generated config declares the scripting prefix as a global and points
//! the workspace library at the generated stubs file.

use std::path::Path;

/// Generate `.luarc.json` content for the given prefix and stubs file.
pub fn generate_luarc(prefix: &str, stubs_filename: &str) -> Result<String, String> {
    if prefix.is_empty() {
        return Err("Script prefix must not be empty".to_string());
    }

    let content = serde_json::json!({
        "$schema": "https://raw.githubusercontent.com/LuaLS/vscode-lua/master/setting/schema.json",
        "runtime.version": "LuaJIT",
        "diagnostics.globals": [prefix],
        "workspace.library": [stubs_filename],
        "completion.autoRequire": false
    });

    serde_json::to_string_pretty(&content)
        .map_err(|e| format!("Failed to serialize .luarc.json: {e}"))
}

/// Write the generated `.luarc.json` content to a file.
pub fn write_luarc(path: &Path, content: &str) -> Result<(), String> {
    std::fs::write(path, content)
        .map_err(|e| format!("Failed to write {}: {e}", path.display()))
}
