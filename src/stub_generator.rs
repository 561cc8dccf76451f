//! Lua stub generator for EmmyLua / lua-language-server.
//!
//! Reads the registry metadata and emits a deterministic stub file declaring
//! `<prefix>.<domain>.<function>` with `---@param` and `---@return`
//! annotations, so editors can complete script-mode commands.

use crate::com::{FunctionInfo, ParamKind, ParamList, Registry};
use std::collections::BTreeMap;
use std::fmt::Write as FmtWrite;
use std::path::Path;

/// Default file name of the generated stubs.
pub const DEFAULT_STUBS_FILE: &str = "comconsole.lua";

/// Generate the stub file content for every registered function and event.
pub fn generate_stubs(registry: &Registry, prefix: &str) -> String {
    let mut by_domain: BTreeMap<String, Vec<(String, FunctionInfo)>> = BTreeMap::new();
    for (name, info) in registry.functions() {
        by_domain.entry(info.domain.clone()).or_default().push((name, info));
    }

    let mut out = String::with_capacity(8 * 1024);
    let _ = writeln!(out, "---@meta");
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "-- THIS FILE IS AUTO-GENERATED by `comconsole --create-lua-stubs`."
    );
    let _ = writeln!(out, "-- DO NOT EDIT MANUALLY. Regenerate from the registry instead.");
    let _ = writeln!(out);
    let _ = writeln!(out, "---@class {}", prefix);
    let _ = writeln!(out, "---Functions exposed through the command interface");
    let _ = writeln!(out, "{} = {{}}", prefix);
    let _ = writeln!(out);

    render_types(&mut out);

    for (domain, functions) in &by_domain {
        let table = if domain.is_empty() {
            prefix.to_string()
        } else {
            let table = format!("{}.{}", prefix, domain);
            let _ = writeln!(out, "-- ==================== {} ====================", domain);
            let _ = writeln!(out);
            let _ = writeln!(out, "---@class {}", table);
            let _ = writeln!(out, "{} = {{}}", table);
            let _ = writeln!(out);
            table
        };
        for (name, info) in functions {
            render_function(&mut out, &table, name, info);
        }
    }

    render_events(&mut out, registry);
    out
}

/// Write the generated stub content to a file.
pub fn write_stubs(path: &Path, content: &str) -> Result<(), String> {
    std::fs::write(path, content).map_err(|e| format!("Failed to write {}: {e}", path.display()))
}

fn render_types(out: &mut String) {
    let _ = writeln!(out, "-- ==================== Types ====================");
    let _ = writeln!(out);
    let _ = writeln!(out, "---2D vector; also accepted as two numbers");
    let _ = writeln!(out, "---@class Vector2");
    let _ = writeln!(out, "---@field x number");
    let _ = writeln!(out, "---@field y number");
    let _ = writeln!(out);
}

fn render_function(out: &mut String, table: &str, name: &str, info: &FunctionInfo) {
    write_description(out, &info.description);
    if info.is_writer {
        let _ = writeln!(out, "---Queued into the `{}` domain.", info.domain);
    }
    let names = param_names(&info.params);
    for ((kind, description), pname) in info.params.iter().zip(&names) {
        let _ = writeln!(out, "---@param {} {} {}", pname, kind.lua_type(), description);
    }
    let ret = info.signature.shape().ret;
    if ret != ParamKind::Void && !info.is_writer {
        let _ = writeln!(out, "---@return {}", ret.lua_type());
    }
    let _ = writeln!(out, "function {}.{}({}) end", table, name, names.join(", "));
    let _ = writeln!(out);
}

fn render_events(out: &mut String, registry: &Registry) {
    let events = registry.events();
    if events.is_empty() {
        return;
    }
    let _ = writeln!(out, "-- ==================== Events ====================");
    let _ = writeln!(out, "-- Documented for reference; events carry no callable.");
    let _ = writeln!(out);
    for (name, info) in events {
        let _ = writeln!(out, "-- {} ({})", name, info.domain);
        for ((kind, description), pname) in info.args.iter().zip(param_names(&info.args)) {
            let _ = writeln!(out, "--   {} {} {}", pname, kind.lua_type(), description);
        }
        let _ = writeln!(out);
    }
}

fn write_description(out: &mut String, description: &str) {
    for line in description.lines() {
        let _ = writeln!(out, "---{}", line);
    }
}

/// Lua parameter names derived from the first word of each description.
///
/// Falls back to `argN` for empty, non-identifier or repeated names.
fn param_names(params: &ParamList) -> Vec<String> {
    let mut names: Vec<String> = Vec::with_capacity(params.len());
    for (i, (_, description)) in params.iter().enumerate() {
        let word: String = description
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
            .collect::<String>()
            .to_ascii_lowercase();
        let valid = word.chars().next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
        if valid && !names.contains(&word) && !is_lua_keyword(&word) {
            names.push(word);
        } else {
            names.push(format!("arg{}", i + 1));
        }
    }
    names
}

fn is_lua_keyword(word: &str) -> bool {
    matches!(
        word,
        "and" | "break" | "do" | "else" | "elseif" | "end" | "false" | "for" | "function"
            | "goto" | "if" | "in" | "local" | "nil" | "not" | "or" | "repeat" | "return"
            | "then" | "true" | "until" | "while"
    )
}
