//! Lua front end of the command interface.
//!
//! Every registered function is bound as `<prefix>.<domain>.<name>`, or
//! `<prefix>.<name>` when its domain is empty. A Lua call converts its
//! arguments to text tokens and goes through [`Registry::call_tokens`], so
//! writer functions are queued exactly as when typed into the console.
//!
//! ```lua
//! pw.physics.setSpeed(3)          -- queued into the `physics` domain
//! local g = pw.physics.getGravity() -- { x = 0, y = -9.81 }
//! print(pw.system.help(0))
//! ```

use super::ScriptExecutor;
use crate::com::{ComError, Registry, Value};
use log::{debug, info};
use mlua::prelude::*;
use std::sync::Arc;

/// Default root table of the scripting address space.
pub const DEFAULT_PREFIX: &str = "pw";

pub struct LuaBridge {
    lua: Lua,
    registry: Arc<Registry>,
    prefix: String,
}

impl LuaBridge {
    /// Creates a Lua state and binds all functions currently registered.
    ///
    /// # Errors
    ///
    /// Returns an error if the Lua tables cannot be created.
    pub fn new(registry: Arc<Registry>, prefix: &str) -> LuaResult<Self> {
        let bridge = Self {
            lua: Lua::new(),
            registry,
            prefix: prefix.to_string(),
        };
        bridge.bind_functions()?;
        Ok(bridge)
    }

    pub fn lua(&self) -> &Lua {
        &self.lua
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// (Re)builds the prefix table from the registry contents.
    ///
    /// Call again after registering more functions.
    pub fn bind_functions(&self) -> LuaResult<()> {
        let root = self.lua.create_table()?;
        let mut count = 0usize;
        for (name, info) in self.registry.functions() {
            let table = if info.domain.is_empty() {
                root.clone()
            } else {
                match root.get::<Option<LuaTable>>(info.domain.as_str())? {
                    Some(table) => table,
                    None => {
                        let table = self.lua.create_table()?;
                        root.set(info.domain.as_str(), table.clone())?;
                        table
                    }
                }
            };

            let registry = Arc::clone(&self.registry);
            let fn_name = name.clone();
            let function = self.lua.create_function(move |lua, args: LuaMultiValue| {
                let tokens = lua_args_to_tokens(&fn_name, args)?;
                let value = registry
                    .call_tokens(&fn_name, &tokens)
                    .map_err(|e| LuaError::runtime(e.to_string()))?;
                value_to_lua(lua, value)
            })?;
            table.set(name.as_str(), function)?;
            count += 1;
        }
        self.lua.globals().set(self.prefix.as_str(), root)?;
        debug!(target: "lua", "Bound {} function(s) under '{}'", count, self.prefix);
        Ok(())
    }

    /// Runs a script file, e.g. a start-up script.
    pub fn run_file(&self, path: &str) -> LuaResult<()> {
        let script = std::fs::read_to_string(path)
            .map_err(|e| LuaError::runtime(format!("Failed to read {}: {}", path, e)))?;
        info!(target: "lua", "Running script {}", path);
        self.lua.load(&script).set_name(path).exec()
    }

    /// Evaluates a chunk and renders its first result as console text.
    pub fn eval(&self, text: &str) -> Result<String, ComError> {
        let value = self
            .lua
            .load(text)
            .set_name("console")
            .eval::<LuaValue>()
            .map_err(|e| ComError::Script(e.to_string()))?;
        lua_value_to_text(&value).map_err(|e| ComError::Script(e.to_string()))
    }
}

impl ScriptExecutor for LuaBridge {
    fn execute_script(&mut self, text: &str) -> Result<String, ComError> {
        self.eval(text)
    }
}

/// Flattens Lua arguments into the text tokens the signature table parses.
///
/// Vectors may be passed either as two numbers or as one `{x, y}` table.
fn lua_args_to_tokens(name: &str, args: LuaMultiValue) -> LuaResult<Vec<String>> {
    let mut tokens = Vec::with_capacity(args.len());
    for arg in args {
        match arg {
            LuaValue::Boolean(b) => tokens.push(b.to_string()),
            LuaValue::Integer(i) => tokens.push(i.to_string()),
            LuaValue::Number(n) => tokens.push(n.to_string()),
            LuaValue::String(s) => tokens.push(s.to_str()?.to_string()),
            LuaValue::Table(t) => {
                let x = t
                    .get::<Option<f64>>("x")?
                    .or(t.get::<Option<f64>>(1)?);
                let y = t
                    .get::<Option<f64>>("y")?
                    .or(t.get::<Option<f64>>(2)?);
                match (x, y) {
                    (Some(x), Some(y)) => {
                        tokens.push(x.to_string());
                        tokens.push(y.to_string());
                    }
                    _ => {
                        return Err(LuaError::runtime(format!(
                            "{}: table arguments must be vectors {{x, y}}",
                            name
                        )));
                    }
                }
            }
            other => {
                return Err(LuaError::runtime(format!(
                    "{}: unsupported argument of type {}",
                    name,
                    other.type_name()
                )));
            }
        }
    }
    Ok(tokens)
}

fn value_to_lua(lua: &Lua, value: Value) -> LuaResult<LuaValue> {
    Ok(match value {
        Value::Void => LuaValue::Nil,
        Value::Bool(b) => LuaValue::Boolean(b),
        Value::Double(d) => LuaValue::Number(d),
        Value::Int(i) => LuaValue::Number(f64::from(i)),
        Value::String(s) => LuaValue::String(lua.create_string(&s)?),
        Value::Vec2Dbl(v) => vector_table(lua, v.x, v.y)?,
        Value::Vec2Int(v) => vector_table(lua, f64::from(v.x), f64::from(v.y))?,
    })
}

fn vector_table(lua: &Lua, x: f64, y: f64) -> LuaResult<LuaValue> {
    let table = lua.create_table()?;
    table.set("x", x)?;
    table.set("y", y)?;
    Ok(LuaValue::Table(table))
}

fn lua_value_to_text(value: &LuaValue) -> LuaResult<String> {
    Ok(match value {
        LuaValue::Nil => String::new(),
        LuaValue::Boolean(b) => b.to_string(),
        LuaValue::Integer(i) => i.to_string(),
        LuaValue::Number(n) => n.to_string(),
        LuaValue::String(s) => s.to_str()?.to_string(),
        LuaValue::Table(t) => match (t.get::<Option<f64>>("x")?, t.get::<Option<f64>>("y")?) {
            (Some(x), Some(y)) => format!("{} {}", x, y),
            _ => value.type_name().to_string(),
        },
        other => other.type_name().to_string(),
    })
}
