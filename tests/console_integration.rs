//! Console integration tests against the sandbox subsystem.

use comconsole::com::{ComInterfaceProvider, Registry};
use comconsole::console::{CompletionPhase, Console, ConsoleMode};
use comconsole::sandbox::{PHYSICS_DOMAIN, Sandbox};
use std::sync::Arc;

fn console() -> (Console, Sandbox) {
    let registry = Registry::new();
    let sandbox = Sandbox::new();
    sandbox.register_functions(&registry).unwrap();
    (Console::new(Arc::new(registry), 4), sandbox)
}

// =============================================================================
// Execution
// =============================================================================

#[test]
fn writer_line_is_deferred_until_drain() {
    let (mut console, sandbox) = console();
    console.set_current_command("setSpeed 5");
    assert_eq!(console.execute(), "");
    assert_eq!(sandbox.state().speed, 0);

    console.registry().drain(PHYSICS_DOMAIN).unwrap();
    console.set_current_command("getSpeed");
    assert_eq!(console.execute(), "5");
}

#[test]
fn errors_are_stored_as_return_values() {
    let (mut console, _) = console();
    console.set_current_command("setGravity 1");
    let ret = console.execute();
    assert!(ret.starts_with("Parameter error"), "{ret}");
    assert_eq!(console.return_values().last(), Some(&ret));
}

#[test]
fn history_is_bounded() {
    let (mut console, _) = console();
    for i in 0..6 {
        console.set_current_command(&format!("setSpeed {i}"));
        console.execute();
    }
    assert_eq!(console.commands().len(), 4);
    assert_eq!(console.commands().get(0).map(String::as_str), Some("setSpeed 2"));
    assert_eq!(console.return_values().len(), 4);
}

// =============================================================================
// Completion
// =============================================================================

#[test]
fn command_mode_completes_function_names() {
    let (mut console, _) = console();
    console.set_current_command("set");
    let mut seen = Vec::new();
    for _ in 0..4 {
        assert!(console.complete());
        seen.push(console.current_command().to_string());
    }
    assert_eq!(seen, vec!["setGravity", "setSpeed", "setTimeScale", "setGravity"]);
}

#[test]
fn script_mode_completes_domains_then_functions() {
    let (mut console, _) = console();
    console.set_mode(ConsoleMode::Script);

    console.set_current_command("pw.ph");
    assert_eq!(console.completion().phase(), CompletionPhase::Domain);
    assert!(console.complete());
    assert_eq!(console.current_command(), "pw.physics");

    console.set_current_command("pw.physics.getT");
    assert_eq!(console.completion().phase(), CompletionPhase::DomainFunction);
    assert!(console.complete());
    assert_eq!(console.current_command(), "pw.physics.getTime");

    console.set_current_command("pw.system.");
    assert!(console.complete());
    assert_eq!(console.current_command(), "pw.system.help");
}

#[test]
fn command_mode_ignores_dots() {
    let (mut console, _) = console();
    console.set_current_command("pw.ph");
    assert_eq!(console.completion().phase(), CompletionPhase::Function);
    assert!(!console.complete());
}

// =============================================================================
// Script mode
// =============================================================================

#[cfg(feature = "lua")]
#[test]
fn lua_script_mode_reaches_registry() {
    use comconsole::script::LuaBridge;

    let (console, sandbox) = console();
    let bridge = LuaBridge::new(Arc::clone(console.registry()), "pw").unwrap();
    let mut console = console.with_script_executor(Box::new(bridge));
    console.set_mode(ConsoleMode::Script);

    console.set_current_command("pw.physics.setGravity(0, -1.5)");
    assert_eq!(console.execute(), "");
    console.registry().drain(PHYSICS_DOMAIN).unwrap();
    console.set_current_command("return pw.physics.getGravity()");
    assert_eq!(console.execute(), "0 -1.5");
    assert_eq!(sandbox.state().gravity.y, -1.5);
}
