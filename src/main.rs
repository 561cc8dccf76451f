//! comconsole command line front end.
//!
//! Starts a registry with the demo [`Sandbox`] subsystem, runs its physics
//! thread, and reads console lines from stdin (or `--exec` arguments).
//!
//! Lines starting with `:` are console meta commands:
//!
//! - `:mode [command|script]` - switch or toggle the console mode
//! - `:complete <text>` - list the completions of `<text>`
//! - `:history` - show commands with their return values
//! - `:quit` - leave
//!
//! # Running
//!
//! ```sh
//! cargo run -- --exec "setSpeed 3" --exec "help 1"
//! cargo run -- --script
//! ```

use clap::Parser;
use comconsole::catalog;
use comconsole::com::{ComInterfaceProvider, Registry};
use comconsole::config::ConsoleConfig;
use comconsole::console::{Console, ConsoleMode};
use comconsole::luarc_generator;
use comconsole::sandbox::{PhysicsThread, Sandbox};
use comconsole::stub_generator;
use log::{info, warn};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

const PHYSICS_TICK: Duration = Duration::from_millis(16);

/// Generic command interface console
#[derive(Parser)]
#[command(version, about = "Command registry console with per-domain writer queues")]
struct Cli {
    /// INI configuration file (default: ./comconsole.ini if present).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Execute a console line and exit. May be repeated.
    #[arg(long, value_name = "CMD")]
    exec: Vec<String>,

    /// Start in script mode.
    #[arg(long)]
    script: bool,

    /// Generate Lua LSP stubs from the registry and exit.
    /// Optionally provide a path (default: comconsole.lua).
    #[arg(long, value_name = "PATH")]
    create_lua_stubs: Option<Option<PathBuf>>,

    /// Generate .luarc.json for Lua Language Server and exit.
    /// Optionally provide a path (default: .luarc.json).
    #[arg(long, value_name = "PATH")]
    create_luarc: Option<Option<PathBuf>>,

    /// Write the JSON command catalog and exit.
    /// Optionally provide a path (default: commands.json).
    #[arg(long, value_name = "PATH")]
    dump_commands: Option<Option<PathBuf>>,
}

fn main() {
    let cli = Cli::parse();

    let (config, config_error) = load_config(cli.config.as_ref());
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.log_filter.as_str()),
    )
    .init();
    if let Some(e) = config_error {
        warn!("{}, using defaults", e);
    }

    let registry = Arc::new(Registry::new());
    for domain in &config.writer_domains {
        registry.register_domain(domain);
    }
    let sandbox = Sandbox::new();
    if let Err(e) = sandbox.register_functions(&registry) {
        eprintln!("Error registering sandbox functions: {e}");
        std::process::exit(1);
    }

    // Early exits: documentation exports need the registry only
    if let Some(maybe_path) = cli.create_lua_stubs {
        let path = maybe_path.unwrap_or_else(|| PathBuf::from(stub_generator::DEFAULT_STUBS_FILE));
        let content = stub_generator::generate_stubs(&registry, &config.script_prefix);
        exit_with(stub_generator::write_stubs(&path, &content), "Lua stubs", &path);
    }
    if let Some(maybe_path) = cli.create_luarc {
        let path = maybe_path.unwrap_or_else(|| PathBuf::from(".luarc.json"));
        let result = luarc_generator::generate_luarc(
            &config.script_prefix,
            stub_generator::DEFAULT_STUBS_FILE,
        )
        .and_then(|content| luarc_generator::write_luarc(&path, &content));
        exit_with(result, ".luarc.json", &path);
    }
    if let Some(maybe_path) = cli.dump_commands {
        let path = maybe_path.unwrap_or_else(|| PathBuf::from("commands.json"));
        let result = catalog::generate_catalog(&registry)
            .and_then(|content| catalog::write_catalog(&path, &content));
        exit_with(result, "Command catalog", &path);
    }

    let physics = PhysicsThread::spawn(Arc::clone(&registry), sandbox, PHYSICS_TICK);

    let mut console = Console::new(Arc::clone(&registry), config.history_size);
    attach_script_executor(&mut console, &registry, &config.script_prefix);
    console.set_mode(if cli.script {
        ConsoleMode::Script
    } else {
        config.mode
    });

    if cli.exec.is_empty() {
        run_interactive(&mut console);
    } else {
        for line in &cli.exec {
            console.set_current_command(line);
            print_result(&console.execute());
        }
    }

    let ticks = physics.shutdown();
    info!("Physics ran {} tick(s)", ticks);
}

fn load_config(path: Option<&PathBuf>) -> (ConsoleConfig, Option<String>) {
    let mut config = match path {
        Some(path) => ConsoleConfig::with_path(path),
        None => ConsoleConfig::new(),
    };
    if path.is_none() && !config.config_path.exists() {
        return (config, None);
    }
    let error = config.load_from_file().err();
    (config, error)
}

fn exit_with(result: Result<(), String>, what: &str, path: &std::path::Path) -> ! {
    match result {
        Ok(()) => {
            println!("{} written to {}", what, path.display());
            std::process::exit(0);
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

#[cfg(feature = "lua")]
fn attach_script_executor(console: &mut Console, registry: &Arc<Registry>, prefix: &str) {
    match comconsole::script::LuaBridge::new(Arc::clone(registry), prefix) {
        Ok(bridge) => console.set_script_executor(Box::new(bridge)),
        Err(e) => warn!("Script mode unavailable: {}", e),
    }
}

#[cfg(not(feature = "lua"))]
fn attach_script_executor(_console: &mut Console, _registry: &Arc<Registry>, _prefix: &str) {
    info!("Built without Lua support, script mode has no executor");
}

fn run_interactive(console: &mut Console) {
    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("{}> ", console.mode());
        let _ = std::io::stdout().flush();
        let Some(Ok(line)) = lines.next() else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match line.strip_prefix(':') {
            Some(meta) => {
                if !run_meta(console, meta) {
                    break;
                }
            }
            None => {
                console.set_current_command(line);
                print_result(&console.execute());
            }
        }
    }
}

/// Runs a `:` meta command. Returns `false` to quit.
fn run_meta(console: &mut Console, meta: &str) -> bool {
    let (cmd, rest) = meta.split_once(' ').unwrap_or((meta, ""));
    match cmd {
        "q" | "quit" | "exit" => return false,
        "mode" => {
            if rest.trim().is_empty() {
                console.toggle_mode();
            } else {
                match rest.parse::<ConsoleMode>() {
                    Ok(mode) => console.set_mode(mode),
                    Err(e) => println!("{e}"),
                }
            }
            println!("Mode: {}", console.mode());
        }
        "complete" => {
            console.set_current_command(rest);
            let mut seen: Vec<String> = Vec::new();
            while console.complete() {
                let candidate = console.current_command().to_string();
                if seen.contains(&candidate) {
                    break;
                }
                seen.push(candidate);
            }
            if seen.is_empty() {
                println!("No completion for '{}'", rest);
            }
            for candidate in seen {
                println!("{}", candidate);
            }
            console.set_current_command("");
        }
        "history" => {
            for (command, ret) in console.commands().iter().zip(console.return_values().iter()) {
                println!("{} => {}", command, ret);
            }
        }
        other => println!("Unknown meta command ':{}'", other),
    }
    true
}

fn print_result(text: &str) {
    if !text.is_empty() {
        println!("{}", text.trim_end());
    }
}
