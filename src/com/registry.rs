//! Name-addressable function registry.
//!
//! Subsystems register strongly typed closures under string names at
//! start-up. Afterwards the registry is shared (usually as `Arc<Registry>`)
//! and functions can be called:
//!
//! - directly and type-checked with [`Registry::call`] / [`Registry::try_call`];
//! - from a text line with [`Registry::call_text`], which parses the
//!   arguments according to the function's [`SignatureTag`];
//! - deferred with [`Registry::enqueue`] for writer functions, which are
//!   queued into their domain and run when the domain owner drains it.
//!
//! Text calls of writer functions are always queued, never executed on the
//! calling thread.

use super::command::{ComArgs, Command, IntoCommand, QueuedCommand, requested_shape};
use super::error::ComError;
use super::signature::SignatureTag;
use super::value::{ComReturn, ParamKind, Value};
use super::writer_queue::{DomainProducer, WriterQueues};
use log::warn;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as FmtWrite;
use std::sync::{Arc, PoisonError, RwLock};

/// Ordered `(kind, description)` pairs documenting a function's parameters.
pub type ParamList = Vec<(ParamKind, String)>;

/// Metadata kept for every registered function.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionInfo {
    pub description: String,
    pub domain: String,
    pub params: ParamList,
    pub signature: SignatureTag,
    pub is_writer: bool,
}

/// A documented event name. Events carry no callable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventInfo {
    pub domain: String,
    pub args: ParamList,
}

struct RegisteredFunction {
    command: Command,
    info: FunctionInfo,
}

#[derive(Default)]
struct Catalog {
    functions: BTreeMap<String, RegisteredFunction>,
    events: BTreeMap<String, EventInfo>,
}

/// Subsystems that expose functions through the registry.
pub trait ComInterfaceProvider {
    /// Registers this subsystem's functions, events and writer domains.
    fn register_functions(&self, registry: &Registry) -> Result<(), ComError>;
}

/// The command interface.
pub struct Registry {
    catalog: Arc<RwLock<Catalog>>,
    queues: WriterQueues,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Creates a registry holding only the built-in `help` function.
    pub fn new() -> Self {
        let registry = Self {
            catalog: Arc::new(RwLock::new(Catalog::default())),
            queues: WriterQueues::new(),
        };
        // Weak, the catalog owns this closure.
        let catalog = Arc::downgrade(&registry.catalog);
        let help = move |verbosity: i32| match catalog.upgrade() {
            Some(catalog) => {
                render_help(&catalog.read().unwrap_or_else(PoisonError::into_inner), verbosity)
            }
            None => String::new(),
        };
        // The built-in shape is in the signature table, this cannot fail.
        if let Ok(command) = Command::new(help) {
            registry.insert(
                "help",
                command,
                "Show command interface help",
                vec![(ParamKind::Int, "Verbosity (0-1)".into())],
                "system",
                false,
            );
        }
        registry
    }

    /// Registers a reader function.
    ///
    /// Returns `Ok(false)` if an existing entry of the same name was replaced.
    ///
    /// # Errors
    ///
    /// Returns [`ComError::UnsupportedSignature`] if the closure's shape is not
    /// in the signature table. Nothing is registered in that case.
    pub fn register<Args, F: IntoCommand<Args>>(
        &self,
        name: &str,
        f: F,
        description: &str,
        params: ParamList,
        domain: &str,
    ) -> Result<bool, ComError> {
        let command = f.into_command()?;
        Ok(self.insert(name, command, description, params, domain, false))
    }

    /// Registers a writer function whose calls are confined to the thread
    /// owning `domain`. Text calls and [`enqueue`](Self::enqueue) push it into
    /// the domain queue instead of running it.
    pub fn register_writer<Args, F: IntoCommand<Args>>(
        &self,
        name: &str,
        f: F,
        description: &str,
        params: ParamList,
        domain: &str,
    ) -> Result<bool, ComError> {
        let command = f.into_command()?;
        if !self.queues.has_domain(domain) {
            warn!(
                target: "com",
                "Writer <{}> registered for domain <{}> which has no queue yet",
                name, domain
            );
        }
        Ok(self.insert(name, command, description, params, domain, true))
    }

    /// Registers an already built command.
    pub fn register_command(
        &self,
        name: &str,
        command: Command,
        description: &str,
        params: ParamList,
        domain: &str,
        is_writer: bool,
    ) -> bool {
        self.insert(name, command, description, params, domain, is_writer)
    }

    /// Documents an event name for discovery; no callable is attached.
    pub fn register_event(&self, name: &str, args: ParamList, domain: &str) {
        let mut catalog = self.catalog.write().unwrap_or_else(PoisonError::into_inner);
        let previous = catalog.events.insert(
            name.to_string(),
            EventInfo {
                domain: domain.to_string(),
                args,
            },
        );
        if previous.is_some() {
            warn!(target: "com", "Event <{}> registered twice, overwriting", name);
        }
    }

    fn insert(
        &self,
        name: &str,
        command: Command,
        description: &str,
        params: ParamList,
        domain: &str,
        is_writer: bool,
    ) -> bool {
        let shape = command.tag().shape();
        if params.len() != shape.args.len() {
            warn!(
                target: "com",
                "Function <{}> documents {} parameter(s) but takes {}",
                name,
                params.len(),
                shape.args.len()
            );
        }
        let info = FunctionInfo {
            description: description.to_string(),
            domain: domain.to_string(),
            params,
            signature: command.tag(),
            is_writer,
        };
        let mut catalog = self.catalog.write().unwrap_or_else(PoisonError::into_inner);
        let previous = catalog
            .functions
            .insert(name.to_string(), RegisteredFunction { command, info });
        if previous.is_some() {
            warn!(target: "com", "Function <{}> registered twice, overwriting", name);
            return false;
        }
        true
    }

    fn lookup(&self, name: &str) -> Result<(Command, FunctionInfo), ComError> {
        let catalog = self.catalog.read().unwrap_or_else(PoisonError::into_inner);
        catalog
            .functions
            .get(name)
            .map(|entry| (entry.command.clone(), entry.info.clone()))
            .ok_or_else(|| ComError::UnknownCommand(name.to_string()))
    }

    // ==================== CALLS ====================

    /// Calls `name` synchronously with typed arguments.
    ///
    /// # Panics
    ///
    /// Panics if `name` is unknown or was registered with another shape than
    /// `(Args) -> R`. Both are programming errors; use
    /// [`try_call`](Self::try_call) to get them as values.
    pub fn call<R: ComReturn, Args: ComArgs>(&self, name: &str, args: Args) -> R {
        match self.try_call(name, args) {
            Ok(r) => r,
            Err(e) => panic!("{}", e),
        }
    }

    /// Fallible form of [`call`](Self::call).
    ///
    /// Writer functions are run directly too; only their domain owner should
    /// call them this way.
    pub fn try_call<R: ComReturn, Args: ComArgs>(&self, name: &str, args: Args) -> Result<R, ComError> {
        let (command, info) = self.lookup(name)?;
        Args::apply::<R>(&command, args).ok_or_else(|| ComError::SignatureMismatch {
            name: name.to_string(),
            registered: info.signature.to_string(),
            requested: requested_shape::<R, Args>(),
        })
    }

    /// Parses and runs a command line `<name> <arg>...`.
    ///
    /// Returns the text form of the return value, or an empty string for
    /// void functions and for writer functions, which are queued.
    pub fn call_text(&self, line: &str) -> Result<String, ComError> {
        let mut tokens = line.split_whitespace();
        let name = tokens.next().unwrap_or_default();
        let args: Vec<&str> = tokens.collect();
        let value = self.call_tokens(name, &args).inspect_err(|e| {
            if matches!(e, ComError::UnknownCommand(_)) {
                warn!(target: "com", "Unknown function <{}>", name);
            }
        })?;
        Ok(value.to_string())
    }

    /// Runs `name` with arguments given as text tokens.
    ///
    /// Writer functions are queued into their domain and yield
    /// [`Value::Void`].
    pub fn call_tokens<S: AsRef<str>>(&self, name: &str, tokens: &[S]) -> Result<Value, ComError> {
        let (command, info) = self.lookup(name)?;
        let args = info.signature.shape().parse(tokens)?;
        if info.is_writer {
            let queued = QueuedCommand::new(name, command, args)?;
            self.queues.enqueue(&info.domain, queued)?;
            return Ok(Value::Void);
        }
        command.invoke(&args)
    }

    /// Queues a typed call of the writer function `name` into its domain.
    pub fn enqueue<Args: ComArgs>(&self, name: &str, args: Args) -> Result<(), ComError> {
        let (command, info) = self.lookup(name)?;
        if !info.is_writer {
            return Err(ComError::NotAWriter(name.to_string()));
        }
        if info.signature.shape().args != Args::kinds().as_slice() {
            return Err(ComError::SignatureMismatch {
                name: name.to_string(),
                registered: info.signature.to_string(),
                requested: requested_shape::<(), Args>(),
            });
        }
        let queued = QueuedCommand::new(name, command, args.into_values())?;
        self.queues.enqueue(&info.domain, queued)
    }

    // ==================== WRITER DOMAINS ====================

    /// Creates the writer queue of `domain`; a no-op if it exists.
    pub fn register_domain(&self, domain: &str) -> bool {
        self.queues.register_domain(domain)
    }

    /// Pushes an arbitrary queued command into `domain`.
    pub fn enqueue_command(&self, domain: &str, command: QueuedCommand) -> Result<(), ComError> {
        self.queues.enqueue(domain, command)
    }

    pub fn producer(&self, domain: &str) -> Result<DomainProducer, ComError> {
        self.queues.producer(domain)
    }

    pub fn pending(&self, domain: &str) -> Result<usize, ComError> {
        self.queues.pending(domain)
    }

    /// Runs everything currently queued for `domain`. Only the domain owner
    /// may call this; see [`WriterQueues`] for the contract.
    pub fn drain(&self, domain: &str) -> Result<usize, ComError> {
        self.queues.drain(domain)
    }

    pub fn queues(&self) -> &WriterQueues {
        &self.queues
    }

    // ==================== INTROSPECTION ====================

    pub fn contains(&self, name: &str) -> bool {
        self.catalog
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .functions
            .contains_key(name)
    }

    pub fn info(&self, name: &str) -> Option<FunctionInfo> {
        self.catalog
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .functions
            .get(name)
            .map(|entry| entry.info.clone())
    }

    pub fn signature(&self, name: &str) -> Option<SignatureTag> {
        self.info(name).map(|info| info.signature)
    }

    /// All function names, sorted.
    pub fn function_names(&self) -> Vec<String> {
        self.catalog
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .functions
            .keys()
            .cloned()
            .collect()
    }

    /// Names of the functions registered under `domain`, sorted.
    pub fn functions_in_domain(&self, domain: &str) -> Vec<String> {
        self.catalog
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .functions
            .iter()
            .filter(|(_, entry)| entry.info.domain == domain)
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Every non-empty domain that has functions or a writer queue, sorted.
    pub fn domains(&self) -> Vec<String> {
        let mut domains: BTreeSet<String> = self.queues.domains().into_iter().collect();
        let catalog = self.catalog.read().unwrap_or_else(PoisonError::into_inner);
        domains.extend(catalog.functions.values().map(|entry| entry.info.domain.clone()));
        domains.remove("");
        domains.into_iter().collect()
    }

    /// All functions with their metadata, sorted by name.
    pub fn functions(&self) -> Vec<(String, FunctionInfo)> {
        self.catalog
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .functions
            .iter()
            .map(|(name, entry)| (name.clone(), entry.info.clone()))
            .collect()
    }

    /// All documented events, sorted by name.
    pub fn events(&self) -> Vec<(String, EventInfo)> {
        self.catalog
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .events
            .iter()
            .map(|(name, info)| (name.clone(), info.clone()))
            .collect()
    }

    /// Help text: names only for `verbosity <= 0`, otherwise domain,
    /// description and parameters of every function and event.
    pub fn help(&self, verbosity: i32) -> String {
        render_help(
            &self.catalog.read().unwrap_or_else(PoisonError::into_inner),
            verbosity,
        )
    }
}

fn render_help(catalog: &Catalog, verbosity: i32) -> String {
    let mut out = String::new();
    if verbosity <= 0 {
        for name in catalog.functions.keys() {
            let _ = writeln!(out, "{}", name);
        }
        return out;
    }
    for (name, entry) in &catalog.functions {
        let info = &entry.info;
        let _ = writeln!(out, "Command: {} ({})", name, info.domain);
        let _ = writeln!(out, "- Description: {}", info.description);
        write_params(&mut out, &info.params);
        out.push('\n');
    }
    for (name, info) in &catalog.events {
        let _ = writeln!(out, "Event: {} ({})", name, info.domain);
        write_params(&mut out, &info.args);
        out.push('\n');
    }
    out
}

fn write_params(out: &mut String, params: &ParamList) {
    if params.is_empty() {
        let _ = writeln!(out, "- Params: {}", ParamKind::Void);
    }
    for (kind, description) in params {
        let _ = writeln!(out, "- Params: {} {}", kind, description);
    }
}
