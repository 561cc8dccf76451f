//! Generic command interface.
//!
//! Unrelated subsystems expose strongly typed functions under string names.
//! Those functions can then be called directly (type-checked), from a parsed
//! text line, or, for functions mutating state owned by one thread, queued
//! from any thread and executed by the owner when it drains its domain.
//!
//! # Architecture
//!
//! - [`value`] - Closed set of parameter kinds and their Rust types
//! - [`signature`] - Table of supported function shapes
//! - [`command`] - Type-erased command objects, bound and queued
//! - [`writer_queue`] - Per-domain multi-producer queues
//! - [`registry`] - Name to command map, metadata and call entry points
//!
//! # Example
//!
//! ```
//! use comconsole::com::{ParamKind, Registry};
//!
//! let registry = Registry::new();
//! registry
//!     .register(
//!         "double",
//!         |x: i32| x * 2,
//!         "Doubles a number",
//!         vec![(ParamKind::Int, "Number".into())],
//!         "math",
//!     )
//!     .unwrap();
//!
//! assert_eq!(registry.call::<i32, _>("double", (21,)), 42);
//! assert_eq!(registry.call_text("double 4").unwrap(), "8");
//! ```

pub mod command;
pub mod error;
pub mod registry;
pub mod signature;
pub mod value;
pub mod writer_queue;

pub use command::{ComArgs, Command, IntoCommand, QueuedCommand};
pub use error::ComError;
pub use registry::{ComInterfaceProvider, EventInfo, FunctionInfo, ParamList, Registry};
pub use signature::{ArgValues, Shape, SignatureTag};
pub use value::{ComReturn, ComType, ParamKind, Value};
pub use writer_queue::{DomainProducer, WriterQueues};
