//! Error taxonomy of the command interface.
//!
//! Text calls coming from the console are the only path expected to see
//! malformed input; those errors are rendered back as text by the
//! [`Console`](crate::console::Console). Everything else (typed calls with the
//! wrong shape, closures with an unsupported shape) is a programmer defect.

use thiserror::Error;

/// Errors raised by the registry, the writer queues and the script bridge.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ComError {
    /// No function is registered under this name.
    #[error("Unknown command <{0}>")]
    UnknownCommand(String),
    /// Wrong number of tokens or a token that does not parse as the expected kind.
    #[error("Parameter error: {0}")]
    ParamError(String),
    /// The called function rejected one of its argument values.
    #[error("Invalid value: {0}")]
    InvalidValue(String),
    /// A typed call asked for a shape other than the one registered.
    #[error("Signature mismatch for <{name}>: registered as {registered}, requested {requested}")]
    SignatureMismatch {
        name: String,
        registered: String,
        requested: String,
    },
    /// The closure's return/argument types do not form a supported signature.
    #[error("Unsupported signature {0}")]
    UnsupportedSignature(String),
    /// No writer queue exists for this domain.
    #[error("Unknown domain <{0}>")]
    UnknownDomain(String),
    /// Deferred execution was requested for a function not marked as writer.
    #[error("Function <{0}> is not a writer")]
    NotAWriter(String),
    /// The consumer side of a domain queue is gone.
    #[error("Queue of domain <{0}> is closed")]
    QueueClosed(String),
    /// Error reported by the external script executor.
    #[error("Script error: {0}")]
    Script(String),
}

impl ComError {
    /// Shorthand for building an [`ComError::InvalidValue`] from a callee.
    pub fn invalid(msg: impl Into<String>) -> Self {
        ComError::InvalidValue(msg.into())
    }
}
