//! Type-erased command objects.
//!
//! A [`Command`] wraps an arbitrary closure together with its
//! [`SignatureTag`]. It keeps two views of the same closure:
//!
//! - a typed one (`Arc<dyn Fn(A, B) -> R>` behind `Any`) used by direct typed
//!   calls, which downcast to the exact requested shape;
//! - an erased one (`Fn(&[Value]) -> Result<Value, ComError>`) used by text
//!   calls and by queue replay.
//!
//! Both are built once at registration from the closure's own types, so no
//! per-tag switch is needed anywhere. A [`QueuedCommand`] is a command plus a
//! snapshot of its arguments, consumed when it is invoked.

use super::error::ComError;
use super::signature::{ArgValues, SignatureTag, describe};
use super::value::{ComReturn, ComType, ParamKind, Value};
use smallvec::{SmallVec, smallvec};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

type ErasedFn = dyn Fn(&[Value]) -> Result<Value, ComError> + Send + Sync;

/// A registered callable with a fixed signature.
#[derive(Clone)]
pub struct Command {
    tag: SignatureTag,
    typed: Arc<dyn Any + Send + Sync>,
    erased: Arc<ErasedFn>,
}

impl Command {
    /// Wraps a closure, deriving its tag from the closure's types.
    ///
    /// # Errors
    ///
    /// Returns [`ComError::UnsupportedSignature`] if the shape is not in the
    /// signature table.
    pub fn new<Args, F: IntoCommand<Args>>(f: F) -> Result<Self, ComError> {
        f.into_command()
    }

    pub fn tag(&self) -> SignatureTag {
        self.tag
    }

    /// Invokes the closure with already parsed/captured values.
    pub fn invoke(&self, args: &[Value]) -> Result<Value, ComError> {
        self.tag.shape().check(args)?;
        (self.erased)(args)
    }

    fn typed<T: 'static>(&self) -> Option<&T> {
        self.typed.downcast_ref::<T>()
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command").field("tag", &self.tag).finish()
    }
}

/// Closures that can become a [`Command`].
///
/// `Args` is the tuple of argument types; it only exists to keep the
/// implementations for different arities apart.
pub trait IntoCommand<Args>: Send + Sync + 'static {
    fn into_command(self) -> Result<Command, ComError>;
}

/// Argument tuples usable in typed calls.
pub trait ComArgs: Sized + Send + 'static {
    fn kinds() -> SmallVec<[ParamKind; 4]>;

    fn into_values(self) -> ArgValues;

    /// Calls `command` if it was registered with exactly `(Self) -> R`.
    fn apply<R: ComReturn>(command: &Command, args: Self) -> Option<R>;
}

/// Text form of a requested typed shape, for mismatch errors.
pub fn requested_shape<R: ComReturn, Args: ComArgs>() -> String {
    describe(R::KIND, &Args::kinds())
}

macro_rules! impl_command_arity {
    ($($arg:ident),*) => {
        impl<$($arg: ComType),*> ComArgs for ($($arg,)*) {
            fn kinds() -> SmallVec<[ParamKind; 4]> {
                smallvec![$($arg::KIND),*]
            }

            #[allow(non_snake_case)]
            fn into_values(self) -> ArgValues {
                let ($($arg,)*) = self;
                smallvec![$($arg.into_value()),*]
            }

            #[allow(non_snake_case)]
            fn apply<R: ComReturn>(command: &Command, args: Self) -> Option<R> {
                let f = command.typed::<Arc<dyn Fn($($arg),*) -> R + Send + Sync>>()?;
                let ($($arg,)*) = args;
                Some(f($($arg),*))
            }
        }

        impl<F, R, $($arg: ComType),*> IntoCommand<($($arg,)*)> for F
        where
            F: Fn($($arg),*) -> R + Send + Sync + 'static,
            R: ComReturn,
        {
            #[allow(non_snake_case, unused_mut, unused_variables)]
            fn into_command(self) -> Result<Command, ComError> {
                let tag = SignatureTag::resolve(R::KIND, &[$($arg::KIND),*])?;
                let typed: Arc<dyn Fn($($arg),*) -> R + Send + Sync> = Arc::new(self);
                let inner = Arc::clone(&typed);
                let erased = move |values: &[Value]| -> Result<Value, ComError> {
                    let mut values = values.iter().cloned();
                    $(
                        let $arg = $arg::from_value(values.next().ok_or_else(|| {
                            ComError::ParamError("missing argument".into())
                        })?)?;
                    )*
                    inner($($arg),*).into_result()
                };
                Ok(Command {
                    tag,
                    typed: Arc::new(typed),
                    erased: Arc::new(erased),
                })
            }
        }
    };
}

impl_command_arity!();
impl_command_arity!(A);
impl_command_arity!(A, B);
impl_command_arity!(A, B, C);

/// A command with a snapshot of its arguments, waiting in a writer queue.
///
/// Owned by the queue from push until pop, then by the draining thread which
/// consumes it through [`invoke`](Self::invoke).
pub struct QueuedCommand {
    name: String,
    command: Command,
    args: ArgValues,
}

impl QueuedCommand {
    /// Captures `args` for a later call of `command`.
    ///
    /// # Errors
    ///
    /// Returns [`ComError::ParamError`] if the values do not fit the command's
    /// signature.
    pub fn new(
        name: impl Into<String>,
        command: Command,
        args: impl IntoIterator<Item = Value>,
    ) -> Result<Self, ComError> {
        let args: ArgValues = args.into_iter().collect();
        command.tag.shape().check(&args)?;
        Ok(Self {
            name: name.into(),
            command,
            args,
        })
    }

    /// Wraps an ad-hoc closure and its typed arguments.
    pub fn from_fn<Args, F>(name: impl Into<String>, f: F, args: Args) -> Result<Self, ComError>
    where
        Args: ComArgs,
        F: IntoCommand<Args>,
    {
        Self::new(name, f.into_command()?, args.into_values())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tag(&self) -> SignatureTag {
        self.command.tag
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// Runs the command with its captured arguments and drops it.
    pub fn invoke(self) -> Result<Value, ComError> {
        self.command.invoke(&self.args)
    }
}

impl fmt::Debug for QueuedCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueuedCommand")
            .field("name", &self.name)
            .field("tag", &self.command.tag)
            .field("args", &self.args)
            .finish()
    }
}
