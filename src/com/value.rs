//! Parameter kinds and the values that flow through the command interface.
//!
//! The set of kinds is closed: every registered function is built from these,
//! which is what makes text parsing and deferred replay possible without
//! reflection.

use super::error::ComError;
use glam::{DVec2, IVec2};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Kind of a single parameter or return value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    /// No value (a function returning nothing).
    Void,
    Bool,
    Double,
    Int,
    /// A single whitespace-free token.
    String,
    /// Two doubles, `x y`.
    Vec2Dbl,
    /// Two integers, `x y`.
    Vec2Int,
}

impl ParamKind {
    /// Label used in help output and generated documentation.
    pub fn as_str(self) -> &'static str {
        match self {
            ParamKind::Void => "<none>",
            ParamKind::Bool => "<bool>",
            ParamKind::Double => "<double>",
            ParamKind::Int => "<int>",
            ParamKind::String => "<string>",
            ParamKind::Vec2Dbl => "<vec2dbl>",
            ParamKind::Vec2Int => "<vec2int>",
        }
    }

    /// Number of whitespace separated tokens this kind consumes on a command line.
    pub fn token_count(self) -> usize {
        match self {
            ParamKind::Void => 0,
            ParamKind::Vec2Dbl | ParamKind::Vec2Int => 2,
            _ => 1,
        }
    }

    /// Parses exactly [`token_count`](Self::token_count) tokens into a value.
    pub fn parse<S: AsRef<str>>(self, tokens: &[S]) -> Result<Value, ComError> {
        if tokens.len() != self.token_count() {
            return Err(ComError::ParamError(format!(
                "{} expects {} token(s), got {}",
                self,
                self.token_count(),
                tokens.len()
            )));
        }
        let token = |i: usize| tokens[i].as_ref();
        Ok(match self {
            ParamKind::Void => Value::Void,
            ParamKind::Bool => Value::Bool(parse_bool(token(0))?),
            ParamKind::Double => Value::Double(parse_token(token(0), self)?),
            ParamKind::Int => Value::Int(parse_token(token(0), self)?),
            ParamKind::String => Value::String(token(0).to_string()),
            ParamKind::Vec2Dbl => Value::Vec2Dbl(DVec2::new(
                parse_token(token(0), self)?,
                parse_token(token(1), self)?,
            )),
            ParamKind::Vec2Int => Value::Vec2Int(IVec2::new(
                parse_token(token(0), self)?,
                parse_token(token(1), self)?,
            )),
        })
    }

    /// Type name used for Lua stubs.
    pub fn lua_type(self) -> &'static str {
        match self {
            ParamKind::Void => "nil",
            ParamKind::Bool => "boolean",
            ParamKind::Double => "number",
            ParamKind::Int => "integer",
            ParamKind::String => "string",
            ParamKind::Vec2Dbl | ParamKind::Vec2Int => "Vector2",
        }
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ParamKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

fn parse_token<T: FromStr>(token: &str, kind: ParamKind) -> Result<T, ComError> {
    token
        .parse::<T>()
        .map_err(|_| ComError::ParamError(format!("cannot read '{}' as {}", token, kind)))
}

fn parse_bool(token: &str) -> Result<bool, ComError> {
    match token {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(ComError::ParamError(format!(
            "cannot read '{}' as {}",
            token,
            ParamKind::Bool
        ))),
    }
}

/// A concrete argument or return value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Void,
    Bool(bool),
    Double(f64),
    Int(i32),
    String(String),
    Vec2Dbl(DVec2),
    Vec2Int(IVec2),
}

impl Value {
    pub fn kind(&self) -> ParamKind {
        match self {
            Value::Void => ParamKind::Void,
            Value::Bool(_) => ParamKind::Bool,
            Value::Double(_) => ParamKind::Double,
            Value::Int(_) => ParamKind::Int,
            Value::String(_) => ParamKind::String,
            Value::Vec2Dbl(_) => ParamKind::Vec2Dbl,
            Value::Vec2Int(_) => ParamKind::Vec2Int,
        }
    }
}

/// Text form of a return value: vectors are space-joined, void is empty.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Void => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Double(d) => write!(f, "{}", d),
            Value::Int(i) => write!(f, "{}", i),
            Value::String(s) => f.write_str(s),
            Value::Vec2Dbl(v) => write!(f, "{} {}", v.x, v.y),
            Value::Vec2Int(v) => write!(f, "{} {}", v.x, v.y),
        }
    }
}

fn kind_mismatch(expected: ParamKind, got: &Value) -> ComError {
    ComError::ParamError(format!("expected {}, got {}", expected, got.kind()))
}

/// Rust types that map onto a [`ParamKind`].
pub trait ComType: Sized + Send + 'static {
    const KIND: ParamKind;

    fn into_value(self) -> Value;

    fn from_value(value: Value) -> Result<Self, ComError>;
}

impl ComType for () {
    const KIND: ParamKind = ParamKind::Void;

    fn into_value(self) -> Value {
        Value::Void
    }

    fn from_value(value: Value) -> Result<Self, ComError> {
        match value {
            Value::Void => Ok(()),
            other => Err(kind_mismatch(<Self as ComType>::KIND, &other)),
        }
    }
}

macro_rules! com_type {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl ComType for $ty {
                const KIND: ParamKind = ParamKind::$kind;

                fn into_value(self) -> Value {
                    Value::$kind(self)
                }

                fn from_value(value: Value) -> Result<Self, ComError> {
                    match value {
                        Value::$kind(v) => Ok(v),
                        other => Err(kind_mismatch(<Self as ComType>::KIND, &other)),
                    }
                }
            }
        )*
    };
}

com_type! {
    bool => Bool,
    f64 => Double,
    i32 => Int,
    String => String,
    DVec2 => Vec2Dbl,
    IVec2 => Vec2Int,
}

/// Return types accepted from registered closures.
///
/// Every [`ComType`] qualifies, and so does `Result<T, ComError>` so that a
/// callee can reject its input with [`ComError::InvalidValue`]. Both forms
/// share the kind of `T`.
pub trait ComReturn: Send + 'static {
    const KIND: ParamKind;

    fn into_result(self) -> Result<Value, ComError>;
}

macro_rules! com_return {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ComReturn for $ty {
                const KIND: ParamKind = <$ty as ComType>::KIND;

                fn into_result(self) -> Result<Value, ComError> {
                    Ok(self.into_value())
                }
            }

            impl ComReturn for Result<$ty, ComError> {
                const KIND: ParamKind = <$ty as ComType>::KIND;

                fn into_result(self) -> Result<Value, ComError> {
                    self.map(ComType::into_value)
                }
            }
        )*
    };
}

com_return!((), bool, f64, i32, String, DVec2, IVec2);

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== PARSING ====================

    #[test]
    fn test_parse_scalars() {
        assert_eq!(ParamKind::Int.parse(&["5"]).unwrap(), Value::Int(5));
        assert_eq!(ParamKind::Double.parse(&["2.5"]).unwrap(), Value::Double(2.5));
        assert_eq!(ParamKind::Bool.parse(&["1"]).unwrap(), Value::Bool(true));
        assert_eq!(ParamKind::Bool.parse(&["false"]).unwrap(), Value::Bool(false));
        assert_eq!(
            ParamKind::String.parse(&["earth"]).unwrap(),
            Value::String("earth".into())
        );
    }

    #[test]
    fn test_parse_vectors_consume_two_tokens() {
        assert_eq!(
            ParamKind::Vec2Dbl.parse(&["1.5", "-2"]).unwrap(),
            Value::Vec2Dbl(DVec2::new(1.5, -2.0))
        );
        assert_eq!(
            ParamKind::Vec2Int.parse(&["3", "4"]).unwrap(),
            Value::Vec2Int(IVec2::new(3, 4))
        );
        assert!(ParamKind::Vec2Int.parse(&["3"]).is_err());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            ParamKind::Int.parse(&["five"]),
            Err(ComError::ParamError(_))
        ));
        assert!(matches!(
            ParamKind::Bool.parse(&["yes"]),
            Err(ComError::ParamError(_))
        ));
        assert!(ParamKind::Double.parse::<&str>(&[]).is_err());
    }

    // ==================== RENDERING ====================

    #[test]
    fn test_display() {
        assert_eq!(Value::Void.to_string(), "");
        assert_eq!(Value::Int(-7).to_string(), "-7");
        assert_eq!(Value::Double(0.5).to_string(), "0.5");
        assert_eq!(Value::Bool(true).to_string(), "true");
        assert_eq!(Value::Vec2Dbl(DVec2::new(1.0, 2.5)).to_string(), "1 2.5");
        assert_eq!(Value::Vec2Int(IVec2::new(1, 2)).to_string(), "1 2");
    }

    #[test]
    fn test_com_type_round_trip_rejects_other_kinds() {
        assert_eq!(i32::from_value(Value::Int(3)).unwrap(), 3);
        assert!(i32::from_value(Value::Double(3.0)).is_err());
        assert!(<()>::from_value(Value::Bool(false)).is_err());
    }

    #[test]
    fn test_result_return_keeps_kind_and_error() {
        assert_eq!(<Result<f64, ComError> as ComReturn>::KIND, ParamKind::Double);
        let err: Result<f64, ComError> = Err(ComError::invalid("negative"));
        assert_eq!(err.into_result(), Err(ComError::InvalidValue("negative".into())));
    }
}
