//! The closed table of supported function shapes.
//!
//! A [`SignatureTag`] names one (return kind, argument kinds) combination.
//! The whole table lives in the single `signatures!` invocation below: the
//! [`Shape`] it yields drives both text parsing and validation of captured
//! arguments before deferred replay, so supporting a new shape is one line.

use super::error::ComError;
use super::value::{ParamKind, Value};
use serde::{Serialize, Serializer};
use smallvec::SmallVec;
use std::fmt;

/// Argument list as stored in calls and queued commands.
pub type ArgValues = SmallVec<[Value; 4]>;

/// Return and argument kinds of a signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shape {
    pub ret: ParamKind,
    pub args: &'static [ParamKind],
}

macro_rules! signatures {
    ($( $tag:ident => $label:literal : $ret:ident ( $($arg:ident),* ) ),* $(,)?) => {
        /// Every function shape the registry can parse and replay.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum SignatureTag {
            $( $tag, )*
        }

        impl SignatureTag {
            pub const ALL: &'static [SignatureTag] = &[$( SignatureTag::$tag, )*];

            pub fn shape(self) -> Shape {
                match self {
                    $(
                        SignatureTag::$tag => Shape {
                            ret: ParamKind::$ret,
                            args: &[$( ParamKind::$arg ),*],
                        },
                    )*
                }
            }

            pub fn as_str(self) -> &'static str {
                match self {
                    $( SignatureTag::$tag => $label, )*
                }
            }
        }
    };
}

signatures! {
    Void => "NONE": Void(),
    VoidBool => "NONE_BOOL": Void(Bool),
    VoidDouble => "NONE_DOUBLE": Void(Double),
    VoidInt => "NONE_INT": Void(Int),
    VoidString => "NONE_STRING": Void(String),
    Void2Double => "NONE_2DOUBLE": Void(Double, Double),
    Void2Int => "NONE_2INT": Void(Int, Int),
    VoidIntDouble => "NONE_INT_DOUBLE": Void(Int, Double),
    VoidStringDouble => "NONE_STRING_DOUBLE": Void(String, Double),
    VoidStringInt => "NONE_STRING_INT": Void(String, Int),
    VoidStringString => "NONE_STRING_STRING": Void(String, String),
    VoidVec2Dbl => "NONE_VEC2DBL": Void(Vec2Dbl),
    VoidIntVec2Dbl => "NONE_INT_VEC2DBL": Void(Int, Vec2Dbl),
    Bool => "BOOL": Bool(),
    Double => "DOUBLE": Double(),
    Int => "INT": Int(),
    String => "STRING": String(),
    BoolInt => "BOOL_INT": Bool(Int),
    DoubleDouble => "DOUBLE_DOUBLE": Double(Double),
    DoubleInt => "DOUBLE_INT": Double(Int),
    DoubleString => "DOUBLE_STRING": Double(String),
    IntInt => "INT_INT": Int(Int),
    Int2Int => "INT_2INT": Int(Int, Int),
    IntString => "INT_STRING": Int(String),
    StringInt => "STRING_INT": String(Int),
    StringString => "STRING_STRING": String(String),
    Vec2Dbl => "VEC2DBL": Vec2Dbl(),
    Vec2DblInt => "VEC2DBL_INT": Vec2Dbl(Int),
    Vec2DblString => "VEC2DBL_STRING": Vec2Dbl(String),
    Vec2DblVec2DblInt => "VEC2DBL_VEC2DBL_INT": Vec2Dbl(Vec2Dbl, Int),
    Vec2DblVec2DblString => "VEC2DBL_VEC2DBL_STRING": Vec2Dbl(Vec2Dbl, String),
    Vec2Int => "VEC2INT": Vec2Int(),
    Vec2IntInt => "VEC2INT_INT": Vec2Int(Int),
}

impl SignatureTag {
    /// Looks up the tag for a return/argument combination.
    ///
    /// # Errors
    ///
    /// Returns [`ComError::UnsupportedSignature`] if the combination is not in
    /// the table.
    pub fn resolve(ret: ParamKind, args: &[ParamKind]) -> Result<Self, ComError> {
        Self::ALL
            .iter()
            .copied()
            .find(|tag| {
                let shape = tag.shape();
                shape.ret == ret && shape.args == args
            })
            .ok_or_else(|| ComError::UnsupportedSignature(describe(ret, args)))
    }
}

impl fmt::Display for SignatureTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for SignatureTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Human readable form of a shape, e.g. `<double>(<string>, <int>)`.
pub fn describe(ret: ParamKind, args: &[ParamKind]) -> String {
    let args: Vec<&str> = args.iter().map(|k| k.as_str()).collect();
    format!("{}({})", ret, args.join(", "))
}

impl Shape {
    /// Total number of command line tokens the arguments consume.
    pub fn token_count(&self) -> usize {
        self.args.iter().map(|k| k.token_count()).sum()
    }

    /// Parses the argument tokens of a command line (name excluded).
    pub fn parse<S: AsRef<str>>(&self, tokens: &[S]) -> Result<ArgValues, ComError> {
        let expected = self.token_count();
        if tokens.len() != expected {
            return Err(ComError::ParamError(format!(
                "expected {} argument token(s), got {}",
                expected,
                tokens.len()
            )));
        }
        let mut values = ArgValues::new();
        let mut offset = 0;
        for kind in self.args {
            let count = kind.token_count();
            values.push(kind.parse(&tokens[offset..offset + count])?);
            offset += count;
        }
        Ok(values)
    }

    /// Checks captured values against the argument kinds.
    pub fn check(&self, values: &[Value]) -> Result<(), ComError> {
        if values.len() != self.args.len() {
            return Err(ComError::ParamError(format!(
                "expected {} argument(s), got {}",
                self.args.len(),
                values.len()
            )));
        }
        for (kind, value) in self.args.iter().zip(values) {
            if *kind != value.kind() {
                return Err(ComError::ParamError(format!(
                    "expected {}, got {}",
                    kind,
                    value.kind()
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec2;

    #[test]
    fn test_labels_are_unique() {
        let mut labels: Vec<&str> = SignatureTag::ALL.iter().map(|t| t.as_str()).collect();
        labels.sort();
        labels.dedup();
        assert_eq!(labels.len(), SignatureTag::ALL.len());
    }

    #[test]
    fn test_shapes_are_unique() {
        for (i, a) in SignatureTag::ALL.iter().enumerate() {
            for b in &SignatureTag::ALL[i + 1..] {
                assert_ne!(a.shape(), b.shape(), "{} and {} share a shape", a, b);
            }
        }
    }

    #[test]
    fn test_resolve() {
        assert_eq!(
            SignatureTag::resolve(ParamKind::Void, &[ParamKind::Int]).unwrap(),
            SignatureTag::VoidInt
        );
        assert_eq!(
            SignatureTag::resolve(ParamKind::Double, &[ParamKind::String]).unwrap(),
            SignatureTag::DoubleString
        );
        assert_eq!(
            SignatureTag::resolve(ParamKind::Int, &[ParamKind::Int, ParamKind::Int]).unwrap(),
            SignatureTag::Int2Int
        );
        assert!(matches!(
            SignatureTag::resolve(ParamKind::Bool, &[ParamKind::Bool, ParamKind::Bool]),
            Err(ComError::UnsupportedSignature(_))
        ));
    }

    #[test]
    fn test_transform_shapes_are_supported() {
        let tag = SignatureTag::resolve(ParamKind::Double, &[ParamKind::Double]).unwrap();
        assert_eq!(tag.as_str(), "DOUBLE_DOUBLE");
        let tag = SignatureTag::resolve(ParamKind::Int, &[ParamKind::Int]).unwrap();
        assert_eq!(tag.as_str(), "INT_INT");
        let tag = SignatureTag::resolve(ParamKind::Vec2Dbl, &[ParamKind::Vec2Dbl, ParamKind::String]).unwrap();
        assert_eq!(tag, SignatureTag::Vec2DblVec2DblString);
        let values = SignatureTag::Vec2DblVec2DblInt.shape().parse(&["1", "2", "3"]).unwrap();
        assert_eq!(
            values.as_slice(),
            &[Value::Vec2Dbl(DVec2::new(1.0, 2.0)), Value::Int(3)]
        );
    }

    #[test]
    fn test_parse_two_doubles() {
        let values = SignatureTag::Void2Double.shape().parse(&["1", "2.5"]).unwrap();
        assert_eq!(values.as_slice(), &[Value::Double(1.0), Value::Double(2.5)]);
    }

    #[test]
    fn test_parse_mixed_with_vector() {
        let values = SignatureTag::VoidIntVec2Dbl
            .shape()
            .parse(&["3", "0.5", "-1"])
            .unwrap();
        assert_eq!(
            values.as_slice(),
            &[Value::Int(3), Value::Vec2Dbl(DVec2::new(0.5, -1.0))]
        );
    }

    #[test]
    fn test_parse_wrong_count() {
        let shape = SignatureTag::VoidInt.shape();
        assert!(matches!(shape.parse::<&str>(&[]), Err(ComError::ParamError(_))));
        assert!(matches!(shape.parse(&["1", "2"]), Err(ComError::ParamError(_))));
    }

    #[test]
    fn test_check() {
        let shape = SignatureTag::VoidStringDouble.shape();
        assert!(shape
            .check(&[Value::String("a".into()), Value::Double(1.0)])
            .is_ok());
        assert!(shape.check(&[Value::String("a".into())]).is_err());
        assert!(shape
            .check(&[Value::Double(1.0), Value::String("a".into())])
            .is_err());
    }
}
