//! Change operand values.

use crate::element::{Parameter, TypeRef};

/// A value that can appear as the before/after operand of a field change.
///
/// This is a closed union: every field that can change on any element has
/// one of these shapes. The variant carries its own tag through the codecs,
/// so decoding never needs external type information.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Boolean flag (e.g. `CanLoad`).
    Bool(bool),
    /// Integer value (e.g. an enum item's underlying value).
    Int(i64),
    /// Plain string (names, categories, security contexts).
    String(String),
    /// Type reference (value types, return types).
    Type(TypeRef),
    /// Tag list.
    Tags(Vec<String>),
    /// Parameter list (function/event/callback signatures).
    Parameters(Vec<Parameter>),
}

impl Value {
    /// Returns the string payload, if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}
