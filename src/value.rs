//! Dynamic values compared by the engine.
//!
//! A [`Value`] is either a primitive or a handle to an object stored in a
//! [`Heap`](crate::heap::Heap). Handles are plain slot indices, so a value
//! graph may refer back to itself without any reference counting.
//!
//! # Identity
//! `PartialEq` on `Value` is *identity* (`===`), not structural equality:
//! - numbers compare with IEEE equality (`0 == -0`, `NaN != NaN`);
//! - strings compare by content;
//! - objects compare by [`ObjectId`].
//!
//! Structural equality is the job of [`IsEqual`](crate::engine::IsEqual).
//!
//! # References
//! - ECMAScript 2024, §7.2.10 SameValue, §7.2.11 SameValueZero, §7.2.15 IsStrictlyEqual

use crate::heap::ObjectId;
use std::fmt;

/// Identifier of a symbol allocated by a heap.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SymbolId(u32);

impl SymbolId {
    /// Creates a `SymbolId` from a raw `u32`.
    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw `u32`.
    #[inline]
    pub const fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SymbolId({})", self.0)
    }
}

/// A dynamic value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// The absent value.
    Undefined,
    /// The null value.
    Null,
    /// A boolean.
    Bool(bool),
    /// A double-precision number.
    Number(f64),
    /// A string.
    String(String),
    /// A unique symbol.
    Symbol(SymbolId),
    /// A reference to a heap object.
    Object(ObjectId),
}

impl Value {
    /// Returns `true` for `Undefined` and `Null`.
    #[inline]
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    /// Returns `true` if this value is the number NaN.
    #[inline]
    pub fn is_nan(&self) -> bool {
        matches!(self, Value::Number(n) if n.is_nan())
    }

    /// Returns `true` for everything except object handles.
    #[inline]
    pub fn is_primitive(&self) -> bool {
        !matches!(self, Value::Object(_))
    }

    /// Returns the object handle, if this value is one.
    #[inline]
    pub fn as_object(&self) -> Option<ObjectId> {
        match self {
            Value::Object(id) => Some(*id),
            _ => None,
        }
    }

    /// Name of the value's primitive type, as `typeof` would report it
    /// (objects report `"object"` regardless of callability).
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Symbol(_) => "symbol",
            Value::Object(_) => "object",
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(f64::from(value))
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Number(f64::from(value))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<ObjectId> for Value {
    fn from(value: ObjectId) -> Self {
        Value::Object(value)
    }
}

impl From<SymbolId> for Value {
    fn from(value: SymbolId) -> Self {
        Value::Symbol(value)
    }
}

/// SameValueZero: identity, except that NaN equals NaN.
///
/// `0` and `-0` are equal. This is the comparison used for boxed primitives,
/// dates, map-key deduplication and the shallow presets.
#[inline]
pub fn same_value_zero_equal(a: &Value, b: &Value) -> bool {
    a == b || (a.is_nan() && b.is_nan())
}

/// SameValue (`Object.is`): like SameValueZero, but `0` and `-0` differ.
pub fn same_value_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            if x.is_nan() && y.is_nan() {
                true
            } else {
                x == y && x.is_sign_negative() == y.is_sign_negative()
            }
        }
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_is_ieee_for_numbers() {
        assert_eq!(Value::Number(0.0), Value::Number(-0.0));
        assert_ne!(Value::Number(f64::NAN), Value::Number(f64::NAN));
        assert_eq!(Value::from("a"), Value::String("a".into()));
        assert_ne!(Value::Object(ObjectId::new(2)), Value::Object(ObjectId::new(3)));
    }

    #[test]
    fn same_value_zero() {
        assert!(same_value_zero_equal(&Value::Number(f64::NAN), &Value::Number(f64::NAN)));
        assert!(same_value_zero_equal(&Value::Number(0.0), &Value::Number(-0.0)));
        assert!(!same_value_zero_equal(&Value::Null, &Value::Undefined));
    }

    #[test]
    fn same_value_distinguishes_signed_zero() {
        assert!(same_value_equal(&Value::Number(f64::NAN), &Value::Number(f64::NAN)));
        assert!(!same_value_equal(&Value::Number(0.0), &Value::Number(-0.0)));
        assert!(same_value_equal(&Value::Number(-0.0), &Value::Number(-0.0)));
        assert!(same_value_equal(&Value::from(true), &Value::from(true)));
    }
}
