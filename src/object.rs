//! Heap objects: constructors, intrinsic kinds and own properties.
//!
//! An [`Object`] carries three independent pieces of information, mirroring
//! how a dynamic runtime describes a value:
//! - its **constructor**, which the classifier compares first to reject
//!   class-vs-subclass and instance-vs-plain-record pairs;
//! - its **kind** (intrinsic slots), which is the source of the intrinsic
//!   type tag and holds the category-specific payload (elements, entries,
//!   timestamp, pattern, ...);
//! - its **own properties**, keyed by string or symbol, each carrying
//!   enumerable/writable/configurable flags.
//!
//! Constructors are realm-qualified. Objects from a realm other than
//! [`RealmId::MAIN`] never hit the constructor fast path and are classified by
//! their intrinsic tag instead.

use crate::error::CongruenceError;
use crate::value::{SymbolId, Value};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Identifier of an isolation boundary (a set of builtin constructors).
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RealmId(u32);

impl RealmId {
    /// The realm every heap starts with.
    pub const MAIN: RealmId = RealmId(0);

    /// Creates a `RealmId` from a raw `u32`.
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

/// Identifier of a user-defined class registered on a heap.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClassId(u32);

impl ClassId {
    /// Creates a `ClassId` from a raw `u32`.
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

/// A user-defined class: a name and the methods on its prototype.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClassInfo {
    /// Class name.
    pub name: String,
    /// Names of prototype methods (visible on every instance).
    pub methods: Vec<String>,
}

impl ClassInfo {
    /// Returns `true` if instances inherit a method called `name`.
    pub fn has_method(&self, name: &str) -> bool {
        self.methods.iter().any(|m| m == name)
    }
}

/// Element type of a typed array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ElementType {
    Int8,
    Uint8,
    Uint8Clamped,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Float32,
    Float64,
    BigInt64,
    BigUint64,
}

impl ElementType {
    /// Width of one element in bytes.
    pub const fn width(&self) -> usize {
        match self {
            ElementType::Int8 | ElementType::Uint8 | ElementType::Uint8Clamped => 1,
            ElementType::Int16 | ElementType::Uint16 => 2,
            ElementType::Int32 | ElementType::Uint32 | ElementType::Float32 => 4,
            ElementType::Float64 | ElementType::BigInt64 | ElementType::BigUint64 => 8,
        }
    }
}

/// Builtins whose instances cannot be introspected or have no agreed
/// structural equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OpaqueKind {
    WeakMap,
    WeakSet,
    WeakRef,
    Error,
    ArrayBuffer,
    DataView,
}

/// Builtin constructors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Builtin {
    Object,
    Array,
    Date,
    RegExp,
    Map,
    Set,
    Boolean,
    Number,
    String,
    Symbol,
    Function,
    Promise,
    TypedArray(ElementType),
    Other(OpaqueKind),
}

/// The constructor an object reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Constructor {
    /// A builtin constructor of a given realm.
    Builtin {
        /// Realm the constructor belongs to.
        realm: RealmId,
        /// Which builtin.
        builtin: Builtin,
    },
    /// A user-defined class.
    Class(ClassId),
    /// No constructor (null prototype).
    Null,
}

impl Constructor {
    /// A builtin constructor of the main realm.
    #[inline]
    pub const fn builtin(builtin: Builtin) -> Self {
        Constructor::Builtin {
            realm: RealmId::MAIN,
            builtin,
        }
    }

    /// A builtin constructor of `realm`.
    #[inline]
    pub const fn builtin_in(realm: RealmId, builtin: Builtin) -> Self {
        Constructor::Builtin { realm, builtin }
    }

    /// Returns `true` if this is `builtin` from the main realm.
    #[inline]
    pub fn is_main(&self, builtin: Builtin) -> bool {
        *self == Constructor::builtin(builtin)
    }
}

/// Typed array storage, one variant per element type.
///
/// Element comparison is `===` on the element values, so float arrays
/// holding NaN are never equal and `0.0` equals `-0.0`.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedArray {
    Int8(Vec<i8>),
    Uint8(Vec<u8>),
    Uint8Clamped(Vec<u8>),
    Int16(Vec<i16>),
    Uint16(Vec<u16>),
    Int32(Vec<i32>),
    Uint32(Vec<u32>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
    BigInt64(Vec<i64>),
    BigUint64(Vec<u64>),
}

macro_rules! decode_elements {
    ($bytes:expr, $ty:ty) => {
        $bytes
            .chunks_exact(std::mem::size_of::<$ty>())
            .map(|chunk| {
                let mut raw = [0u8; std::mem::size_of::<$ty>()];
                raw.copy_from_slice(chunk);
                <$ty>::from_le_bytes(raw)
            })
            .collect()
    };
}

impl TypedArray {
    /// Views a little-endian byte buffer as elements of `element`.
    pub fn from_le_bytes(element: ElementType, bytes: &[u8]) -> Result<Self, CongruenceError> {
        if bytes.len() % element.width() != 0 {
            return Err(CongruenceError::MisalignedBuffer {
                element,
                len: bytes.len(),
            });
        }
        Ok(match element {
            ElementType::Int8 => TypedArray::Int8(decode_elements!(bytes, i8)),
            ElementType::Uint8 => TypedArray::Uint8(bytes.to_vec()),
            ElementType::Uint8Clamped => TypedArray::Uint8Clamped(bytes.to_vec()),
            ElementType::Int16 => TypedArray::Int16(decode_elements!(bytes, i16)),
            ElementType::Uint16 => TypedArray::Uint16(decode_elements!(bytes, u16)),
            ElementType::Int32 => TypedArray::Int32(decode_elements!(bytes, i32)),
            ElementType::Uint32 => TypedArray::Uint32(decode_elements!(bytes, u32)),
            ElementType::Float32 => TypedArray::Float32(decode_elements!(bytes, f32)),
            ElementType::Float64 => TypedArray::Float64(decode_elements!(bytes, f64)),
            ElementType::BigInt64 => TypedArray::BigInt64(decode_elements!(bytes, i64)),
            ElementType::BigUint64 => TypedArray::BigUint64(decode_elements!(bytes, u64)),
        })
    }

    /// Element type of this array.
    pub fn element_type(&self) -> ElementType {
        match self {
            TypedArray::Int8(_) => ElementType::Int8,
            TypedArray::Uint8(_) => ElementType::Uint8,
            TypedArray::Uint8Clamped(_) => ElementType::Uint8Clamped,
            TypedArray::Int16(_) => ElementType::Int16,
            TypedArray::Uint16(_) => ElementType::Uint16,
            TypedArray::Int32(_) => ElementType::Int32,
            TypedArray::Uint32(_) => ElementType::Uint32,
            TypedArray::Float32(_) => ElementType::Float32,
            TypedArray::Float64(_) => ElementType::Float64,
            TypedArray::BigInt64(_) => ElementType::BigInt64,
            TypedArray::BigUint64(_) => ElementType::BigUint64,
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        match self {
            TypedArray::Int8(v) => v.len(),
            TypedArray::Uint8(v) | TypedArray::Uint8Clamped(v) => v.len(),
            TypedArray::Int16(v) => v.len(),
            TypedArray::Uint16(v) => v.len(),
            TypedArray::Int32(v) => v.len(),
            TypedArray::Uint32(v) => v.len(),
            TypedArray::Float32(v) => v.len(),
            TypedArray::Float64(v) => v.len(),
            TypedArray::BigInt64(v) => v.len(),
            TypedArray::BigUint64(v) => v.len(),
        }
    }

    /// Returns `true` if the array has no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Flags of a regular expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RegexFlags {
    pub has_indices: bool,
    pub global: bool,
    pub ignore_case: bool,
    pub multiline: bool,
    pub dot_all: bool,
    pub unicode: bool,
    pub unicode_sets: bool,
    pub sticky: bool,
}

impl FromStr for RegexFlags {
    type Err = CongruenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut flags = RegexFlags::default();
        for c in s.chars() {
            let slot = match c {
                'd' => &mut flags.has_indices,
                'g' => &mut flags.global,
                'i' => &mut flags.ignore_case,
                'm' => &mut flags.multiline,
                's' => &mut flags.dot_all,
                'u' => &mut flags.unicode,
                'v' => &mut flags.unicode_sets,
                'y' => &mut flags.sticky,
                other => return Err(CongruenceError::InvalidRegexFlag(other)),
            };
            if *slot {
                return Err(CongruenceError::DuplicateRegexFlag(c));
            }
            *slot = true;
        }
        Ok(flags)
    }
}

impl fmt::Display for RegexFlags {
    /// Canonical flag order, as the `flags` accessor reports it.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ordered = [
            (self.has_indices, 'd'),
            (self.global, 'g'),
            (self.ignore_case, 'i'),
            (self.multiline, 'm'),
            (self.dot_all, 's'),
            (self.unicode, 'u'),
            (self.unicode_sets, 'v'),
            (self.sticky, 'y'),
        ];
        for (set, c) in ordered {
            if set {
                write!(f, "{c}")?;
            }
        }
        Ok(())
    }
}

/// Source text and flags of a regular expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RegexPattern {
    pub source: String,
    pub flags: RegexFlags,
}

/// Name and declared arity of a function object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct FunctionInfo {
    pub name: String,
    pub arity: u32,
}

/// Intrinsic slots of an object.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectKind {
    /// No intrinsic slots (plain records, class instances).
    Ordinary,
    /// An arguments object; its values are index properties.
    Arguments,
    Array(Vec<Value>),
    TypedArray(TypedArray),
    /// A date; `None` is an invalid date.
    Date(Option<DateTime<Utc>>),
    RegExp(RegexPattern),
    /// Map entries in insertion order.
    Map(Vec<(Value, Value)>),
    /// Set members in insertion order.
    Set(Vec<Value>),
    /// A boxed primitive.
    Boxed(Value),
    Function(FunctionInfo),
    Promise,
    Opaque(OpaqueKind),
}

/// Intrinsic type tag, the `[object X]` string of an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntrinsicTag {
    Object,
    Arguments,
    Array,
    TypedArray(ElementType),
    Date,
    RegExp,
    Map,
    Set,
    Boolean,
    Number,
    String,
    Symbol,
    Function,
    Promise,
    Other(OpaqueKind),
}

impl fmt::Display for IntrinsicTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntrinsicTag::TypedArray(element) => write!(f, "[object {element:?}Array]"),
            IntrinsicTag::Other(kind) => write!(f, "[object {kind:?}]"),
            other => write!(f, "[object {other:?}]"),
        }
    }
}

impl ObjectKind {
    /// Intrinsic tag derived from the slots.
    pub fn tag(&self) -> IntrinsicTag {
        match self {
            ObjectKind::Ordinary => IntrinsicTag::Object,
            ObjectKind::Arguments => IntrinsicTag::Arguments,
            ObjectKind::Array(_) => IntrinsicTag::Array,
            ObjectKind::TypedArray(data) => IntrinsicTag::TypedArray(data.element_type()),
            ObjectKind::Date(_) => IntrinsicTag::Date,
            ObjectKind::RegExp(_) => IntrinsicTag::RegExp,
            ObjectKind::Map(_) => IntrinsicTag::Map,
            ObjectKind::Set(_) => IntrinsicTag::Set,
            ObjectKind::Boxed(Value::Bool(_)) => IntrinsicTag::Boolean,
            ObjectKind::Boxed(Value::Number(_)) => IntrinsicTag::Number,
            ObjectKind::Boxed(Value::String(_)) => IntrinsicTag::String,
            ObjectKind::Boxed(Value::Symbol(_)) => IntrinsicTag::Symbol,
            ObjectKind::Boxed(_) => IntrinsicTag::Object,
            ObjectKind::Function(_) => IntrinsicTag::Function,
            ObjectKind::Promise => IntrinsicTag::Promise,
            ObjectKind::Opaque(kind) => IntrinsicTag::Other(*kind),
        }
    }
}

/// Key of an own property.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PropertyKey {
    String(String),
    Symbol(SymbolId),
}

impl From<&str> for PropertyKey {
    fn from(key: &str) -> Self {
        PropertyKey::String(key.to_string())
    }
}

impl From<String> for PropertyKey {
    fn from(key: String) -> Self {
        PropertyKey::String(key)
    }
}

impl From<SymbolId> for PropertyKey {
    fn from(key: SymbolId) -> Self {
        PropertyKey::Symbol(key)
    }
}

/// Attribute flags of a data property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PropertyFlags {
    pub enumerable: bool,
    pub writable: bool,
    pub configurable: bool,
}

impl PropertyFlags {
    /// Flags of a property created by plain assignment.
    pub const DEFAULT: PropertyFlags = PropertyFlags {
        enumerable: true,
        writable: true,
        configurable: true,
    };

    /// Flags of a hidden property (e.g. `length` of an arguments object).
    pub const HIDDEN: PropertyFlags = PropertyFlags {
        enumerable: false,
        writable: true,
        configurable: true,
    };
}

impl Default for PropertyFlags {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// An own data property.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub value: Value,
    pub flags: PropertyFlags,
}

impl Property {
    /// A property with default (assignment) flags.
    pub fn new(value: Value) -> Self {
        Self {
            value,
            flags: PropertyFlags::DEFAULT,
        }
    }

    /// A property with explicit flags.
    pub fn with_flags(value: Value, flags: PropertyFlags) -> Self {
        Self { value, flags }
    }
}

/// A heap object.
#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    /// Constructor reported by the object.
    pub constructor: Constructor,
    /// Intrinsic slots.
    pub kind: ObjectKind,
    /// Own properties.
    pub properties: BTreeMap<PropertyKey, Property>,
}

impl Object {
    /// Creates an object with no own properties.
    pub fn new(constructor: Constructor, kind: ObjectKind) -> Self {
        Self {
            constructor,
            kind,
            properties: BTreeMap::new(),
        }
    }

    /// Builder-style helper adding an own property with default flags.
    pub fn with_property(mut self, key: impl Into<PropertyKey>, value: Value) -> Self {
        self.properties.insert(key.into(), Property::new(value));
        self
    }

    /// Value of the own string-keyed property `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.properties
            .get(&PropertyKey::String(key.to_string()))
            .map(|p| &p.value)
    }

    /// Own property by key.
    #[inline]
    pub fn own_property(&self, key: &PropertyKey) -> Option<&Property> {
        self.properties.get(key)
    }

    /// Enumerable own string keys (what `Object.keys` reports).
    pub fn enumerable_keys(&self) -> impl Iterator<Item = &PropertyKey> {
        self.properties
            .iter()
            .filter(|(key, prop)| matches!(key, PropertyKey::String(_)) && prop.flags.enumerable)
            .map(|(key, _)| key)
    }

    /// All own keys, string and symbol, enumerable or not.
    pub fn own_keys(&self) -> impl Iterator<Item = &PropertyKey> {
        self.properties.keys()
    }

    /// Returns `true` for function objects.
    #[inline]
    pub fn is_callable(&self) -> bool {
        matches!(self.kind, ObjectKind::Function(_))
    }

    /// Intrinsic tag of the object.
    #[inline]
    pub fn tag(&self) -> IntrinsicTag {
        self.kind.tag()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regex_flags_parse_and_canonicalize() {
        let flags: RegexFlags = "yig".parse().unwrap();
        assert!(flags.global && flags.ignore_case && flags.sticky);
        assert_eq!(flags.to_string(), "giy");
        assert_eq!("gig".parse::<RegexFlags>(), Err(CongruenceError::DuplicateRegexFlag('g')));
        assert_eq!("gx".parse::<RegexFlags>(), Err(CongruenceError::InvalidRegexFlag('x')));
    }

    #[test]
    fn typed_array_from_bytes() {
        let bytes = [1u8, 0, 2, 0];
        let u16s = TypedArray::from_le_bytes(ElementType::Uint16, &bytes).unwrap();
        assert_eq!(u16s, TypedArray::Uint16(vec![1, 2]));
        let i8s = TypedArray::from_le_bytes(ElementType::Int8, &bytes).unwrap();
        assert_eq!(i8s.len(), 4);
        assert_eq!(
            TypedArray::from_le_bytes(ElementType::Float64, &bytes),
            Err(CongruenceError::MisalignedBuffer {
                element: ElementType::Float64,
                len: 4
            })
        );
    }

    #[test]
    fn intrinsic_tags() {
        assert_eq!(ObjectKind::Ordinary.tag().to_string(), "[object Object]");
        assert_eq!(ObjectKind::Boxed(Value::from(1)).tag(), IntrinsicTag::Number);
        assert_eq!(
            ObjectKind::TypedArray(TypedArray::Int16(vec![])).tag().to_string(),
            "[object Int16Array]"
        );
        assert_eq!(
            ObjectKind::Opaque(OpaqueKind::WeakMap).tag().to_string(),
            "[object WeakMap]"
        );
    }

    #[test]
    fn enumerable_keys_skip_hidden_and_symbols() {
        let mut object = Object::new(Constructor::builtin(Builtin::Object), ObjectKind::Ordinary)
            .with_property("a", Value::from(1))
            .with_property(SymbolId::new(0), Value::from(2));
        object.properties.insert(
            PropertyKey::from("hidden"),
            Property::with_flags(Value::from(3), PropertyFlags::HIDDEN),
        );
        let keys: Vec<_> = object.enumerable_keys().collect();
        assert_eq!(keys, vec![&PropertyKey::from("a")]);
        assert_eq!(object.own_keys().count(), 3);
    }
}
