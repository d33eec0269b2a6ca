//! Type classification for comparator dispatch.
//!
//! `classify` inspects a pair of values and either decides the pair outright
//! or names the comparison category whose comparator must decide it. The
//! checks run in a fixed order, cheapest and most common first:
//!
//! 1. identical values are equal;
//! 2. if either side is not a composite object, the pair is equal only when
//!    both are NaN;
//! 3. constructors must match;
//! 4. main-realm constructor fast paths: plain record, array, typed array,
//!    date, regexp, map, set;
//! 5. intrinsic-tag fallback for foreign realms and subclasses, including
//!    the thenable exclusion for generic objects;
//! 6. everything else is opaque and unequal.

use crate::heap::{Heap, ObjectId};
use crate::object::{Builtin, Constructor, IntrinsicTag, Object, ObjectKind};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::trace;

/// Comparison category of a value pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeTag {
    Primitive,
    PlainRecord,
    Sequence,
    TypedBuffer,
    DateTime,
    Pattern,
    Mapping,
    SetCollection,
    BoxedPrimitive,
    ArgumentsLike,
    Opaque,
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TypeTag::Primitive => "primitive",
            TypeTag::PlainRecord => "plain record",
            TypeTag::Sequence => "sequence",
            TypeTag::TypedBuffer => "typed buffer",
            TypeTag::DateTime => "date/time",
            TypeTag::Pattern => "pattern",
            TypeTag::Mapping => "mapping",
            TypeTag::SetCollection => "set",
            TypeTag::BoxedPrimitive => "boxed primitive",
            TypeTag::ArgumentsLike => "arguments",
            TypeTag::Opaque => "opaque",
        };
        f.write_str(name)
    }
}

/// Outcome of classifying a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Same primitive or same object.
    Identical,
    /// At least one side is primitive (or callable); `equal` is the NaN rule.
    Primitive { equal: bool },
    /// Both are objects with different constructors.
    ConstructorMismatch,
    /// The comparator registered for `tag` decides.
    Compare { tag: TypeTag, a: ObjectId, b: ObjectId },
    /// A generic object exposing a callable `then`.
    Thenable,
    /// No structural equality is defined.
    Opaque,
}

impl Classification {
    /// The verdict, when no comparator is needed.
    pub fn verdict(&self) -> Option<bool> {
        match self {
            Classification::Identical => Some(true),
            Classification::Primitive { equal } => Some(*equal),
            Classification::ConstructorMismatch
            | Classification::Thenable
            | Classification::Opaque => Some(false),
            Classification::Compare { .. } => None,
        }
    }

    /// The category of the pair, where one applies.
    pub fn tag(&self) -> Option<TypeTag> {
        match self {
            Classification::Primitive { .. } => Some(TypeTag::Primitive),
            Classification::Compare { tag, .. } => Some(*tag),
            Classification::Thenable | Classification::Opaque => Some(TypeTag::Opaque),
            Classification::Identical | Classification::ConstructorMismatch => None,
        }
    }
}

/// Resolves a value to a composite object: present in the heap and not callable.
fn composite<'h>(heap: &'h Heap, value: &Value) -> Option<(ObjectId, &'h Object)> {
    let id = value.as_object()?;
    let object = heap.get(id)?;
    (!object.is_callable()).then_some((id, object))
}

/// Returns `true` if `object` exposes a callable `then`, either as an own
/// property or as a method of its class.
pub fn is_thenable(heap: &Heap, object: &Object) -> bool {
    if let Some(then) = object.get("then") {
        return heap.resolve(then).is_some_and(Object::is_callable);
    }
    match object.constructor {
        Constructor::Class(class) => {
            heap.class(class).is_some_and(|info| info.has_method("then"))
        }
        _ => false,
    }
}

/// Classifies the pair `(a, b)`.
pub fn classify(heap: &Heap, a: &Value, b: &Value) -> Classification {
    if a == b {
        return Classification::Identical;
    }

    let (Some((id_a, obj_a)), Some((id_b, obj_b))) = (composite(heap, a), composite(heap, b)) else {
        return Classification::Primitive {
            equal: a.is_nan() && b.is_nan(),
        };
    };

    if obj_a.constructor != obj_b.constructor {
        return Classification::ConstructorMismatch;
    }

    let compare = |tag| Classification::Compare { tag, a: id_a, b: id_b };
    let constructor = obj_a.constructor;

    if constructor.is_main(Builtin::Object) {
        return compare(TypeTag::PlainRecord);
    }
    // Arrays and typed arrays are recognized by their slots across realms and
    // subclasses alike.
    if matches!(obj_a.kind, ObjectKind::Array(_)) {
        return compare(TypeTag::Sequence);
    }
    if matches!(obj_a.kind, ObjectKind::TypedArray(_)) {
        return compare(TypeTag::TypedBuffer);
    }
    if constructor.is_main(Builtin::Date) {
        return compare(TypeTag::DateTime);
    }
    if constructor.is_main(Builtin::RegExp) {
        return compare(TypeTag::Pattern);
    }
    if constructor.is_main(Builtin::Map) {
        return compare(TypeTag::Mapping);
    }
    if constructor.is_main(Builtin::Set) {
        return compare(TypeTag::SetCollection);
    }

    let tag = obj_a.tag();
    trace!(%tag, "classifying by intrinsic tag");
    match tag {
        IntrinsicTag::Date => compare(TypeTag::DateTime),
        IntrinsicTag::RegExp => compare(TypeTag::Pattern),
        IntrinsicTag::Map => compare(TypeTag::Mapping),
        IntrinsicTag::Set => compare(TypeTag::SetCollection),
        IntrinsicTag::Object => {
            if is_thenable(heap, obj_a) || is_thenable(heap, obj_b) {
                trace!("thenable excluded from structural equality");
                Classification::Thenable
            } else {
                compare(TypeTag::PlainRecord)
            }
        }
        IntrinsicTag::Arguments => compare(TypeTag::ArgumentsLike),
        IntrinsicTag::Boolean | IntrinsicTag::Number | IntrinsicTag::String => {
            compare(TypeTag::BoxedPrimitive)
        }
        _ => Classification::Opaque,
    }
}
