//! Arena storage for heap objects.
//!
//! Provides `ObjectId` (a dense, total-orderable identifier) and `Heap`
//! (contiguous object storage with free-list reuse, plus the class, symbol
//! and realm registries objects refer to).
//!
//! Object identity *is* the slot index: two values are the same object iff
//! they carry the same `ObjectId`. Back-references are plain ids, so cyclic
//! graphs need no reference counting and the cycle guard can track visited
//! pairs without extending any object's lifetime.
//!
//! # Determinism
//! - `ObjectId` ordering is by its inner `u32`.
//! - Iteration order over slots is by index.
//! - Free-list reuse is LIFO: the most recently released slot is reused first.

use crate::error::CongruenceError;
use crate::object::{
    Builtin, ClassId, ClassInfo, Constructor, FunctionInfo, Object, ObjectKind, OpaqueKind,
    Property, PropertyFlags, PropertyKey, RealmId, RegexPattern, TypedArray,
};
use crate::value::{same_value_zero_equal, SymbolId, Value};
use chrono::{DateTime, Utc};
use std::fmt;

/// Dense object identifier.
///
/// `ObjectId(u32)` is `Copy`, `Eq`, `Ord`, `Hash`. The inner value is an index
/// into the heap's slot array.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(u32);

impl ObjectId {
    /// Creates a new `ObjectId` from a raw `u32`.
    ///
    /// Ids not handed out by a heap resolve to nothing; comparing them is
    /// still total (they are treated as opaque).
    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw `u32` index.
    #[inline]
    pub const fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.0)
    }
}

/// Slot in the object arena.
#[derive(Debug, Clone)]
struct ObjectSlot {
    object: Option<Object>,
    next_free: Option<u32>, // index of next free slot, if any
}

/// Object arena plus the registries its objects refer to.
#[derive(Debug, Clone, Default)]
pub struct Heap {
    slots: Vec<ObjectSlot>,
    free_list_head: Option<u32>,
    /// Number of live objects (slots with `object.is_some()`).
    live_count: usize,
    classes: Vec<ClassInfo>,
    symbols: Vec<Option<String>>,
    /// Number of realms created besides the main one.
    extra_realms: u32,
}

impl Heap {
    /// Creates an empty heap with only the main realm.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `object` and returns its id.
    ///
    /// If a released slot is available, reuses it; otherwise pushes a new slot.
    pub fn allocate(&mut self, object: Object) -> ObjectId {
        self.live_count += 1;
        if let Some(idx) = self.free_list_head {
            let slot = &mut self.slots[idx as usize];
            debug_assert!(slot.object.is_none(), "free slot should be empty");
            self.free_list_head = slot.next_free;
            slot.object = Some(object);
            slot.next_free = None;
            ObjectId(idx)
        } else {
            let idx = self.slots.len() as u32;
            self.slots.push(ObjectSlot {
                object: Some(object),
                next_free: None,
            });
            ObjectId(idx)
        }
    }

    /// Releases the slot identified by `id`.
    ///
    /// Returns `true` if the slot held an object. Values still pointing at the
    /// slot dangle until it is reused.
    pub fn release(&mut self, id: ObjectId) -> bool {
        let idx = id.as_u32() as usize;
        let Some(slot) = self.slots.get_mut(idx) else {
            return false;
        };
        if slot.object.is_none() {
            return false; // already free
        }
        slot.object = None;
        slot.next_free = self.free_list_head;
        self.free_list_head = Some(idx as u32);
        self.live_count -= 1;
        true
    }

    /// Returns the object stored at `id`, if present.
    #[inline]
    pub fn get(&self, id: ObjectId) -> Option<&Object> {
        self.slots
            .get(id.as_u32() as usize)
            .and_then(|slot| slot.object.as_ref())
    }

    /// Returns a mutable reference to the object stored at `id`, if present.
    #[inline]
    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut Object> {
        self.slots
            .get_mut(id.as_u32() as usize)
            .and_then(|slot| slot.object.as_mut())
    }

    /// Resolves a value to the object it references.
    pub fn resolve(&self, value: &Value) -> Option<&Object> {
        value.as_object().and_then(|id| self.get(id))
    }

    /// Number of live objects.
    pub fn live_count(&self) -> usize {
        self.live_count
    }

    /// Total number of slots, including free ones.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Iterates over live objects in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &Object)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| slot.object.as_ref().map(|o| (ObjectId(idx as u32), o)))
    }

    // ------------------------------------------------------------------
    // Registries

    /// Creates a new realm whose builtins are distinct from the main realm's.
    pub fn new_realm(&mut self) -> RealmId {
        self.extra_realms += 1;
        RealmId::new(self.extra_realms)
    }

    /// Registers a class with the given prototype methods.
    pub fn define_class<I, S>(&mut self, name: &str, methods: I) -> ClassId
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let id = ClassId::new(self.classes.len() as u32);
        self.classes.push(ClassInfo {
            name: name.to_string(),
            methods: methods.into_iter().map(Into::into).collect(),
        });
        id
    }

    /// Looks up a registered class.
    pub fn class(&self, id: ClassId) -> Option<&ClassInfo> {
        self.classes.get(id.as_u32() as usize)
    }

    /// Allocates a fresh symbol.
    pub fn symbol(&mut self, description: Option<&str>) -> SymbolId {
        let id = SymbolId::new(self.symbols.len() as u32);
        self.symbols.push(description.map(str::to_string));
        id
    }

    /// Description a symbol was created with.
    pub fn symbol_description(&self, id: SymbolId) -> Option<&str> {
        self.symbols
            .get(id.as_u32() as usize)
            .and_then(|d| d.as_deref())
    }

    // ------------------------------------------------------------------
    // Builders

    fn alloc_value(&mut self, object: Object) -> Value {
        Value::Object(self.allocate(object))
    }

    /// A plain record (`{ k: v, ... }`).
    pub fn record<K, I>(&mut self, entries: I) -> Value
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<PropertyKey>,
    {
        let object = with_properties(
            Object::new(Constructor::builtin(Builtin::Object), ObjectKind::Ordinary),
            entries,
        );
        self.alloc_value(object)
    }

    /// A record with a null prototype (no constructor).
    pub fn null_prototype<K, I>(&mut self, entries: I) -> Value
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<PropertyKey>,
    {
        let object = with_properties(Object::new(Constructor::Null, ObjectKind::Ordinary), entries);
        self.alloc_value(object)
    }

    /// An instance of a user-defined class.
    pub fn instance<K, I>(&mut self, class: ClassId, entries: I) -> Value
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<PropertyKey>,
    {
        let object = with_properties(Object::new(Constructor::Class(class), ObjectKind::Ordinary), entries);
        self.alloc_value(object)
    }

    /// An array.
    pub fn array<I>(&mut self, items: I) -> Value
    where
        I: IntoIterator<Item = Value>,
    {
        let kind = ObjectKind::Array(items.into_iter().collect());
        self.alloc_value(Object::new(Constructor::builtin(Builtin::Array), kind))
    }

    /// An arguments object: index properties plus a hidden `length`.
    pub fn arguments<I>(&mut self, items: I) -> Value
    where
        I: IntoIterator<Item = Value>,
    {
        let mut object = Object::new(Constructor::builtin(Builtin::Object), ObjectKind::Arguments);
        let mut len = 0u32;
        for (idx, item) in items.into_iter().enumerate() {
            object
                .properties
                .insert(PropertyKey::String(idx.to_string()), Property::new(item));
            len += 1;
        }
        object.properties.insert(
            PropertyKey::from("length"),
            Property::with_flags(Value::from(len), PropertyFlags::HIDDEN),
        );
        self.alloc_value(object)
    }

    /// A typed array.
    pub fn typed_array(&mut self, data: TypedArray) -> Value {
        let constructor = Constructor::builtin(Builtin::TypedArray(data.element_type()));
        self.alloc_value(Object::new(constructor, ObjectKind::TypedArray(data)))
    }

    /// A date at `instant`.
    pub fn date(&mut self, instant: DateTime<Utc>) -> Value {
        self.alloc_value(Object::new(
            Constructor::builtin(Builtin::Date),
            ObjectKind::Date(Some(instant)),
        ))
    }

    /// A date from milliseconds since the Unix epoch; out-of-range
    /// timestamps produce an invalid date.
    pub fn date_millis(&mut self, millis: i64) -> Value {
        let instant = DateTime::<Utc>::from_timestamp_millis(millis);
        self.alloc_value(Object::new(Constructor::builtin(Builtin::Date), ObjectKind::Date(instant)))
    }

    /// An invalid date.
    pub fn invalid_date(&mut self) -> Value {
        self.alloc_value(Object::new(Constructor::builtin(Builtin::Date), ObjectKind::Date(None)))
    }

    /// A regular expression. Fails on unknown or repeated flags.
    pub fn regexp(&mut self, source: &str, flags: &str) -> Result<Value, CongruenceError> {
        let pattern = RegexPattern {
            source: source.to_string(),
            flags: flags.parse()?,
        };
        Ok(self.alloc_value(Object::new(
            Constructor::builtin(Builtin::RegExp),
            ObjectKind::RegExp(pattern),
        )))
    }

    /// A map. Later entries replace earlier ones with a SameValueZero key.
    pub fn map<I>(&mut self, entries: I) -> Value
    where
        I: IntoIterator<Item = (Value, Value)>,
    {
        let mut stored = Vec::new();
        for (key, value) in entries {
            insert_entry(&mut stored, key, value);
        }
        self.alloc_value(Object::new(Constructor::builtin(Builtin::Map), ObjectKind::Map(stored)))
    }

    /// A set. Members equal under SameValueZero are stored once.
    pub fn set<I>(&mut self, items: I) -> Value
    where
        I: IntoIterator<Item = Value>,
    {
        let mut stored = Vec::new();
        for item in items {
            insert_member(&mut stored, item);
        }
        self.alloc_value(Object::new(Constructor::builtin(Builtin::Set), ObjectKind::Set(stored)))
    }

    /// A boxed boolean, number, string or symbol.
    pub fn boxed(&mut self, primitive: Value) -> Result<Value, CongruenceError> {
        let builtin = match &primitive {
            Value::Bool(_) => Builtin::Boolean,
            Value::Number(_) => Builtin::Number,
            Value::String(_) => Builtin::String,
            Value::Symbol(_) => Builtin::Symbol,
            other => return Err(CongruenceError::NotBoxable(other.type_name())),
        };
        Ok(self.alloc_value(Object::new(
            Constructor::builtin(builtin),
            ObjectKind::Boxed(primitive),
        )))
    }

    /// A function object.
    pub fn function(&mut self, name: &str, arity: u32) -> Value {
        let info = FunctionInfo {
            name: name.to_string(),
            arity,
        };
        self.alloc_value(Object::new(
            Constructor::builtin(Builtin::Function),
            ObjectKind::Function(info),
        ))
    }

    /// A native promise.
    pub fn promise(&mut self) -> Value {
        self.alloc_value(Object::new(Constructor::builtin(Builtin::Promise), ObjectKind::Promise))
    }

    /// An instance of a builtin without structural equality.
    pub fn opaque(&mut self, kind: OpaqueKind) -> Value {
        self.alloc_value(Object::new(
            Constructor::builtin(Builtin::Other(kind)),
            ObjectKind::Opaque(kind),
        ))
    }

    // ------------------------------------------------------------------
    // Mutation

    fn target_mut(&mut self, target: &Value) -> Result<(ObjectId, &mut Object), CongruenceError> {
        let id = target
            .as_object()
            .ok_or(CongruenceError::NotAnObject(target.type_name()))?;
        let object = self.get_mut(id).ok_or(CongruenceError::DanglingObject(id))?;
        Ok((id, object))
    }

    /// Assigns an own property with default flags (`target[key] = value`).
    pub fn set_property(
        &mut self,
        target: &Value,
        key: impl Into<PropertyKey>,
        value: Value,
    ) -> Result<(), CongruenceError> {
        self.define_property(target, key, Property::new(value))
    }

    /// Defines an own property with explicit flags.
    pub fn define_property(
        &mut self,
        target: &Value,
        key: impl Into<PropertyKey>,
        property: Property,
    ) -> Result<(), CongruenceError> {
        let (_, object) = self.target_mut(target)?;
        object.properties.insert(key.into(), property);
        Ok(())
    }

    /// Appends to an array.
    pub fn push(&mut self, array: &Value, item: Value) -> Result<(), CongruenceError> {
        let (id, object) = self.target_mut(array)?;
        let ObjectKind::Array(items) = &mut object.kind else {
            return Err(CongruenceError::WrongKind {
                id,
                expected: "an array",
            });
        };
        items.push(item);
        Ok(())
    }

    /// Inserts or replaces a map entry (`map.set(key, value)`).
    pub fn map_insert(&mut self, map: &Value, key: Value, value: Value) -> Result<(), CongruenceError> {
        let (id, object) = self.target_mut(map)?;
        let ObjectKind::Map(entries) = &mut object.kind else {
            return Err(CongruenceError::WrongKind { id, expected: "a map" });
        };
        insert_entry(entries, key, value);
        Ok(())
    }

    /// Adds a set member (`set.add(item)`).
    pub fn set_add(&mut self, set: &Value, item: Value) -> Result<(), CongruenceError> {
        let (id, object) = self.target_mut(set)?;
        let ObjectKind::Set(members) = &mut object.kind else {
            return Err(CongruenceError::WrongKind { id, expected: "a set" });
        };
        insert_member(members, item);
        Ok(())
    }
}

fn with_properties<K, I>(mut object: Object, entries: I) -> Object
where
    I: IntoIterator<Item = (K, Value)>,
    K: Into<PropertyKey>,
{
    for (key, value) in entries {
        object.properties.insert(key.into(), Property::new(value));
    }
    object
}

fn insert_entry(entries: &mut Vec<(Value, Value)>, key: Value, value: Value) {
    match entries.iter_mut().find(|(k, _)| same_value_zero_equal(k, &key)) {
        Some(entry) => entry.1 = value,
        None => entries.push((key, value)),
    }
}

fn insert_member(members: &mut Vec<Value>, item: Value) {
    if !members.iter().any(|m| same_value_zero_equal(m, &item)) {
        members.push(item);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heap_basic() {
        let mut heap = Heap::new();
        assert_eq!(heap.live_count(), 0);

        let a = heap.record([("x", Value::from(1))]).as_object().unwrap();
        assert_eq!(a.as_u32(), 0);
        let b = heap.array([]).as_object().unwrap();
        assert_eq!(b.as_u32(), 1);
        assert_eq!(heap.live_count(), 2);

        assert!(heap.release(a));
        assert!(!heap.release(a));
        assert_eq!(heap.live_count(), 1);
        assert!(heap.get(a).is_none());

        let c = heap.array([Value::Null]).as_object().unwrap();
        assert_eq!(c, a); // reused freed slot
        assert_eq!(heap.capacity(), 2);
    }

    #[test]
    fn deterministic_iteration() {
        let mut heap = Heap::new();
        let ids: Vec<_> = (0..5)
            .map(|i| heap.array([Value::from(i)]).as_object().unwrap())
            .collect();
        heap.release(ids[1]);
        heap.release(ids[3]);
        // LIFO reuse: slot 3 first, then slot 1
        let reused_a = heap.array([]).as_object().unwrap();
        let reused_b = heap.array([]).as_object().unwrap();
        assert_eq!((reused_a.as_u32(), reused_b.as_u32()), (3, 1));
        let order: Vec<_> = heap.iter().map(|(id, _)| id.as_u32()).collect();
        assert_eq!(order, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn self_reference_through_set_property() {
        let mut heap = Heap::new();
        let a = heap.record::<&str, _>([]);
        heap.set_property(&a, "self", a.clone()).unwrap();
        assert_eq!(heap.resolve(&a).unwrap().get("self"), Some(&a));
    }

    #[test]
    fn map_and_set_dedupe_with_same_value_zero() {
        let mut heap = Heap::new();
        let map = heap.map([
            (Value::Number(0.0), Value::from("a")),
            (Value::Number(-0.0), Value::from("b")),
            (Value::Number(f64::NAN), Value::from("c")),
        ]);
        heap.map_insert(&map, Value::Number(f64::NAN), Value::from("d")).unwrap();
        let ObjectKind::Map(entries) = &heap.resolve(&map).unwrap().kind else {
            panic!("expected a map");
        };
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].1, Value::from("b"));
        assert_eq!(entries[1].1, Value::from("d"));

        let set = heap.set([Value::from(1), Value::from(1), Value::from("1")]);
        heap.set_add(&set, Value::from(1)).unwrap();
        let ObjectKind::Set(members) = &heap.resolve(&set).unwrap().kind else {
            panic!("expected a set");
        };
        assert_eq!(members.len(), 2);
    }

    #[test]
    fn mutation_errors() {
        let mut heap = Heap::new();
        let record = heap.record::<&str, _>([]);
        let id = record.as_object().unwrap();
        assert_eq!(
            heap.push(&record, Value::Null),
            Err(CongruenceError::WrongKind {
                id,
                expected: "an array"
            })
        );
        assert_eq!(
            heap.set_property(&Value::from(1), "x", Value::Null),
            Err(CongruenceError::NotAnObject("number"))
        );
        heap.release(id);
        assert_eq!(
            heap.set_property(&record, "x", Value::Null),
            Err(CongruenceError::DanglingObject(id))
        );
        assert_eq!(heap.boxed(Value::Null), Err(CongruenceError::NotBoxable("null")));
    }

    #[test]
    fn arguments_have_hidden_length() {
        let mut heap = Heap::new();
        let args = heap.arguments([Value::from("a"), Value::from("b")]);
        let object = heap.resolve(&args).unwrap();
        assert_eq!(object.enumerable_keys().count(), 2);
        assert_eq!(object.get("length"), Some(&Value::from(2)));
    }

    #[test]
    fn registries() {
        let mut heap = Heap::new();
        let class = heap.define_class("Deferred", ["then"]);
        assert!(heap.class(class).unwrap().has_method("then"));
        let sym = heap.symbol(Some("tag"));
        assert_eq!(heap.symbol_description(sym), Some("tag"));
        let realm = heap.new_realm();
        assert_ne!(realm, RealmId::MAIN);
        assert_ne!(heap.new_realm(), realm);
    }
}
