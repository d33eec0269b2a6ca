//! Engine configuration.
//!
//! [`EqualityOptions`] carries the three switches an engine is built from and
//! is serde-friendly so it can live in a host's config file. From it,
//! [`build_comparator_set`] derives the per-category comparator table:
//!
//! 1. start from the loose or strict defaults;
//! 2. let an optional customizer replace any entry;
//! 3. wrap the recursive categories with the cycle guard when `circular`.
//!
//! The guard goes on last, so a caller override for records, sequences,
//! maps or sets is cycle-safe on a circular engine.

use crate::classify::TypeTag;
use crate::comparators::{
    are_dates_equal, are_maps_equal, are_primitive_wrappers_equal, are_records_equal,
    are_records_equal_strict, are_regexps_equal, are_sequences_equal, are_sets_equal,
    are_typed_arrays_equal, are_typed_arrays_equal_strict, combine_comparators,
};
use crate::cycle::guard;
use crate::state::{comparator, Comparator};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How an engine scopes its traversal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateMode {
    /// Fresh state for every top-level call.
    #[default]
    PerCall,
    /// One state reused across calls, cleared at the start of each.
    Persistent,
}

/// Switches an engine is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EqualityOptions {
    /// Guard recursive categories against cycles.
    pub circular: bool,
    /// Compare all own keys with their attributes, and extra properties on
    /// arrays, typed arrays, maps and sets.
    pub strict: bool,
    pub state_mode: StateMode,
}

impl EqualityOptions {
    pub fn circular(mut self, circular: bool) -> Self {
        self.circular = circular;
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn state_mode(mut self, mode: StateMode) -> Self {
        self.state_mode = mode;
        self
    }
}

/// One comparator per comparable category.
#[derive(Clone)]
pub struct ComparatorSet {
    pub records: Comparator,
    pub sequences: Comparator,
    pub typed_arrays: Comparator,
    pub dates: Comparator,
    pub patterns: Comparator,
    pub maps: Comparator,
    pub sets: Comparator,
    pub boxed: Comparator,
}

impl ComparatorSet {
    /// Enumerable string keys only; collections ignore extra properties.
    pub fn loose() -> Self {
        Self {
            records: comparator(are_records_equal),
            sequences: comparator(are_sequences_equal),
            typed_arrays: comparator(are_typed_arrays_equal),
            dates: comparator(are_dates_equal),
            patterns: comparator(are_regexps_equal),
            maps: comparator(are_maps_equal),
            sets: comparator(are_sets_equal),
            boxed: comparator(are_primitive_wrappers_equal),
        }
    }

    /// All own keys with attributes; collections also compare their own
    /// properties.
    pub fn strict() -> Self {
        let strict_records = comparator(are_records_equal_strict);
        Self {
            records: strict_records.clone(),
            sequences: combine_comparators(comparator(are_sequences_equal), strict_records.clone()),
            typed_arrays: comparator(are_typed_arrays_equal_strict),
            dates: comparator(are_dates_equal),
            patterns: comparator(are_regexps_equal),
            maps: combine_comparators(comparator(are_maps_equal), strict_records.clone()),
            sets: combine_comparators(comparator(are_sets_equal), strict_records),
            boxed: comparator(are_primitive_wrappers_equal),
        }
    }

    /// Defaults for `strict`.
    pub fn defaults(strict: bool) -> Self {
        if strict {
            Self::strict()
        } else {
            Self::loose()
        }
    }

    /// Comparator for `tag`. Argument objects share the record comparator;
    /// primitives and opaque values have none.
    pub fn get(&self, tag: TypeTag) -> Option<&Comparator> {
        match tag {
            TypeTag::PlainRecord | TypeTag::ArgumentsLike => Some(&self.records),
            TypeTag::Sequence => Some(&self.sequences),
            TypeTag::TypedBuffer => Some(&self.typed_arrays),
            TypeTag::DateTime => Some(&self.dates),
            TypeTag::Pattern => Some(&self.patterns),
            TypeTag::Mapping => Some(&self.maps),
            TypeTag::SetCollection => Some(&self.sets),
            TypeTag::BoxedPrimitive => Some(&self.boxed),
            TypeTag::Primitive | TypeTag::Opaque => None,
        }
    }

    /// Wraps the categories that can contain themselves with the cycle guard.
    ///
    /// Typed buffers, dates, patterns and boxed primitives hold no object
    /// references and stay unguarded.
    pub fn guard_composites(self) -> Self {
        Self {
            records: guard(self.records),
            sequences: guard(self.sequences),
            maps: guard(self.maps),
            sets: guard(self.sets),
            ..self
        }
    }

    /// Replaces every entry `overrides` sets.
    pub fn merge(self, overrides: ComparatorOverrides) -> Self {
        Self {
            records: overrides.records.unwrap_or(self.records),
            sequences: overrides.sequences.unwrap_or(self.sequences),
            typed_arrays: overrides.typed_arrays.unwrap_or(self.typed_arrays),
            dates: overrides.dates.unwrap_or(self.dates),
            patterns: overrides.patterns.unwrap_or(self.patterns),
            maps: overrides.maps.unwrap_or(self.maps),
            sets: overrides.sets.unwrap_or(self.sets),
            boxed: overrides.boxed.unwrap_or(self.boxed),
        }
    }
}

impl fmt::Debug for ComparatorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComparatorSet").finish_non_exhaustive()
    }
}

/// Partial replacement for a [`ComparatorSet`].
#[derive(Clone, Default)]
pub struct ComparatorOverrides {
    pub records: Option<Comparator>,
    pub sequences: Option<Comparator>,
    pub typed_arrays: Option<Comparator>,
    pub dates: Option<Comparator>,
    pub patterns: Option<Comparator>,
    pub maps: Option<Comparator>,
    pub sets: Option<Comparator>,
    pub boxed: Option<Comparator>,
}

impl ComparatorOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(mut self, c: Comparator) -> Self {
        self.records = Some(c);
        self
    }

    pub fn sequences(mut self, c: Comparator) -> Self {
        self.sequences = Some(c);
        self
    }

    pub fn typed_arrays(mut self, c: Comparator) -> Self {
        self.typed_arrays = Some(c);
        self
    }

    pub fn dates(mut self, c: Comparator) -> Self {
        self.dates = Some(c);
        self
    }

    pub fn patterns(mut self, c: Comparator) -> Self {
        self.patterns = Some(c);
        self
    }

    pub fn maps(mut self, c: Comparator) -> Self {
        self.maps = Some(c);
        self
    }

    pub fn sets(mut self, c: Comparator) -> Self {
        self.sets = Some(c);
        self
    }

    pub fn boxed(mut self, c: Comparator) -> Self {
        self.boxed = Some(c);
        self
    }

    /// Number of entries set.
    pub fn len(&self) -> usize {
        [
            &self.records,
            &self.sequences,
            &self.typed_arrays,
            &self.dates,
            &self.patterns,
            &self.maps,
            &self.sets,
            &self.boxed,
        ]
        .iter()
        .filter(|c| c.is_some())
        .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for ComparatorOverrides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComparatorOverrides")
            .field("count", &self.len())
            .finish()
    }
}

/// Produces overrides from the defaults about to be used.
pub type Customizer = std::sync::Arc<dyn Fn(&ComparatorSet) -> ComparatorOverrides + Send + Sync>;

/// Builds the comparator table for `options`: defaults, then `customize`,
/// then the cycle guard.
pub fn build_comparator_set(options: &EqualityOptions, customize: Option<&Customizer>) -> ComparatorSet {
    let mut set = ComparatorSet::defaults(options.strict);
    if let Some(customize) = customize {
        let overrides = customize(&set);
        set = set.merge(overrides);
    }
    if options.circular {
        set = set.guard_composites();
    }
    set
}
