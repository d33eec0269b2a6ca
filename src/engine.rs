//! Equality entry point.
//!
//! An [`IsEqual`] engine owns a dispatch comparator, an internal comparator
//! and a traversal-state policy. Engines are immutable once built and can be
//! shared across threads; [`IsEqual::is_equal`] is the only operation.
//!
//! Two state policies exist:
//! - **per call**: every top-level call gets fresh state, either from the
//!   caller's factory or a new cycle cache when `circular` is set;
//! - **persistent**: one state is created at build time and reused. Its cache
//!   is cleared at the start of every call. If the state is already in use
//!   (a re-entrant call from inside a custom comparator, or another thread),
//!   the call runs on fresh state instead.
//!
//! [`EqualityBuilder`] assembles an engine from [`EqualityOptions`] plus the
//! optional customizer, internal comparator and state factory.

use crate::classify::{classify, Classification};
use crate::config::{build_comparator_set, ComparatorSet, Customizer, EqualityOptions, StateMode};
use crate::cycle::CycleCache;
use crate::heap::Heap;
use crate::state::{deep_internal_comparator, InternalComparator, Meta, State};
use crate::value::Value;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// The comparator at the root of every comparison.
///
/// Implemented by [`Dispatcher`] and by any closure with the same signature.
pub trait Dispatch: Send + Sync {
    fn compare(&self, a: &Value, b: &Value, state: &mut State<'_>) -> bool;
}

impl<F> Dispatch for F
where
    F: Fn(&Value, &Value, &mut State<'_>) -> bool + Send + Sync,
{
    fn compare(&self, a: &Value, b: &Value, state: &mut State<'_>) -> bool {
        self(a, b, state)
    }
}

/// Wraps a closure as a shared [`Dispatch`].
pub fn dispatch_fn<F>(f: F) -> Arc<dyn Dispatch>
where
    F: Fn(&Value, &Value, &mut State<'_>) -> bool + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Default dispatch: classify, then hand the pair to its category comparator.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    comparators: ComparatorSet,
}

impl Dispatcher {
    pub fn new(comparators: ComparatorSet) -> Self {
        Self { comparators }
    }

    #[inline]
    pub fn comparators(&self) -> &ComparatorSet {
        &self.comparators
    }
}

impl Dispatch for Dispatcher {
    fn compare(&self, a: &Value, b: &Value, state: &mut State<'_>) -> bool {
        match classify(state.heap(), a, b) {
            Classification::Compare { tag, a, b } => match self.comparators.get(tag) {
                Some(comparator) => comparator(a, b, state),
                None => false,
            },
            other => other.verdict().unwrap_or(false),
        }
    }
}

/// The mutable half of a traversal state.
#[derive(Debug, Clone, Default)]
pub struct StateParts {
    pub cache: Option<CycleCache>,
    pub meta: Option<Meta>,
}

impl StateParts {
    /// Fresh parts: a new cache when `circular`, no meta.
    pub fn fresh(circular: bool) -> Self {
        Self {
            cache: circular.then(CycleCache::new),
            meta: None,
        }
    }

    pub fn with_meta(mut self, meta: Meta) -> Self {
        self.meta = Some(meta);
        self
    }
}

/// Produces the state parts for a call (per-call mode) or for the engine's
/// lifetime (persistent mode).
pub type StateFactory = Arc<dyn Fn() -> StateParts + Send + Sync>;

/// Everything [`build_is_equal`] needs.
#[derive(Clone)]
pub struct IsEqualOptions {
    pub circular: bool,
    pub strict: bool,
    pub state_mode: StateMode,
    pub dispatch: Arc<dyn Dispatch>,
    /// Defaults to [`deep_internal_comparator`].
    pub equals: Option<InternalComparator>,
    pub state_factory: Option<StateFactory>,
}

impl IsEqualOptions {
    /// Options around `dispatch` with every switch off.
    pub fn new(dispatch: Arc<dyn Dispatch>) -> Self {
        Self {
            circular: false,
            strict: false,
            state_mode: StateMode::PerCall,
            dispatch,
            equals: None,
            state_factory: None,
        }
    }
}

enum Mode {
    PerCall(Option<StateFactory>),
    Persistent(Mutex<StateParts>),
}

/// A built equality engine.
pub struct IsEqual {
    dispatch: Arc<dyn Dispatch>,
    equals: InternalComparator,
    circular: bool,
    strict: bool,
    mode: Mode,
}

/// Builds an engine from fully assembled options.
pub fn build_is_equal(options: IsEqualOptions) -> IsEqual {
    let IsEqualOptions {
        circular,
        strict,
        state_mode,
        dispatch,
        equals,
        state_factory,
    } = options;
    let mode = match state_mode {
        StateMode::PerCall => Mode::PerCall(state_factory),
        StateMode::Persistent => {
            let mut parts = state_factory.map_or_else(|| StateParts::fresh(circular), |f| f());
            if circular && parts.cache.is_none() {
                parts.cache = Some(CycleCache::new());
            }
            Mode::Persistent(Mutex::new(parts))
        }
    };
    IsEqual {
        dispatch,
        equals: equals.unwrap_or_else(deep_internal_comparator),
        circular,
        strict,
        mode,
    }
}

impl IsEqual {
    /// Decides whether `a` and `b`, both living in `heap`, are equal.
    pub fn is_equal(&self, heap: &Heap, a: &Value, b: &Value) -> bool {
        match &self.mode {
            Mode::PerCall(factory) => {
                let parts = match factory {
                    Some(factory) => factory(),
                    None => StateParts::fresh(self.circular),
                };
                self.run_owned(heap, a, b, parts)
            }
            Mode::Persistent(shared) => match shared.try_lock() {
                Some(mut parts) => {
                    if let Some(cache) = parts.cache.as_mut() {
                        cache.clear();
                    }
                    let StateParts { cache, meta } = &mut *parts;
                    let meta = meta.clone();
                    self.run(heap, a, b, cache.as_mut(), meta)
                }
                None => {
                    debug!("persistent state busy, comparing on fresh state");
                    self.run_owned(heap, a, b, StateParts::fresh(self.circular))
                }
            },
        }
    }

    fn run_owned(&self, heap: &Heap, a: &Value, b: &Value, parts: StateParts) -> bool {
        let StateParts { mut cache, meta } = parts;
        if self.circular && cache.is_none() {
            cache = Some(CycleCache::new());
        }
        self.run(heap, a, b, cache.as_mut(), meta)
    }

    fn run(
        &self,
        heap: &Heap,
        a: &Value,
        b: &Value,
        cache: Option<&mut CycleCache>,
        meta: Option<Meta>,
    ) -> bool {
        let mut state = State::new(heap, &*self.dispatch, &self.equals, cache, meta, self.strict);
        let result = self.dispatch.compare(a, b, &mut state);
        trace!(result, "top-level comparison finished");
        result
    }

    #[inline]
    pub fn circular(&self) -> bool {
        self.circular
    }

    #[inline]
    pub fn strict(&self) -> bool {
        self.strict
    }

    pub fn state_mode(&self) -> StateMode {
        match self.mode {
            Mode::PerCall(_) => StateMode::PerCall,
            Mode::Persistent(_) => StateMode::Persistent,
        }
    }
}

impl fmt::Debug for IsEqual {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IsEqual")
            .field("circular", &self.circular)
            .field("strict", &self.strict)
            .field("state_mode", &self.state_mode())
            .finish_non_exhaustive()
    }
}

/// Assembles a customized engine.
///
/// ```
/// use congruence::prelude::*;
///
/// let engine = EqualityBuilder::new().circular(true).build();
/// let mut heap = Heap::new();
/// let a = heap.record([("x", Value::from(1))]);
/// heap.set_property(&a, "me", a.clone()).unwrap();
/// let b = heap.record([("x", Value::from(1))]);
/// heap.set_property(&b, "me", b.clone()).unwrap();
/// assert!(engine.is_equal(&heap, &a, &b));
/// ```
#[derive(Clone, Default)]
pub struct EqualityBuilder {
    options: EqualityOptions,
    customize: Option<Customizer>,
    equals: Option<InternalComparator>,
    state_factory: Option<StateFactory>,
}

impl EqualityBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from loaded options.
    pub fn from_options(options: EqualityOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn circular(mut self, circular: bool) -> Self {
        self.options.circular = circular;
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.options.strict = strict;
        self
    }

    pub fn state_mode(mut self, mode: StateMode) -> Self {
        self.options.state_mode = mode;
        self
    }

    /// Replaces comparators; the closure receives the defaults it overrides.
    pub fn customize<F>(mut self, f: F) -> Self
    where
        F: Fn(&ComparatorSet) -> crate::config::ComparatorOverrides + Send + Sync + 'static,
    {
        self.customize = Some(Arc::new(f));
        self
    }

    /// Replaces the comparator applied to every child pair.
    pub fn internal_comparator(mut self, equals: InternalComparator) -> Self {
        self.equals = Some(equals);
        self
    }

    /// Supplies the cache and meta of each call (or of the engine, when
    /// persistent).
    pub fn state_factory<F>(mut self, f: F) -> Self
    where
        F: Fn() -> StateParts + Send + Sync + 'static,
    {
        self.state_factory = Some(Arc::new(f));
        self
    }

    pub fn options(&self) -> &EqualityOptions {
        &self.options
    }

    pub fn build(self) -> IsEqual {
        let comparators = build_comparator_set(&self.options, self.customize.as_ref());
        debug!(
            circular = self.options.circular,
            strict = self.options.strict,
            state_mode = ?self.options.state_mode,
            customized = self.customize.is_some(),
            custom_equals = self.equals.is_some(),
            "building equality engine"
        );
        build_is_equal(IsEqualOptions {
            circular: self.options.circular,
            strict: self.options.strict,
            state_mode: self.options.state_mode,
            dispatch: Arc::new(Dispatcher::new(comparators)),
            equals: self.equals,
            state_factory: self.state_factory,
        })
    }
}

impl fmt::Debug for EqualityBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EqualityBuilder")
            .field("options", &self.options)
            .field("customized", &self.customize.is_some())
            .field("custom_equals", &self.equals.is_some())
            .field("state_factory", &self.state_factory.is_some())
            .finish()
    }
}
