//! Context slots and the preparation protocol
//!
//! Generated code is flat: it cannot close over anything. Whatever it needs
//! at run time (literals, exclusion sets, pre-compiled sub-validators,
//! caller closures, loop scratch) lives in a slot of the [`Context`].
//!
//! - `SlotKey`: integer id plus a unique rendered name (`elem3`)
//! - `Preparation`: deferred initializer for one slot
//! - `Context`: per-call slot table and explanation list

use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use ahash::AHashMap;
use quartet_value::Value;
use quartet_value::value::UNDEFINED;
use tracing::warn;

use crate::constant::Literal;
use crate::explanation::{Explanation, Path};
use crate::program::Program;
use crate::utils::KeySet;

// =============================================================================
// SlotKey
// =============================================================================

/// Next slot id. Process-wide, so keys allocated by different `Quartet`
/// instances can share one compilation unit.
static NEXT_SLOT: AtomicU64 = AtomicU64::new(0);

/// Identifier of one context slot.
///
/// Equality and hashing use the numeric id only; the name exists for
/// rendering and introspection and is derived from the id, so it is unique
/// as well.
#[derive(Debug, Clone)]
pub struct SlotKey {
    id: u64,
    name: Arc<str>,
}

impl SlotKey {
    /// Fresh key named after `base`; never equal to any key allocated before.
    pub(crate) fn allocate(base: &str) -> Self {
        let id = NEXT_SLOT.fetch_add(1, Ordering::Relaxed);
        Self {
            id,
            name: Arc::from(format!("{base}{id}")),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl PartialEq for SlotKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for SlotKey {}

impl Hash for SlotKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

// =============================================================================
// Preparation
// =============================================================================

/// Initial content of a slot, installed by its preparation.
#[derive(Clone)]
pub enum SlotInit {
    /// Scratch placeholder; the executing code writes the slot itself.
    Undefined,
    Index(usize),
    Literal(Arc<Literal>),
    KeySet(Arc<KeySet>),
    /// A pre-compiled sub-validator.
    Validator(Arc<Program>),
    /// An externally supplied value or closure.
    Closure(Arc<dyn Any + Send + Sync>),
}

impl fmt::Debug for SlotInit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotInit::Undefined => write!(f, "Undefined"),
            SlotInit::Index(i) => f.debug_tuple("Index").field(i).finish(),
            SlotInit::Literal(l) => f.debug_tuple("Literal").field(l).finish(),
            SlotInit::KeySet(k) => f.debug_tuple("KeySet").field(k).finish(),
            SlotInit::Validator(p) => f.debug_tuple("Validator").field(&p.source()).finish(),
            SlotInit::Closure(_) => write!(f, "Closure(..)"),
        }
    }
}

impl SlotInit {
    /// Text shown for this slot by the documentation collaborator.
    pub fn describe(&self) -> String {
        match self {
            SlotInit::Undefined => "undefined".to_string(),
            SlotInit::Index(i) => i.to_string(),
            SlotInit::Literal(l) => l.to_string(),
            SlotInit::KeySet(k) => k.to_string(),
            SlotInit::Validator(p) => p.source().trim().to_string(),
            SlotInit::Closure(_) => "[closure]".to_string(),
        }
    }
}

/// Deferred initializer bound to one slot.
///
/// Every preparation collected while compiling a schema must be applied, in
/// order, to a fresh context before the compiled code runs.
#[derive(Debug, Clone)]
pub struct Preparation {
    key: SlotKey,
    init: SlotInit,
}

impl Preparation {
    pub(crate) fn new(key: SlotKey, init: SlotInit) -> Self {
        Self { key, init }
    }

    pub fn key(&self) -> &SlotKey {
        &self.key
    }

    pub fn init(&self) -> &SlotInit {
        &self.init
    }

    pub fn apply(&self, ctx: &mut Context<'_>) {
        let slot = match &self.init {
            SlotInit::Undefined => Slot::Undefined,
            SlotInit::Index(i) => Slot::Index(*i),
            SlotInit::Literal(l) => Slot::Literal(l.clone()),
            SlotInit::KeySet(k) => Slot::KeySet(k.clone()),
            SlotInit::Validator(p) => Slot::Validator {
                program: p.clone(),
                explanations: Vec::new(),
            },
            SlotInit::Closure(c) => Slot::Closure(c.clone()),
        };
        ctx.slots.insert(self.key.id, slot);
    }
}

// =============================================================================
// Context
// =============================================================================

/// Run-time content of one slot. `'v` is the lifetime of the candidate value,
/// which loop scratch slots borrow from.
pub enum Slot<'v> {
    Undefined,
    Index(usize),
    Key(Cow<'v, str>),
    Keys(Vec<Cow<'v, str>>),
    Element(&'v Value),
    Literal(Arc<Literal>),
    KeySet(Arc<KeySet>),
    Validator {
        program: Arc<Program>,
        /// Explanations from the last failing call
        explanations: Vec<Explanation>,
    },
    Closure(Arc<dyn Any + Send + Sync>),
}

/// Per-call state of a compiled validator.
#[derive(Default)]
pub struct Context<'v> {
    slots: AHashMap<u64, Slot<'v>>,
    explanations: Vec<Explanation>,
}

impl<'v> Context<'v> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh context with every preparation applied in order.
    pub fn prepare(preparations: &[Preparation]) -> Self {
        let mut ctx = Self::new();
        for preparation in preparations {
            preparation.apply(&mut ctx);
        }
        ctx
    }

    pub fn slot(&self, key: &SlotKey) -> Option<&Slot<'v>> {
        self.slots.get(&key.id)
    }

    pub fn set(&mut self, key: &SlotKey, slot: Slot<'v>) {
        self.slots.insert(key.id, slot);
    }

    pub fn literal(&self, key: &SlotKey) -> Option<&Literal> {
        match self.slot(key) {
            Some(Slot::Literal(l)) => Some(l.as_ref()),
            _ => None,
        }
    }

    pub fn key_set(&self, key: &SlotKey) -> Option<&KeySet> {
        match self.slot(key) {
            Some(Slot::KeySet(k)) => Some(k.as_ref()),
            _ => None,
        }
    }

    /// Downcast an externally supplied closure slot.
    pub fn closure<T: Any>(&self, key: &SlotKey) -> Option<&T> {
        match self.slot(key) {
            Some(Slot::Closure(c)) => c.downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Value bound to an element slot; `undefined` when unbound.
    pub fn element(&self, key: &SlotKey) -> &'v Value {
        match self.slot(key) {
            Some(Slot::Element(value)) => *value,
            _ => &UNDEFINED,
        }
    }

    pub fn current_key(&self, key: &SlotKey) -> Option<&str> {
        match self.slot(key) {
            Some(Slot::Key(k)) => Some(k.as_ref()),
            _ => None,
        }
    }

    pub fn index(&self, key: &SlotKey) -> Option<usize> {
        match self.slot(key) {
            Some(Slot::Index(i)) => Some(*i),
            _ => None,
        }
    }

    pub(crate) fn keys_len(&self, key: &SlotKey) -> usize {
        match self.slot(key) {
            Some(Slot::Keys(keys)) => keys.len(),
            _ => 0,
        }
    }

    pub(crate) fn key_at(&self, key: &SlotKey, index: usize) -> Option<Cow<'v, str>> {
        match self.slot(key) {
            Some(Slot::Keys(keys)) => keys.get(index).cloned(),
            _ => None,
        }
    }

    // -------------------------------------------------------------------------
    // Sub-validators
    // -------------------------------------------------------------------------

    /// Run the sub-validator stored in `key` against `value`, keeping its
    /// explanations for [`Context::forward_explanations`].
    pub fn call_validator(&mut self, key: &SlotKey, value: &Value) -> bool {
        let Some(program) = self.program(key) else {
            return false;
        };
        let (valid, explanations) = program.run(value);
        self.store_explanations(key, explanations);
        valid
    }

    /// Run the sub-validator stored in `key` against every element of an
    /// array, stopping at the first failing element. Non-arrays fail.
    ///
    /// All elements share one prepared context.
    pub fn call_validator_each(&mut self, key: &SlotKey, value: &Value) -> bool {
        let Some(program) = self.program(key) else {
            return false;
        };
        let Some(items) = value.as_array() else {
            self.store_explanations(key, Vec::new());
            return false;
        };
        let mut scratch = Context::prepare(program.preparations());
        for (index, item) in items.iter().enumerate() {
            if !program.run_in(item, &mut scratch) {
                let mut explanations = scratch.into_explanations();
                let mut at = Path::root();
                at.push_index(index);
                for explanation in &mut explanations {
                    explanation.rebase(&at);
                }
                self.store_explanations(key, explanations);
                return false;
            }
        }
        self.store_explanations(key, Vec::new());
        true
    }

    /// Move the explanations of the last sub-validator call into this
    /// context, re-rooted at `at`. Returns how many were forwarded.
    pub fn forward_explanations(&mut self, key: &SlotKey, at: &Path) -> usize {
        let taken = match self.slots.get_mut(&key.id) {
            Some(Slot::Validator { explanations, .. }) => std::mem::take(explanations),
            _ => Vec::new(),
        };
        let count = taken.len();
        for mut explanation in taken {
            explanation.rebase(at);
            self.explanations.push(explanation);
        }
        count
    }

    fn program(&self, key: &SlotKey) -> Option<Arc<Program>> {
        match self.slot(key) {
            Some(Slot::Validator { program, .. }) => Some(program.clone()),
            _ => {
                warn!(slot = key.name(), "sub-validator slot used before preparation");
                None
            }
        }
    }

    fn store_explanations(&mut self, key: &SlotKey, new: Vec<Explanation>) {
        if let Some(Slot::Validator { explanations, .. }) = self.slots.get_mut(&key.id) {
            *explanations = new;
        }
    }

    // -------------------------------------------------------------------------
    // Explanations
    // -------------------------------------------------------------------------

    pub fn record(&mut self, explanation: Explanation) {
        self.explanations.push(explanation);
    }

    pub fn explanations(&self) -> &[Explanation] {
        &self.explanations
    }

    pub fn explanation_count(&self) -> usize {
        self.explanations.len()
    }

    pub(crate) fn truncate_explanations(&mut self, len: usize) {
        self.explanations.truncate(len);
    }

    pub(crate) fn drain_explanations(&mut self, from: usize) -> Vec<Explanation> {
        self.explanations.drain(from..).collect()
    }

    pub fn into_explanations(self) -> Vec<Explanation> {
        self.explanations
    }
}
