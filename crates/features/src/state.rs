//! Opaque per-hypothesis feature state
//!
//! Stateful features thread a value from each hypothesis to its successors.
//! The search never looks inside it: it only needs a hash and an equality
//! test to decide whether two hypotheses are interchangeable for every
//! future scoring decision (recombination).
//!
//! Any `Hash + Eq + Debug` type is an [`FFState`] through the blanket impl,
//! so a feature declares its state as a plain struct and derives the rest.

use rustc_hash::FxHasher;
use std::any::{type_name, Any};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Type-erased state carried by one stateful feature in one hypothesis
pub trait FFState: Any + Send + Sync + fmt::Debug {
    /// Hash of everything that affects future scoring
    fn hash_value(&self) -> u64;

    /// Equality against another state of the same feature
    fn state_eq(&self, other: &dyn FFState) -> bool;

    /// Upcast for downcasting to the concrete type
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast, used when initialising the root state in place
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T> FFState for T
where
    T: Hash + Eq + Send + Sync + fmt::Debug + 'static,
{
    fn hash_value(&self) -> u64 {
        let mut hasher = FxHasher::default();
        self.hash(&mut hasher);
        hasher.finish()
    }

    fn state_eq(&self, other: &dyn FFState) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .map_or(false, |other| self == other)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Borrow a state as the concrete type its feature created.
///
/// A feature only ever receives states it produced itself, so a mismatch
/// is a wiring bug in the search.
pub fn downcast<T: FFState>(state: &dyn FFState) -> &T {
    match state.as_any().downcast_ref::<T>() {
        Some(state) => state,
        None => unreachable!("feature state is not a {}: {:?}", type_name::<T>(), state),
    }
}

/// Mutable counterpart of [`downcast`]
pub fn downcast_mut<T: FFState>(state: &mut dyn FFState) -> &mut T {
    // checked first so the error path can still print the state
    if !state.as_any().is::<T>() {
        unreachable!("feature state is not a {}: {:?}", type_name::<T>(), state);
    }
    match state.as_any_mut().downcast_mut::<T>() {
        Some(state) => state,
        None => unreachable!(),
    }
}

/// Combined hash of a hypothesis' states, in feature order
pub fn hash_states<'a>(states: impl IntoIterator<Item = &'a dyn FFState>) -> u64 {
    let mut hasher = FxHasher::default();
    for state in states {
        hasher.write_u64(state.hash_value());
    }
    hasher.finish()
}
