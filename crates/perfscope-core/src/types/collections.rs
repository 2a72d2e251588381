//! Fast hash collections for hot-path accumulators.
//!
//! Keys are method signatures produced by our own parser, never attacker
//! supplied HashDoS vectors, so the non-randomized Fx hasher is used.

pub use rustc_hash::{FxHashMap, FxHashSet};

/// Create an `FxHashMap` with the given capacity.
pub fn fx_map_with_capacity<K, V>(capacity: usize) -> FxHashMap<K, V> {
    FxHashMap::with_capacity_and_hasher(capacity, Default::default())
}
