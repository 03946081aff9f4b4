//! Map aliases used by the engine.
//!
//! Hash maps default to `rustc-hash`; the `std-hash` feature swaps in the
//! standard library hasher. Ordered maps (props, spread arguments) always use
//! `indexmap` so that insertion order is observable and stable.

#[cfg(feature = "std-hash")]
pub mod map {
    pub use std::collections::hash_map::Entry;
    pub use std::collections::HashMap;
}

#[cfg(not(feature = "std-hash"))]
pub mod map {
    pub use rustc_hash::FxHashMap as HashMap;
    pub use std::collections::hash_map::Entry;
}

/// Insertion-ordered map keyed by prop or attribute name.
pub type OrderedMap<V> = indexmap::IndexMap<String, V>;
