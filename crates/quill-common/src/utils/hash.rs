//! Hashing aliases shared across crates.

/// A `HashMap` using `ahash`.
pub type FxHashMap<K, V> = hashbrown::HashMap<K, V, ahash::RandomState>;

/// A `HashSet` using `ahash`.
pub type FxHashSet<T> = hashbrown::HashSet<T, ahash::RandomState>;
