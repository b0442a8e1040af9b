//! Concurrent, write-once-per-key metadata cache.

use super::table::{ColumnMap, Entity, TableMetadata};
use parking_lot::{Mutex, RwLock};
use quill_common::types::EntityKey;
use quill_common::utils::hash::{FxHashMap, FxHashSet};
use std::sync::Arc;

/// One published state of the cache.
#[derive(Debug, Clone, Default)]
struct Snapshot {
    tables: FxHashMap<EntityKey, Arc<TableMetadata>>,
    /// Every row alias in use, declared or generated.
    aliases: FxHashSet<String>,
}

/// Type-keyed store of [`TableMetadata`].
///
/// Entries are inserted at most once and never updated or removed. Readers
/// receive an `Arc` to the stored value, so a published entry is always
/// complete and can be used after the call returns.
///
/// The cache is copy-on-write: writers build the next snapshot off to the
/// side and publish it with a single pointer swap. A reader only holds the
/// shared lock long enough to clone the current snapshot pointer, so it never
/// waits for a registration to reflect an entity or rebuild the map.
///
/// Row aliases are unique across the cache. An entity whose source gives no
/// alias, or an alias already taken by another entity, gets the next free
/// `tN` alias.
///
/// The cache is meant to be shared: wrap it in an `Arc` and hand clones to
/// every builder that needs it.
pub struct MetadataCache {
    /// Current snapshot.
    snapshot: RwLock<Arc<Snapshot>>,
    /// Serializes writers; holds the last generated alias number.
    writer: Mutex<u32>,
    /// Shared placeholder returned for unknown entities.
    empty: Arc<TableMetadata>,
}

impl MetadataCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            snapshot: RwLock::new(Arc::new(Snapshot::default())),
            writer: Mutex::new(0),
            empty: Arc::new(TableMetadata::empty()),
        }
    }

    fn current(&self) -> Arc<Snapshot> {
        Arc::clone(&self.snapshot.read())
    }

    /// Number of registered entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.current().tables.len()
    }

    /// Returns `true` if nothing has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.current().tables.is_empty()
    }

    /// Returns `true` if metadata exists for the entity.
    #[must_use]
    pub fn has_entry(&self, key: EntityKey) -> bool {
        self.current().tables.contains_key(&key)
    }

    /// Typed form of [`has_entry`](Self::has_entry).
    #[must_use]
    pub fn contains<T: Entity>(&self) -> bool {
        self.has_entry(EntityKey::of::<T>())
    }

    /// Registers metadata for an entity.
    ///
    /// Returns `false` and leaves the cache untouched if the entity already
    /// has an entry; the first registration wins.
    pub fn try_insert(&self, key: EntityKey, metadata: TableMetadata) -> bool {
        let mut counter = self.writer.lock();
        let current = self.current();
        if current.tables.contains_key(&key) {
            tracing::trace!(entity = %key, "metadata already registered");
            return false;
        }
        self.publish(&mut counter, &current, key, metadata);
        true
    }

    /// Returns the metadata for an entity, or `None` if it was never
    /// registered.
    #[must_use]
    pub fn lookup(&self, key: EntityKey) -> Option<Arc<TableMetadata>> {
        self.current().tables.get(&key).cloned()
    }

    /// Returns the metadata for an entity.
    ///
    /// Unknown entities yield an empty placeholder (no name, no alias, no
    /// columns) instead of an error. Callers must treat
    /// [`TableMetadata::is_empty`] as "no metadata available"; use
    /// [`lookup`](Self::lookup) to observe absence directly.
    #[must_use]
    pub fn get(&self, key: EntityKey) -> Arc<TableMetadata> {
        self.lookup(key).unwrap_or_else(|| Arc::clone(&self.empty))
    }

    /// Row alias of an entity; empty if unknown.
    #[must_use]
    pub fn identifier(&self, key: EntityKey) -> String {
        self.get(key).identifier().to_string()
    }

    /// Physical table name of an entity; empty if unknown.
    #[must_use]
    pub fn table_name(&self, key: EntityKey) -> String {
        self.get(key).name().to_string()
    }

    /// A private copy of an entity's column mapping; empty if unknown.
    #[must_use]
    pub fn columns(&self, key: EntityKey) -> ColumnMap {
        self.get(key).columns().clone()
    }

    /// Returns the metadata for `T`, reflecting it on first use.
    ///
    /// Reflection runs without any lock held. When several callers race on
    /// the first lookup, each may build a candidate, but exactly one is
    /// published and every caller gets that one back.
    pub fn resolve<T: Entity>(&self) -> Arc<TableMetadata> {
        let key = EntityKey::of::<T>();
        if let Some(hit) = self.lookup(key) {
            tracing::trace!(entity = %key, "metadata cache hit");
            return hit;
        }

        let metadata = T::metadata();
        let mut counter = self.writer.lock();
        let current = self.current();
        if let Some(existing) = current.tables.get(&key) {
            return Arc::clone(existing);
        }
        self.publish(&mut counter, &current, key, metadata)
    }

    /// Publishes a new snapshot containing `metadata`. Caller holds the
    /// writer lock and has checked that `key` is absent from `current`.
    fn publish(
        &self,
        counter: &mut u32,
        current: &Snapshot,
        key: EntityKey,
        mut metadata: TableMetadata,
    ) -> Arc<TableMetadata> {
        let declared = metadata.identifier().to_string();
        if declared.is_empty() || current.aliases.contains(&declared) {
            let alias = loop {
                *counter += 1;
                let candidate = format!("t{counter}");
                if !current.aliases.contains(&candidate) {
                    break candidate;
                }
            };
            if declared.is_empty() {
                tracing::trace!(entity = %key, alias = %alias, "assigned generated alias");
            } else {
                tracing::warn!(
                    entity = %key,
                    declared = %declared,
                    alias = %alias,
                    "alias already in use, assigned generated alias"
                );
            }
            metadata = metadata.with_alias(alias);
        }

        let entry = Arc::new(metadata);
        let mut next = current.clone();
        next.aliases.insert(entry.identifier().to_string());
        next.tables.insert(key, Arc::clone(&entry));
        *self.snapshot.write() = Arc::new(next);
        tracing::debug!(
            entity = %key,
            table = entry.name(),
            alias = entry.identifier(),
            "registered table metadata"
        );
        entry
    }
}

impl Default for MetadataCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MetadataCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataCache")
            .field("entries", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct DataType;

    impl Entity for DataType {
        fn metadata() -> TableMetadata {
            TableMetadata::new("datatype")
                .with_alias("d")
                .with_column("Id", "data_type_id")
                .with_column("Name", "name")
                .with_column("Created", "created")
        }
    }

    struct Unaliased;

    impl Entity for Unaliased {
        fn metadata() -> TableMetadata {
            TableMetadata::new("unaliased").with_column("Id", "id")
        }
    }

    struct DeclaresT1;

    impl Entity for DeclaresT1 {
        fn metadata() -> TableMetadata {
            TableMetadata::new("declared")
                .with_alias("t1")
                .with_column("Id", "id")
        }
    }

    struct Unregistered;

    static SLOW_ENTERED: AtomicBool = AtomicBool::new(false);
    static SLOW_RELEASE: AtomicBool = AtomicBool::new(false);

    struct Slow;

    impl Entity for Slow {
        fn metadata() -> TableMetadata {
            SLOW_ENTERED.store(true, Ordering::SeqCst);
            while !SLOW_RELEASE.load(Ordering::SeqCst) {
                std::thread::yield_now();
            }
            TableMetadata::new("slow").with_alias("s").with_column("Id", "id")
        }
    }

    #[test]
    fn test_first_insert_wins() {
        let cache = MetadataCache::new();
        let key = EntityKey::of::<DataType>();

        assert!(!cache.has_entry(key));
        assert!(cache.try_insert(key, DataType::metadata()));
        assert!(!cache.try_insert(key, TableMetadata::new("other")));

        assert!(cache.has_entry(key));
        assert_eq!(cache.table_name(key), "datatype");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_unknown_entity_yields_empty_placeholder() {
        let cache = MetadataCache::new();
        let key = EntityKey::of::<Unregistered>();

        let meta = cache.get(key);
        assert!(meta.is_empty());
        assert_eq!(cache.table_name(key), "");
        assert_eq!(cache.identifier(key), "");
        assert!(cache.columns(key).is_empty());
        assert!(cache.lookup(key).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_resolve_reflects_once() {
        let cache = MetadataCache::new();

        let first = cache.resolve::<DataType>();
        let second = cache.resolve::<DataType>();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(cache.contains::<DataType>());
        assert_eq!(first.identifier(), "d");
    }

    #[test]
    fn test_resolve_respects_prior_registration() {
        let cache = MetadataCache::new();
        let key = EntityKey::of::<DataType>();
        cache.try_insert(key, TableMetadata::new("override").with_alias("o"));

        assert_eq!(cache.resolve::<DataType>().name(), "override");
    }

    #[test]
    fn test_generated_alias() {
        let cache = MetadataCache::new();
        let meta = cache.resolve::<Unaliased>();
        assert_eq!(meta.identifier(), "t1");
        assert_eq!(cache.identifier(EntityKey::of::<Unaliased>()), "t1");
    }

    #[test]
    fn test_generated_alias_skips_declared_alias() {
        let cache = MetadataCache::new();
        assert_eq!(cache.resolve::<DeclaresT1>().identifier(), "t1");
        assert_eq!(cache.resolve::<Unaliased>().identifier(), "t2");
    }

    #[test]
    fn test_declared_alias_taken_by_generated_one_is_replaced() {
        let cache = MetadataCache::new();
        assert_eq!(cache.resolve::<Unaliased>().identifier(), "t1");

        let declared = cache.resolve::<DeclaresT1>();
        assert_eq!(declared.identifier(), "t2");
        assert_eq!(declared.name(), "declared");
    }

    #[test]
    fn test_duplicate_declared_alias_is_replaced() {
        let cache = MetadataCache::new();
        cache.try_insert(EntityKey::of::<Unregistered>(), TableMetadata::new("a").with_alias("d"));
        assert_eq!(cache.resolve::<DataType>().identifier(), "t1");
    }

    #[test]
    fn test_columns_returns_private_copy() {
        let cache = MetadataCache::new();
        let key = EntityKey::of::<DataType>();
        cache.resolve::<DataType>();

        let mut columns = cache.columns(key);
        columns.shift_remove("Name");
        assert_eq!(columns.len(), 2);
        assert_eq!(cache.get(key).columns().len(), 3);
    }

    #[test]
    fn test_published_entry_survives_later_inserts() {
        let cache = MetadataCache::new();
        let first = cache.resolve::<DataType>();
        cache.resolve::<Unaliased>();
        cache.resolve::<DeclaresT1>();

        let again = cache.lookup(EntityKey::of::<DataType>()).unwrap();
        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_reads_proceed_during_registration() {
        let cache = MetadataCache::new();
        cache.resolve::<DataType>();

        std::thread::scope(|scope| {
            let slow = scope.spawn(|| cache.resolve::<Slow>());
            while !SLOW_ENTERED.load(Ordering::SeqCst) {
                std::thread::yield_now();
            }

            assert_eq!(cache.table_name(EntityKey::of::<DataType>()), "datatype");
            assert!(cache.try_insert(EntityKey::of::<Unregistered>(), TableMetadata::new("other")));
            assert!(!cache.contains::<Slow>());

            SLOW_RELEASE.store(true, Ordering::SeqCst);
            assert_eq!(slow.join().unwrap().name(), "slow");
        });
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_concurrent_insert_has_single_winner() {
        let cache = MetadataCache::new();
        let key = EntityKey::of::<DataType>();

        let winners: usize = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|i| {
                    let cache = &cache;
                    scope.spawn(move || {
                        usize::from(cache.try_insert(key, TableMetadata::new(format!("t{i}"))))
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).sum()
        });

        assert_eq!(winners, 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_concurrent_resolve_publishes_one_instance() {
        let cache = MetadataCache::new();

        let resolved: Vec<Arc<TableMetadata>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| cache.resolve::<Unaliased>()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let first = &resolved[0];
        assert!(resolved.iter().all(|m| Arc::ptr_eq(m, first)));
        assert_eq!(first.identifier(), "t1");
    }
}
