use crate::error::{MapError, MapResult};
use crate::key::Partitionable;
use crate::partition::Partition;
use fxhash::FxBuildHasher;
#[cfg(feature = "rayon")]
use rayon::prelude::*;
use std::fmt;
use std::hash::BuildHasher;
use std::marker::PhantomData;
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

/// Partition count used by [`ConcurrentMap::default`].
pub const DEFAULT_PARTITIONS: usize = 64;

/// Validate a partition count and return it as the routing modulus.
pub(crate) fn routing_modulus(count: usize) -> MapResult<i64> {
    match i64::try_from(count) {
        Ok(modulus) if modulus > 0 => Ok(modulus),
        _ => Err(MapError::InvalidPartitionCount { count }),
    }
}

/// Map a shard selector onto `[0, modulus)`, negative selectors included.
#[inline]
pub(crate) fn resolve_index(selector: i64, modulus: i64) -> usize {
    selector.rem_euclid(modulus) as usize
}

/// Thread-safe map sharded over a fixed set of `RwLock`-guarded partitions.
///
/// Each call resolves exactly one partition from the key's shard selector and
/// takes only that partition's lock, so calls landing on different
/// partitions never contend and no call ever holds two locks.
pub struct ConcurrentMap<K, V, S = FxBuildHasher>
where
    K: Partitionable,
{
    // Fixed at construction; never resized.
    partitions: Arc<[Partition<K::Raw, V, S>]>,
    modulus: i64,
    // Cached length for O(1) len().
    total_len: Arc<AtomicUsize>,
    _key: PhantomData<fn(&K)>,
}

impl<K, V> ConcurrentMap<K, V, FxBuildHasher>
where
    K: Partitionable,
{
    /// Create a map with `partitions` eagerly allocated partitions.
    ///
    /// Fails with [`MapError::InvalidPartitionCount`] when `partitions` is 0.
    pub fn new(partitions: usize) -> MapResult<Self> {
        Self::with_partitions_and_hasher(partitions, FxBuildHasher::default())
    }
}

impl<K, V, S> ConcurrentMap<K, V, S>
where
    K: Partitionable,
    S: BuildHasher + Clone,
{
    /// Create with a custom hasher for the partition tables.
    pub fn with_partitions_and_hasher(partitions: usize, hasher: S) -> MapResult<Self> {
        let modulus = routing_modulus(partitions)?;
        let partitions: Arc<[Partition<K::Raw, V, S>]> = (0..partitions)
            .map(|_| Partition::with_hasher(hasher.clone()))
            .collect();
        log::debug!("created concurrent map with {} partitions", partitions.len());
        Ok(Self {
            partitions,
            modulus,
            total_len: Arc::new(AtomicUsize::new(0)),
            _key: PhantomData,
        })
    }

    pub fn partition_count(&self) -> usize {
        self.partitions.len()
    }

    /// Index of the partition that owns `key`.
    pub fn partition_index(&self, key: &K) -> usize {
        resolve_index(key.shard_selector(), self.modulus)
    }

    /// Number of entries in one partition, `None` if out of range.
    pub fn partition_len(&self, index: usize) -> Option<usize> {
        self.partitions.get(index).map(Partition::len)
    }

    fn partition(&self, key: &K) -> &Partition<K::Raw, V, S> {
        &self.partitions[self.partition_index(key)]
    }

    /// Get a cloned value by key.
    pub fn get(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        self.partition(key).get(key.value())
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.partition(key).contains_key(key.value())
    }

    /// Insert or overwrite the entry for `key`.
    pub fn set(&self, key: &K, value: V) {
        self.partition(key).set(key.value().clone(), value, &self.total_len);
    }

    /// Remove the entry for `key`; absent keys are a no-op.
    pub fn del(&self, key: &K) {
        self.partition(key).del(key.value(), &self.total_len);
    }

    /// O(1) cached length.
    pub fn len(&self) -> usize {
        self.total_len.load(Ordering::Relaxed)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clear every partition, one lock at a time.
    pub fn clear(&self) {
        let dropped: usize = self
            .partitions
            .iter()
            .map(|partition| partition.clear(&self.total_len))
            .sum();
        log::debug!(
            "cleared {} entries across {} partitions",
            dropped,
            self.partitions.len()
        );
    }

    /// Iterate over a snapshot of all entries as `(raw key, value)` pairs.
    /// - Order is unspecified.
    /// - Partitions are copied one at a time, so the snapshot may observe a
    ///   mix of states under concurrent writes.
    pub fn iter(&self) -> impl Iterator<Item = (K::Raw, V)>
    where
        K::Raw: Clone + Send + Sync,
        V: Clone + Send + Sync,
        S: Send + Sync,
    {
        // Parallel path.
        #[cfg(feature = "rayon")]
        {
            let items: Vec<(K::Raw, V)> = self
                .partitions
                .par_iter()
                .flat_map_iter(Partition::snapshot)
                .collect();
            items.into_iter()
        }

        // Sequential path.
        #[cfg(not(feature = "rayon"))]
        {
            let mut items = Vec::new();
            for partition in self.partitions.iter() {
                items.extend(partition.snapshot());
            }
            items.into_iter()
        }
    }
}

impl<K, V> Default for ConcurrentMap<K, V, FxBuildHasher>
where
    K: Partitionable,
{
    fn default() -> Self {
        Self::new(DEFAULT_PARTITIONS).expect("DEFAULT_PARTITIONS is a valid partition count")
    }
}

// Clones share the same partitions.
impl<K, V, S> Clone for ConcurrentMap<K, V, S>
where
    K: Partitionable,
{
    fn clone(&self) -> Self {
        Self {
            partitions: Arc::clone(&self.partitions),
            modulus: self.modulus,
            total_len: Arc::clone(&self.total_len),
            _key: PhantomData,
        }
    }
}

impl<K, V, S> fmt::Debug for ConcurrentMap<K, V, S>
where
    K: Partitionable,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConcurrentMap")
            .field("partitions", &self.partitions.len())
            .field("len", &self.total_len.load(Ordering::Relaxed))
            .finish()
    }
}

/* ============================ Tests ============================ */
