//! Tokio-backed variant of [`crate::ConcurrentMap`].
//!
//! Routing and construction rules are shared with the sync map; only the
//! partition lock differs. Each call awaits at most one partition lock.

use crate::error::MapResult;
use crate::key::Partitionable;
use crate::map::{resolve_index, routing_modulus};
use fxhash::FxBuildHasher;
use hashbrown::HashMap;
use std::fmt;
use std::hash::BuildHasher;
use std::marker::PhantomData;
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};
use tokio::sync::RwLock as TokioRwLock;

type AsyncPartition<R, V, S> = TokioRwLock<HashMap<R, V, S>>;

pub struct AsyncConcurrentMap<K, V, S = FxBuildHasher>
where
    K: Partitionable,
{
    partitions: Arc<[AsyncPartition<K::Raw, V, S>]>,
    modulus: i64,
    total_len: Arc<AtomicUsize>,
    _key: PhantomData<fn(&K)>,
}

impl<K, V> AsyncConcurrentMap<K, V, FxBuildHasher>
where
    K: Partitionable,
{
    pub fn new(partitions: usize) -> MapResult<Self> {
        Self::with_partitions_and_hasher(partitions, FxBuildHasher::default())
    }
}

impl<K, V, S> AsyncConcurrentMap<K, V, S>
where
    K: Partitionable,
    S: BuildHasher + Clone,
{
    pub fn with_partitions_and_hasher(partitions: usize, hasher: S) -> MapResult<Self> {
        let modulus = routing_modulus(partitions)?;
        let partitions: Arc<[AsyncPartition<K::Raw, V, S>]> = (0..partitions)
            .map(|_| TokioRwLock::new(HashMap::with_hasher(hasher.clone())))
            .collect();
        log::debug!(
            "created async concurrent map with {} partitions",
            partitions.len()
        );
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

    pub fn partition_index(&self, key: &K) -> usize {
        resolve_index(key.shard_selector(), self.modulus)
    }

    fn partition(&self, key: &K) -> &AsyncPartition<K::Raw, V, S> {
        &self.partitions[self.partition_index(key)]
    }

    /// Get a cloned value by key; prefers non-blocking `try_read` first.
    pub async fn get_async(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        let partition = self.partition(key);
        if let Ok(guard) = partition.try_read() {
            return guard.get(key.value()).cloned();
        }
        partition.read().await.get(key.value()).cloned()
    }

    pub async fn contains_key_async(&self, key: &K) -> bool {
        self.partition(key).read().await.contains_key(key.value())
    }

    pub async fn set_async(&self, key: &K, value: V) {
        let mut guard = self.partition(key).write().await;
        if guard.insert(key.value().clone(), value).is_none() {
            self.total_len.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub async fn del_async(&self, key: &K) {
        let mut guard = self.partition(key).write().await;
        if guard.remove(key.value()).is_some() {
            self.total_len.fetch_sub(1, Ordering::Relaxed);
        }
    }

    pub fn len(&self) -> usize {
        self.total_len.load(Ordering::Relaxed)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clear every partition, one lock at a time.
    pub async fn clear_async(&self) {
        for partition in self.partitions.iter() {
            let mut guard = partition.write().await;
            self.total_len.fetch_sub(guard.len(), Ordering::Relaxed);
            guard.clear();
        }
        log::debug!("cleared async map of {} partitions", self.partitions.len());
    }
}

impl<K, V, S> Clone for AsyncConcurrentMap<K, V, S>
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

impl<K, V, S> fmt::Debug for AsyncConcurrentMap<K, V, S>
where
    K: Partitionable,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncConcurrentMap")
            .field("partitions", &self.partitions.len())
            .field("len", &self.total_len.load(Ordering::Relaxed))
            .finish()
    }
}
