//! String-keyed adapters that put [`ConcurrentMap`] and two baseline maps
//! behind one `{set, get, del}` surface, plus the workload driver used to
//! compare them.

use crate::error::MapResult;
use crate::key::StrKey;
use crate::map::ConcurrentMap;
use dashmap::DashMap;
use fxhash::FxBuildHasher;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::thread;

/// Uniform surface shared by every benchmarked map.
pub trait BenchMap<V>: Send + Sync {
    fn set(&self, key: String, value: V);
    fn get(&self, key: &str) -> Option<V>;
    fn del(&self, key: &str);
}

/// [`ConcurrentMap`] keyed by raw strings wrapped into [`StrKey`].
#[derive(Debug, Clone)]
pub struct PartitionedMapAdapter<V> {
    map: ConcurrentMap<StrKey, V>,
}

impl<V> PartitionedMapAdapter<V> {
    pub fn new(partitions: usize) -> MapResult<Self> {
        Ok(Self::from_map(ConcurrentMap::new(partitions)?))
    }

    pub fn from_map(map: ConcurrentMap<StrKey, V>) -> Self {
        Self { map }
    }

    pub fn inner(&self) -> &ConcurrentMap<StrKey, V> {
        &self.map
    }
}

impl<V: Clone + Send + Sync> BenchMap<V> for PartitionedMapAdapter<V> {
    fn set(&self, key: String, value: V) {
        self.map.set(&StrKey::new(key), value);
    }

    fn get(&self, key: &str) -> Option<V> {
        self.map.get(&StrKey::new(key))
    }

    fn del(&self, key: &str) {
        self.map.del(&StrKey::new(key));
    }
}

/// Baseline: one map behind one global `RwLock`.
#[derive(Debug)]
pub struct RwLockMap<V> {
    lock: RwLock<HashMap<String, V>>,
}

impl<V> RwLockMap<V> {
    pub fn new() -> Self {
        Self {
            lock: RwLock::new(HashMap::new()),
        }
    }
}

impl<V> Default for RwLockMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone + Send + Sync> BenchMap<V> for RwLockMap<V> {
    fn set(&self, key: String, value: V) {
        let mut guard = self.lock.write().unwrap_or_else(PoisonError::into_inner);
        guard.insert(key, value);
    }

    fn get(&self, key: &str) -> Option<V> {
        let guard = self.lock.read().unwrap_or_else(PoisonError::into_inner);
        guard.get(key).cloned()
    }

    fn del(&self, key: &str) {
        let mut guard = self.lock.write().unwrap_or_else(PoisonError::into_inner);
        guard.remove(key);
    }
}

/// Baseline: a general-purpose concurrent map.
#[derive(Debug)]
pub struct DashMapAdapter<V> {
    map: DashMap<String, V, FxBuildHasher>,
}

impl<V> DashMapAdapter<V> {
    pub fn new() -> Self {
        Self {
            map: DashMap::with_hasher(FxBuildHasher::default()),
        }
    }
}

impl<V> Default for DashMapAdapter<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone + Send + Sync> BenchMap<V> for DashMapAdapter<V> {
    fn set(&self, key: String, value: V) {
        self.map.insert(key, value);
    }

    fn get(&self, key: &str) -> Option<V> {
        self.map.get(key).map(|entry| entry.value().clone())
    }

    fn del(&self, key: &str) {
        self.map.remove(key);
    }
}

/// Shape of one workload run.
#[derive(Debug, Clone, Copy)]
pub struct Workload {
    pub writers: usize,
    pub readers: usize,
    pub keys: u64,
}

impl Default for Workload {
    fn default() -> Self {
        Self {
            writers: 100,
            readers: 100,
            keys: 100_000,
        }
    }
}

/// Run `workload` against `map` on scoped threads.
///
/// Each writer stores `i * i` under `i.to_string()` twice and then deletes
/// it; each reader looks every key up once. Returns the number of reads that
/// hit and the number of reads that saw a value other than `i * i`.
pub fn run_workload<M>(map: &M, workload: Workload) -> (u64, u64)
where
    M: BenchMap<u64> + ?Sized,
{
    thread::scope(|scope| {
        for _ in 0..workload.writers {
            scope.spawn(move || {
                for i in 0..workload.keys {
                    map.set(i.to_string(), i * i);
                    map.set(i.to_string(), i * i);
                    map.del(&i.to_string());
                }
            });
        }
        let readers: Vec<_> = (0..workload.readers)
            .map(|_| {
                scope.spawn(move || {
                    let mut hits = 0u64;
                    let mut mismatches = 0u64;
                    for i in 0..workload.keys {
                        match map.get(&i.to_string()) {
                            Some(v) if v == i * i => hits += 1,
                            Some(_) => mismatches += 1,
                            None => {}
                        }
                    }
                    (hits, mismatches)
                })
            })
            .collect();
        readers
            .into_iter()
            .map(|h| h.join().unwrap())
            .fold((0, 0), |(h, m), (dh, dm)| (h + dh, m + dm))
    })
}
