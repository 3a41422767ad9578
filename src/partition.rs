use fxhash::FxBuildHasher;
use hashbrown::HashMap;
use std::borrow::Borrow;
use std::hash::{BuildHasher, Hash};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

type Table<R, V, S> = HashMap<R, V, S>;

/// One independently locked slice of the key space.
///
/// The table is only reachable through `lock`. Every mutation is a single
/// table call, so a guard poisoned by a panicking thread still protects a
/// consistent table and is recovered instead of propagated.
pub(crate) struct Partition<R, V, S = FxBuildHasher> {
    lock: RwLock<Table<R, V, S>>,
}

impl<R, V, S> Partition<R, V, S>
where
    R: Eq + Hash,
    S: BuildHasher,
{
    pub(crate) fn with_hasher(hasher: S) -> Self {
        Self {
            lock: RwLock::new(Table::with_hasher(hasher)),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Table<R, V, S>> {
        self.lock.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Table<R, V, S>> {
        self.lock.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cloned value under the shared lock.
    pub(crate) fn get<Q>(&self, raw: &Q) -> Option<V>
    where
        R: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
        V: Clone,
    {
        self.read().get(raw).cloned()
    }

    pub(crate) fn contains_key<Q>(&self, raw: &Q) -> bool
    where
        R: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.read().contains_key(raw)
    }

    /// Insert or overwrite; returns true when the entry is new.
    ///
    /// `total_len` is bumped while the write guard is held, so a racing
    /// `del` of the same key can never decrement it first.
    pub(crate) fn set(&self, raw: R, value: V, total_len: &AtomicUsize) -> bool {
        let mut guard = self.write();
        let inserted = guard.insert(raw, value).is_none();
        if inserted {
            total_len.fetch_add(1, Ordering::Relaxed);
        }
        inserted
    }

    /// Remove if present; returns true when an entry was removed.
    pub(crate) fn del<Q>(&self, raw: &Q, total_len: &AtomicUsize) -> bool
    where
        R: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        let mut guard = self.write();
        let removed = guard.remove(raw).is_some();
        if removed {
            total_len.fetch_sub(1, Ordering::Relaxed);
        }
        removed
    }

    pub(crate) fn len(&self) -> usize {
        self.read().len()
    }

    /// Empty the table; returns the number of entries dropped.
    pub(crate) fn clear(&self, total_len: &AtomicUsize) -> usize {
        let mut guard = self.write();
        let dropped = guard.len();
        guard.clear();
        total_len.fetch_sub(dropped, Ordering::Relaxed);
        dropped
    }

    /// Cloned entries under one short-lived shared lock.
    pub(crate) fn snapshot(&self) -> Vec<(R, V)>
    where
        R: Clone,
        V: Clone,
    {
        self.read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn partition() -> Partition<String, i32> {
        Partition::with_hasher(FxBuildHasher::default())
    }

    #[test]
    fn test_set_get_del() {
        let p = partition();
        let len = AtomicUsize::new(0);
        assert_eq!(p.get("a"), None);
        assert!(p.set("a".to_string(), 1, &len));
        assert!(!p.set("a".to_string(), 2, &len));
        assert_eq!(p.get("a"), Some(2));
        assert!(p.contains_key("a"));
        assert_eq!(p.len(), 1);
        assert!(p.del("a", &len));
        assert!(!p.del("a", &len));
        assert_eq!(p.get("a"), None);
        assert_eq!(p.len(), 0);
        assert_eq!(len.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_clear_and_snapshot() {
        let p = partition();
        let len = AtomicUsize::new(0);
        p.set("a".to_string(), 1, &len);
        p.set("b".to_string(), 2, &len);
        let mut items = p.snapshot();
        items.sort();
        assert_eq!(items, vec![("a".to_string(), 1), ("b".to_string(), 2)]);
        assert_eq!(p.clear(&len), 2);
        assert_eq!(len.load(Ordering::Relaxed), 0);
        assert!(p.snapshot().is_empty());
    }

    #[test]
    fn test_poisoned_lock_is_recovered() {
        let p = Arc::new(partition());
        let len = AtomicUsize::new(0);
        p.set("a".to_string(), 1, &len);
        let poisoner = p.clone();
        let res = thread::spawn(move || {
            let _guard = poisoner.write();
            panic!("poison the partition");
        })
        .join();
        assert!(res.is_err());
        assert_eq!(p.get("a"), Some(1));
        p.set("b".to_string(), 2, &len);
        assert_eq!(p.len(), 2);
    }
}
