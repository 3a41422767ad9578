use partmap::{ConcurrentMap, Int64Key, StrKey, i64_key, str_key};
use rand::Rng;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use test_log::test;

const WRITERS: usize = 100;
const READERS: usize = 100;

#[test]
fn test_string_key_basic_ops() {
    let mut rng = rand::thread_rng();
    for _ in 0..10 {
        let value: i32 = rng.gen_range(0..1000);
        let map = ConcurrentMap::<StrKey, i32>::new(99).unwrap();
        assert_eq!(map.get(&str_key("Hello")), None);
        map.set(&str_key("Hello"), value);
        assert_eq!(map.get(&str_key("Hello")), Some(value));
        map.del(&str_key("Hello"));
        assert_eq!(map.get(&str_key("Hello")), None);
    }
}

#[test]
fn test_int64_key_basic_ops() {
    let map = ConcurrentMap::<Int64Key, i32>::new(99).unwrap();
    map.set(&i64_key(1023), 500);
    assert_eq!(map.get(&i64_key(1023)), Some(500));
    map.del(&i64_key(1023));
    assert_eq!(map.get(&i64_key(1023)), None);
}

#[test]
fn test_random_negative_selectors_stay_in_range() {
    let mut rng = rand::thread_rng();
    let map = ConcurrentMap::<Int64Key, i64>::new(199).unwrap();
    for _ in 0..1_000 {
        let raw: i64 = rng.gen_range(i64::MIN..0);
        let index = map.partition_index(&i64_key(raw));
        assert!(index < 199);
        assert_eq!(index, map.partition_index(&i64_key(raw)));
        map.set(&i64_key(raw), raw);
        assert_eq!(map.get(&i64_key(raw)), Some(raw));
    }
}

/// Writers fill `i -> i*i` while readers poll; a read is either a miss or
/// the exact value.
#[test]
fn test_concurrent_writers_and_readers_converge() {
    let map = Arc::new(ConcurrentMap::<StrKey, usize>::new(99).unwrap());
    let mut handles = Vec::with_capacity(WRITERS + READERS);
    for _ in 0..WRITERS {
        let map = map.clone();
        handles.push(thread::spawn(move || {
            for i in 0..100 {
                map.set(&str_key(i.to_string()), i * i);
            }
        }));
    }
    for _ in 0..READERS {
        let map = map.clone();
        handles.push(thread::spawn(move || {
            for i in 0..100 {
                if let Some(v) = map.get(&str_key(i.to_string())) {
                    assert_eq!(v, i * i);
                }
            }
        }));
    }
    for h in handles {
        h.join().unwrap();
    }
    for i in 0..100 {
        assert_eq!(map.get(&str_key(i.to_string())), Some(i * i));
    }
    assert_eq!(map.len(), 100);
}

fn churn(partitions: usize, keys: u64) {
    let map = Arc::new(ConcurrentMap::<StrKey, u64>::new(partitions).unwrap());
    let torn = Arc::new(AtomicU64::new(0));
    let mut handles = Vec::with_capacity(WRITERS + READERS);
    for _ in 0..WRITERS {
        let map = map.clone();
        let torn = torn.clone();
        handles.push(thread::spawn(move || {
            for i in 0..keys {
                let key = str_key(i.to_string());
                map.set(&key, i * i);
                if map.get(&key).is_some_and(|v| v != i * i) {
                    torn.fetch_add(1, Ordering::Relaxed);
                }
                map.del(&key);
            }
        }));
    }
    for _ in 0..READERS {
        let map = map.clone();
        let torn = torn.clone();
        handles.push(thread::spawn(move || {
            for i in 0..keys {
                if map.get(&str_key(i.to_string())).is_some_and(|v| v != i * i) {
                    torn.fetch_add(1, Ordering::Relaxed);
                }
            }
        }));
    }
    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(torn.load(Ordering::Relaxed), 0);
    assert!(map.is_empty());
    assert_eq!(map.iter().count(), 0);
}

#[test]
fn test_churn_single_partition() {
    churn(1, 2_000);
}

#[test]
fn test_churn_99_partitions() {
    churn(99, 2_000);
}

#[test]
fn test_churn_199_partitions() {
    churn(199, 2_000);
}

#[test]
#[ignore = "full-size churn; run with --ignored in release mode"]
fn test_churn_full_key_space() {
    for partitions in [1, 99, 199] {
        churn(partitions, 100_000);
    }
}
