//! # Partmap
//!
//! Partmap is a thread-safe key-value map that spreads its entries over a fixed number of
//! partitions, each an independent `std::sync::RwLock` around a `hashbrown::HashMap`.
//! Unlike a hash-routed sharded map, the partition is chosen by the key itself: every key type
//! implements [`Partitionable`], exposing the raw value the partition table compares and an
//! integer shard selector used only for routing.
//!
//! ## Routing Contract
//! - **Fixed partitions**: the partition count is chosen at construction, must be non-zero, and
//!   never changes. All partitions are allocated eagerly.
//! - **Selector modulo**: a key lives in partition `shard_selector().rem_euclid(count)`, so
//!   negative selectors still land in `[0, count)`.
//! - **One lock per call**: `get` takes a partition's read lock, `set`/`del` take its write lock.
//!   No call ever holds two locks, so operations on different partitions never contend and the
//!   map cannot deadlock on its own.
//!
//! ## Usage Example (Sync)
//! ```rust
//! use partmap::{ConcurrentMap, StrKey, i64_key, str_key};
//!
//! let map: ConcurrentMap<StrKey, i32> = ConcurrentMap::new(99).unwrap();
//! assert_eq!(map.get(&str_key("Hello")), None);
//! map.set(&str_key("Hello"), 42);
//! assert_eq!(map.get(&str_key("Hello")), Some(42));
//! map.del(&str_key("Hello"));
//! assert_eq!(map.get(&str_key("Hello")), None);
//!
//! // Integer keys route on their own value.
//! let ids = ConcurrentMap::new(8).unwrap();
//! ids.set(&i64_key(1023), "order");
//! assert_eq!(ids.partition_index(&i64_key(1023)), 1023 % 8);
//! ```
//!
//! ## Custom Keys
//! ```rust
//! use partmap::{ConcurrentMap, Partitionable};
//!
//! // Tenant-scoped ids: every row of one tenant shares a partition.
//! #[derive(Clone, PartialEq, Eq, Hash)]
//! struct RowKey { tenant: u32, row: u64 }
//!
//! impl Partitionable for RowKey {
//!     type Raw = RowKey;
//!     fn value(&self) -> &RowKey { self }
//!     fn shard_selector(&self) -> i64 { self.tenant as i64 }
//! }
//!
//! let map = ConcurrentMap::new(16).unwrap();
//! map.set(&RowKey { tenant: 3, row: 1 }, "a");
//! assert_eq!(map.partition_len(3), Some(1));
//! ```
//!
//! ## Notes
//! - Iteration is snapshot-style, unordered, and may observe a mix of states.
//! - Repartitioning is not supported.
//!
//! Enable `async` feature for Tokio integration. Enable `rayon` feature for parallel iteration.

pub mod adapter;
#[cfg(feature = "async")]
pub mod async_map;
pub mod error;
pub mod key;
pub mod map;
mod partition;

pub use adapter::{
    BenchMap, DashMapAdapter, PartitionedMapAdapter, RwLockMap, Workload, run_workload,
};
#[cfg(feature = "async")]
pub use async_map::AsyncConcurrentMap;
pub use error::{MapError, MapResult};
pub use key::{Int64Key, Partitionable, StrKey, i64_key, str_key};
pub use map::{ConcurrentMap, DEFAULT_PARTITIONS};
