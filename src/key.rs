//! Key capability and the two reference key types.
//!
//! A key carries two things: the raw value a partition table compares and
//! hashes, and an integer shard selector the router uses to pick the
//! partition. The selector strategy is left to the key type; keys whose
//! natural ids are already well spread (auto-increment ids, pre-sharded
//! business keys) can route on them directly instead of paying for a hash.

use fxhash::FxHasher64;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Capability every key stored in a [`crate::ConcurrentMap`] must provide.
///
/// Two keys whose `value()`s compare equal must return the same
/// `shard_selector()`, otherwise one logical key could live in two
/// partitions at once.
pub trait Partitionable {
    /// Raw value used for lookups inside a partition table.
    type Raw: Eq + Hash + Clone;

    fn value(&self) -> &Self::Raw;

    /// Integer used only for routing. Negative values are allowed.
    fn shard_selector(&self) -> i64;
}

/// String key routed by a stable FxHash of its contents.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StrKey {
    value: String,
    selector: i64,
}

impl StrKey {
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        let selector = stable_hash(&value);
        Self { value, selector }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }
}

// FxHasher64 is unseeded, so the selector is the same in every process.
fn stable_hash(s: &str) -> i64 {
    let mut hasher = FxHasher64::default();
    hasher.write(s.as_bytes());
    hasher.finish() as i64
}

impl Partitionable for StrKey {
    type Raw = String;

    fn value(&self) -> &String {
        &self.value
    }

    fn shard_selector(&self) -> i64 {
        self.selector
    }
}

impl From<&str> for StrKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for StrKey {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl fmt::Display for StrKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

/// 64-bit integer key; the selector is the integer itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Int64Key(i64);

impl Int64Key {
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    pub const fn get(self) -> i64 {
        self.0
    }
}

impl Partitionable for Int64Key {
    type Raw = i64;

    fn value(&self) -> &i64 {
        &self.0
    }

    fn shard_selector(&self) -> i64 {
        self.0
    }
}

impl From<i64> for Int64Key {
    fn from(i: i64) -> Self {
        Self(i)
    }
}

impl fmt::Display for Int64Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Shorthand for [`StrKey::new`].
pub fn str_key(s: impl Into<String>) -> StrKey {
    StrKey::new(s)
}

/// Shorthand for [`Int64Key::new`].
pub fn i64_key(i: i64) -> Int64Key {
    Int64Key::new(i)
}
