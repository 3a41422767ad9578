use thiserror::Error;

pub type MapResult<T> = Result<T, MapError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapError {
    /// The partition count is zero or cannot be used as an `i64` modulus.
    #[error("invalid partition count {count}: must be in 1..={max}", max = i64::MAX)]
    InvalidPartitionCount { count: usize },
}
