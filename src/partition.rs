use crate::coding::read_field;
use crate::comparator::key_range;
use crate::error::Result;
use crate::key::{CompositeKey, field_hash};

/// Routes a key to one of `num_partitions` shuffle partitions.
pub trait Partitioner: Send + Sync {
    /// # Panics
    /// Implementations panic if `num_partitions` is 0.
    fn partition(&self, key: &CompositeKey, num_partitions: usize) -> usize;

    /// Same routing, computed from a serialized key.
    fn partition_raw(&self, key: &[u8], num_partitions: usize) -> Result<usize>;
}

/// Partitions on `first` only.
///
/// Keys that the grouping comparator calls equal share `first`, so they
/// always land in the same partition and a group is never split across
/// reducers.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstPartitioner;

impl Partitioner for FirstPartitioner {
    fn partition(&self, key: &CompositeKey, num_partitions: usize) -> usize {
        bucket(field_hash(key.first().as_bytes()), num_partitions)
    }

    fn partition_raw(&self, key: &[u8], num_partitions: usize) -> Result<usize> {
        let (first, _) = read_field(key)?;
        Ok(bucket(field_hash(first), num_partitions))
    }
}

/// The engine default: partitions on the combined hash of both parts.
///
/// Spreads keys sharing `first` across partitions, so it must not be used
/// together with `GroupComparator`.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyHashPartitioner;

impl Partitioner for KeyHashPartitioner {
    fn partition(&self, key: &CompositeKey, num_partitions: usize) -> usize {
        bucket(key.hash_code(), num_partitions)
    }

    fn partition_raw(&self, key: &[u8], num_partitions: usize) -> Result<usize> {
        Ok(self.partition(&CompositeKey::decode(key)?, num_partitions))
    }
}

/// `abs(hash) mod num_partitions`.
///
/// `unsigned_abs` keeps `i32::MIN` at 2^31 instead of wrapping back to a
/// negative value.
fn bucket(hash: i32, num_partitions: usize) -> usize {
    assert!(num_partitions > 0, "num_partitions must be > 0");
    hash.unsigned_abs() as usize % num_partitions
}

/// Partition index in `[0, num_partitions)` computed from `key.first` only.
///
/// # Panics
/// Panics if `num_partitions` is 0.
pub fn partition(key: &CompositeKey, num_partitions: usize) -> usize {
    FirstPartitioner.partition(key, num_partitions)
}

/// `partition` over a serialized key at `buf[offset..offset + len]`.
///
/// Hashes `first`'s bytes in place without decoding the key.
///
/// # Panics
/// Panics if `num_partitions` is 0.
pub fn partition_raw(buf: &[u8], offset: usize, len: usize, num_partitions: usize) -> Result<usize> {
    FirstPartitioner.partition_raw(key_range(buf, offset, len)?, num_partitions)
}
