//! # Secondary sort keys
//!
//! A two-part key for shuffle engines that sort by (first, second) but
//! partition and group by `first` alone. The reducer then receives each
//! `first` value once, with its values already ordered by `second`.
//!
//! ## Core idea
//! Three orderings ride on one key:
//! - full order (sort phase): first, then second
//! - partitioning: hash of first only
//! - grouping: first only
//!
//! Equal `first` must mean same partition and same group, otherwise a group
//! gets split across reducers. Every ordering also works directly on the
//! serialized key, decoding only the length prefixes, because the sort
//! phase compares O(n log n) times.

pub mod coding;
pub mod comparator;
pub mod error;
pub mod key;
pub mod partition;
pub mod shuffle;

// Public re-exports for the top-level API
pub use comparator::{
    Direction, FullComparator, GroupComparator, RawComparator, full_compare, full_compare_raw,
    group_compare, group_compare_raw,
};
pub use error::{Error, Result};
pub use key::{CompositeKey, field_hash};
pub use partition::{FirstPartitioner, KeyHashPartitioner, Partitioner, partition, partition_raw};
pub use shuffle::{Shuffle, ShuffleOptions, ShuffleOutput};
