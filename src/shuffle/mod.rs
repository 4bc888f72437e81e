pub mod run;

use std::cmp::Ordering;

use tracing::debug;

pub use run::{Group, Groups, Record, SortedRun};

use crate::comparator::{Direction, FullComparator, GroupComparator, RawComparator};
use crate::error::{Error, Result};
use crate::key::CompositeKey;
use crate::partition::{FirstPartitioner, Partitioner};

/// Job-time settings the shuffle needs from the job configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShuffleOptions {
    /// Number of reduce partitions. Must be > 0.
    pub num_partitions: usize,
    /// Sort direction, applied to both the sort and the grouping order.
    pub direction: Direction,
}

impl Default for ShuffleOptions {
    fn default() -> Self {
        ShuffleOptions {
            num_partitions: 1,
            direction: Direction::Ascending,
        }
    }
}

impl ShuffleOptions {
    pub fn with_partitions(mut self, num_partitions: usize) -> Self {
        self.num_partitions = num_partitions;
        self
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }
}

/// Unsorted records collected for one partition.
///
/// Keys and values are appended to one arena; entries point into it.
#[derive(Default)]
struct PartitionBuffer {
    data: Vec<u8>,
    entries: Vec<Entry>,
}

#[derive(Clone, Copy)]
struct Entry {
    offset: usize,
    key_len: usize,
    value_len: usize,
}

impl PartitionBuffer {
    fn key(&self, entry: &Entry) -> &[u8] {
        &self.data[entry.offset..entry.offset + entry.key_len]
    }

    fn value(&self, entry: &Entry) -> &[u8] {
        let start = entry.offset + entry.key_len;
        &self.data[start..start + entry.value_len]
    }
}

/// In-process collect → partition → sort pipeline.
///
/// The three orderings are pluggable strategy objects:
/// - `partitioner` routes each emitted record to a partition
/// - `sort` orders records inside a partition (raw path only)
/// - `grouping` delimits reduce groups when the sorted output is read
///
/// Secondary sort needs all three to agree that equal `first` means same
/// partition and same group; `Shuffle::secondary_sort` wires that triple.
pub struct Shuffle {
    options: ShuffleOptions,
    partitioner: Box<dyn Partitioner>,
    sort: Box<dyn RawComparator>,
    grouping: Box<dyn RawComparator>,
    partitions: Vec<PartitionBuffer>,
    len: usize,
}

impl Shuffle {
    /// Build a shuffle from arbitrary strategies.
    ///
    /// # Panics
    /// Panics if `options.num_partitions` is 0.
    pub fn new(
        options: ShuffleOptions,
        partitioner: impl Partitioner + 'static,
        sort: impl RawComparator + 'static,
        grouping: impl RawComparator + 'static,
    ) -> Self {
        assert!(options.num_partitions > 0, "num_partitions must be > 0");
        let partitions = (0..options.num_partitions)
            .map(|_| PartitionBuffer::default())
            .collect();
        Shuffle {
            options,
            partitioner: Box::new(partitioner),
            sort: Box::new(sort),
            grouping: Box::new(grouping),
            partitions,
            len: 0,
        }
    }

    /// Partition by `first`, sort by (first, second), group by `first`.
    pub fn secondary_sort(options: ShuffleOptions) -> Self {
        Self::new(
            options,
            FirstPartitioner,
            FullComparator::new(options.direction),
            GroupComparator::new(options.direction),
        )
    }

    pub fn options(&self) -> &ShuffleOptions {
        &self.options
    }

    /// Accept one record from a producing stage.
    pub fn emit(&mut self, key: &CompositeKey, value: &[u8]) {
        let p = self.partitioner.partition(key, self.options.num_partitions);
        let buffer = &mut self.partitions[p];
        let offset = buffer.data.len();
        key.encode_into(&mut buffer.data);
        let key_len = buffer.data.len() - offset;
        buffer.data.extend_from_slice(value);
        buffer.entries.push(Entry {
            offset,
            key_len,
            value_len: value.len(),
        });
        self.len += 1;
    }

    /// Accept one record whose key is already serialized.
    ///
    /// The whole key is checked before it is buffered, so a malformed key
    /// fails here with `MalformedKey` and never reaches the sort.
    pub fn emit_raw(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        CompositeKey::validate(key)?;
        let p = self
            .partitioner
            .partition_raw(key, self.options.num_partitions)?;
        let buffer = &mut self.partitions[p];
        let offset = buffer.data.len();
        buffer.data.extend_from_slice(key);
        buffer.data.extend_from_slice(value);
        buffer.entries.push(Entry {
            offset,
            key_len: key.len(),
            value_len: value.len(),
        });
        self.len += 1;
        Ok(())
    }

    /// Total records emitted.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Sort every partition and hand back the sorted runs.
    ///
    /// Every buffered key is well-formed, so the built-in comparators never
    /// fail here. A custom comparator's error aborts the whole shuffle.
    pub fn finish(self) -> Result<ShuffleOutput> {
        let mut runs = Vec::with_capacity(self.partitions.len());

        for (p, mut buffer) in self.partitions.into_iter().enumerate() {
            let mut first_err: Option<Error> = None;
            let mut entries = std::mem::take(&mut buffer.entries);
            entries.sort_by(|a, b| {
                match self.sort.compare_raw(buffer.key(a), buffer.key(b)) {
                    Ok(ord) => ord,
                    Err(e) => {
                        first_err.get_or_insert(e);
                        Ordering::Equal
                    }
                }
            });
            if let Some(e) = first_err {
                return Err(e);
            }

            let mut run = SortedRun::new();
            for entry in &entries {
                run.push(buffer.key(entry), buffer.value(entry));
            }
            debug!(partition = p, records = run.len(), "sorted shuffle partition");
            runs.push(run);
        }

        Ok(ShuffleOutput {
            runs,
            grouping: self.grouping,
        })
    }
}

/// Sorted partitions plus the grouping order to read them with.
pub struct ShuffleOutput {
    runs: Vec<SortedRun>,
    grouping: Box<dyn RawComparator>,
}

impl ShuffleOutput {
    pub fn num_partitions(&self) -> usize {
        self.runs.len()
    }

    /// The sorted run of partition `p`.
    ///
    /// # Panics
    /// Panics if `p >= num_partitions()`.
    pub fn run(&self, p: usize) -> &SortedRun {
        &self.runs[p]
    }

    /// Reduce groups of partition `p`, in sort order.
    ///
    /// # Panics
    /// Panics if `p >= num_partitions()`.
    pub fn groups(&self, p: usize) -> Groups<'_> {
        self.runs[p].groups(self.grouping.as_ref())
    }

    /// Call `reduce` once per group of every partition, partition by
    /// partition. Stops at the first error.
    pub fn reduce<F>(&self, mut reduce: F) -> Result<()>
    where
        F: FnMut(usize, &Group<'_>) -> Result<()>,
    {
        for p in 0..self.runs.len() {
            for group in self.groups(p) {
                reduce(p, &group?)?;
            }
        }
        Ok(())
    }

    pub fn into_runs(self) -> Vec<SortedRun> {
        self.runs
    }
}
