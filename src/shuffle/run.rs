use std::cmp::Ordering;
use std::ops::Range;

use tracing::{trace, warn};

use crate::comparator::RawComparator;
use crate::error::{Error, Result};
use crate::key::CompositeKey;

// Header sizes
const CRC_SIZE: usize = 4;
const KEY_LEN_SIZE: usize = 4;
const VALUE_LEN_SIZE: usize = 4;
const HEADER_SIZE: usize = CRC_SIZE + KEY_LEN_SIZE + VALUE_LEN_SIZE;

/// Location of one record inside a run's buffer.
#[derive(Debug, Clone)]
struct RecordSpan {
    key: Range<usize>,
    value: Range<usize>,
}

/// One sorted shuffle partition as a single byte buffer.
///
/// Every record is framed:
/// ```text
/// ┌──────────┬──────────────┬────────────────┬─────────────┬───────────┐
/// │ CRC (4B) │ Key Len (4B) │ Value Len (4B) │ Key (var)   │ Value (var)│
/// └──────────┴──────────────┴────────────────┴─────────────┴───────────┘
/// ```
///
/// CRC covers everything after the CRC field. Keys stay serialized, so the
/// grouping pass compares them in place with `compare_raw_at`.
#[derive(Debug, Clone, Default)]
pub struct SortedRun {
    data: Vec<u8>,
    records: Vec<RecordSpan>,
}

impl SortedRun {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record. Records MUST be appended in sort order.
    ///
    /// # Panics
    /// Panics if the key or value is longer than `u32::MAX` bytes.
    pub fn push(&mut self, key: &[u8], value: &[u8]) {
        let key_len = u32::try_from(key.len()).expect("key longer than u32::MAX");
        let value_len = u32::try_from(value.len()).expect("value longer than u32::MAX");

        let frame_start = self.data.len();
        // Reserve space for CRC (filled in below)
        self.data.extend_from_slice(&[0u8; CRC_SIZE]);
        self.data.extend_from_slice(&key_len.to_le_bytes());
        self.data.extend_from_slice(&value_len.to_le_bytes());

        let key_start = self.data.len();
        self.data.extend_from_slice(key);
        let value_start = self.data.len();
        self.data.extend_from_slice(value);

        let crc = crc32fast::hash(&self.data[frame_start + CRC_SIZE..]);
        self.data[frame_start..frame_start + CRC_SIZE].copy_from_slice(&crc.to_le_bytes());

        self.records.push(RecordSpan {
            key: key_start..value_start,
            value: value_start..self.data.len(),
        });
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The framed byte image of this run.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Parse a framed byte image, verifying every record's CRC.
    pub fn decode(data: Vec<u8>) -> Result<Self> {
        let mut records = Vec::new();
        let mut offset = 0usize;

        while offset < data.len() {
            let remaining = &data[offset..];
            if remaining.len() < HEADER_SIZE {
                warn!(offset, "truncated run record header");
                return Err(Error::Corruption("run record header truncated".into()));
            }

            let stored_crc = read_u32(&remaining[0..4]);
            let key_len = read_u32(&remaining[4..8]) as usize;
            let value_len = read_u32(&remaining[8..12]) as usize;

            let total_len = match HEADER_SIZE
                .checked_add(key_len)
                .and_then(|n| n.checked_add(value_len))
            {
                Some(total_len) if total_len <= remaining.len() => total_len,
                _ => {
                    warn!(offset, key_len, value_len, "truncated run record");
                    return Err(Error::Corruption("run record truncated".into()));
                }
            };

            let computed_crc = crc32fast::hash(&remaining[CRC_SIZE..total_len]);
            if stored_crc != computed_crc {
                warn!(offset, "run record CRC mismatch");
                return Err(Error::Corruption(format!(
                    "CRC mismatch in run record at offset {offset}"
                )));
            }

            let key_start = offset + HEADER_SIZE;
            let value_start = key_start + key_len;
            records.push(RecordSpan {
                key: key_start..value_start,
                value: value_start..value_start + value_len,
            });
            offset += total_len;
        }

        Ok(SortedRun { data, records })
    }

    /// The record at `index`.
    ///
    /// # Panics
    /// Panics if `index >= len()`.
    pub fn record(&self, index: usize) -> Record<'_> {
        let span = &self.records[index];
        Record {
            key: &self.data[span.key.clone()],
            value: &self.data[span.value.clone()],
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Record<'_>> {
        (0..self.len()).map(|i| self.record(i))
    }

    /// Split the run into reduce groups using `grouping`.
    pub fn groups<'a>(&'a self, grouping: &'a dyn RawComparator) -> Groups<'a> {
        Groups {
            run: self,
            grouping,
            next: 0,
            failed: false,
        }
    }

    fn compare_keys(&self, grouping: &dyn RawComparator, a: usize, b: usize) -> Result<Ordering> {
        let a = &self.records[a].key;
        let b = &self.records[b].key;
        grouping.compare_raw_at(&self.data, a.start, a.len(), &self.data, b.start, b.len())
    }
}

fn read_u32(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// A borrowed (key, value) record. The key is still serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record<'a> {
    pub key: &'a [u8],
    pub value: &'a [u8],
}

impl Record<'_> {
    /// Decode the serialized key.
    pub fn decode_key(&self) -> Result<CompositeKey> {
        CompositeKey::decode(self.key)
    }
}

/// Iterator over the reduce groups of a sorted run.
///
/// A group is a maximal run of consecutive records whose keys the grouping
/// comparator calls equal. Each record is compared against the first record
/// of its group. Stops after the first malformed key.
pub struct Groups<'a> {
    run: &'a SortedRun,
    grouping: &'a dyn RawComparator,
    next: usize,
    failed: bool,
}

impl<'a> Iterator for Groups<'a> {
    type Item = Result<Group<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.next >= self.run.len() {
            return None;
        }

        let start = self.next;
        let mut end = start + 1;
        while end < self.run.len() {
            match self.run.compare_keys(self.grouping, start, end) {
                Ok(Ordering::Equal) => end += 1,
                Ok(_) => break,
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e));
                }
            }
        }

        trace!(start, end, "group boundary");
        self.next = end;
        Some(Ok(Group {
            run: self.run,
            range: start..end,
        }))
    }
}

/// One reduce group: the records a single reduce call consumes.
#[derive(Debug, Clone)]
pub struct Group<'a> {
    run: &'a SortedRun,
    range: Range<usize>,
}

impl<'a> Group<'a> {
    /// The key of the group's first record.
    pub fn key(&self) -> Result<CompositeKey> {
        self.run.record(self.range.start).decode_key()
    }

    /// Every record's key, in sort order.
    pub fn keys(&self) -> Result<Vec<CompositeKey>> {
        self.records().map(|r| r.decode_key()).collect()
    }

    /// The group's values, in sort order.
    pub fn values(&self) -> impl Iterator<Item = &'a [u8]> + '_ {
        self.records().map(|r| r.value)
    }

    pub fn records(&self) -> impl Iterator<Item = Record<'a>> + '_ {
        self.range.clone().map(|i| self.run.record(i))
    }

    pub fn len(&self) -> usize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }
}
