use std::cmp::Ordering;
use std::fmt;

use xxhash_rust::xxh3::xxh3_64;

use crate::coding::{field_len, put_field, read_field};
use crate::comparator::compare_bytes;
use crate::error::{Error, Result};

/// Two-part key used for secondary sort.
///
/// Records are sorted by (first, second) but partitioned and grouped by
/// `first` alone, so a reducer sees every record of one `first` value in a
/// single call, with the values already ordered by `second`.
///
/// Encoded format:
/// ```text
/// ┌────────────────────┬─────────────┬─────────────────────┬──────────────┐
/// │ first len (varint) │ first bytes │ second len (varint) │ second bytes │
/// └────────────────────┴─────────────┴─────────────────────┴──────────────┘
/// ```
///
/// The length prefixes let a raw comparator find field boundaries without
/// decoding the payload as text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct CompositeKey {
    first: String,
    second: String,
}

impl CompositeKey {
    /// Create a key from its two parts. Either part may be empty.
    pub fn new(first: impl Into<String>, second: impl Into<String>) -> Self {
        CompositeKey {
            first: first.into(),
            second: second.into(),
        }
    }

    pub fn first(&self) -> &str {
        &self.first
    }

    pub fn second(&self) -> &str {
        &self.second
    }

    /// Replace both parts at once. Lets a producer reuse one key per record.
    pub fn set(&mut self, first: impl Into<String>, second: impl Into<String>) {
        self.first = first.into();
        self.second = second.into();
    }

    /// Serialize into a freshly allocated buffer.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        self.encode_into(&mut buf);
        buf
    }

    /// Append the encoding to `buf`.
    pub fn encode_into(&self, buf: &mut Vec<u8>) {
        put_field(buf, self.first.as_bytes());
        put_field(buf, self.second.as_bytes());
    }

    /// Exact size of `encode()`'s output.
    pub fn encoded_len(&self) -> usize {
        field_len(self.first.len()) + field_len(self.second.len())
    }

    /// Deserialize a key that occupies all of `data`.
    pub fn decode(data: &[u8]) -> Result<Self> {
        let (first, second) = split_exact(data)?;
        Ok(CompositeKey {
            first: utf8_field(first, "first")?.to_owned(),
            second: utf8_field(second, "second")?.to_owned(),
        })
    }

    /// Deserialize a key from the front of `data`, returning (key, bytes_consumed).
    pub fn decode_prefix(data: &[u8]) -> Result<(Self, usize)> {
        let (first, second, consumed) = split_fields(data)?;
        let key = CompositeKey {
            first: utf8_field(first, "first")?.to_owned(),
            second: utf8_field(second, "second")?.to_owned(),
        };
        Ok((key, consumed))
    }

    /// Check that `data` is exactly one well-formed key, without allocating.
    ///
    /// Accepts exactly what `decode` accepts.
    pub fn validate(data: &[u8]) -> Result<()> {
        let (first, second) = split_exact(data)?;
        utf8_field(first, "first")?;
        utf8_field(second, "second")?;
        Ok(())
    }

    /// Combining hash: `hash(first) * 163 + hash(second)`.
    ///
    /// Equal keys hash equally. Used by `KeyHashPartitioner`; secondary sort
    /// partitions on `field_hash(first)` instead.
    pub fn hash_code(&self) -> i32 {
        field_hash(self.first.as_bytes())
            .wrapping_mul(163)
            .wrapping_add(field_hash(self.second.as_bytes()))
    }
}

/// Hash of one field's raw bytes.
///
/// Low 32 bits of xxh3-64, so the value is identical in every process and
/// on every platform. Partition routing depends on that.
pub fn field_hash(bytes: &[u8]) -> i32 {
    xxh3_64(bytes) as i32
}

/// Locate both fields at the front of `data`: (first, second, bytes_consumed).
fn split_fields(data: &[u8]) -> Result<(&[u8], &[u8], usize)> {
    let (first, first_len) = read_field(data)?;
    let (second, second_len) = read_field(&data[first_len..])?;
    Ok((first, second, first_len + second_len))
}

/// Like `split_fields`, but the key must fill all of `data`.
fn split_exact(data: &[u8]) -> Result<(&[u8], &[u8])> {
    let (first, second, consumed) = split_fields(data)?;
    if consumed != data.len() {
        return Err(Error::MalformedKey(format!(
            "{} trailing bytes after key",
            data.len() - consumed
        )));
    }
    Ok((first, second))
}

fn utf8_field<'a>(bytes: &'a [u8], name: &str) -> Result<&'a str> {
    std::str::from_utf8(bytes)
        .map_err(|e| Error::MalformedKey(format!("{name} field is not UTF-8: {e}")))
}

/// Ascending full order: first, then second, byte-wise.
impl Ord for CompositeKey {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_bytes(self.first.as_bytes(), other.first.as_bytes())
            .then_with(|| compare_bytes(self.second.as_bytes(), other.second.as_bytes()))
    }
}

impl PartialOrd for CompositeKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}", self.first, self.second)
    }
}

impl From<(&str, &str)> for CompositeKey {
    fn from((first, second): (&str, &str)) -> Self {
        CompositeKey::new(first, second)
    }
}
