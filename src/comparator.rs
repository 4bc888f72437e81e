use std::cmp::Ordering;

use crate::coding::read_field;
use crate::error::{Error, Result};
use crate::key::CompositeKey;

/// Sort direction, fixed when a comparator is built.
///
/// Applied to the final result only, so both key parts always flip
/// together. Flipping never turns a zero into a non-zero, which keeps group
/// membership independent of direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

impl Direction {
    pub fn from_ascending(ascending: bool) -> Self {
        if ascending {
            Direction::Ascending
        } else {
            Direction::Descending
        }
    }

    pub fn is_ascending(self) -> bool {
        self == Direction::Ascending
    }

    #[inline]
    pub fn apply(self, ord: Ordering) -> Ordering {
        match self {
            Direction::Ascending => ord,
            Direction::Descending => ord.reverse(),
        }
    }
}

/// Unsigned lexicographic comparison of two byte ranges.
///
/// Every ordering in the crate bottoms out here, on both the object path
/// and the raw path.
#[inline]
pub fn compare_bytes(a: &[u8], b: &[u8]) -> Ordering {
    a.cmp(b)
}

/// An ordering over `CompositeKey` that the shuffle plugs in.
///
/// `compare_raw` works on serialized keys and must return exactly what
/// `compare` returns for the decoded keys. It decodes length prefixes only
/// and never allocates.
pub trait RawComparator: Send + Sync {
    fn compare(&self, a: &CompositeKey, b: &CompositeKey) -> Ordering;

    fn compare_raw(&self, a: &[u8], b: &[u8]) -> Result<Ordering>;

    /// `compare_raw` over `buf[offset..offset + len]` ranges.
    fn compare_raw_at(
        &self,
        b1: &[u8],
        s1: usize,
        l1: usize,
        b2: &[u8],
        s2: usize,
        l2: usize,
    ) -> Result<Ordering> {
        self.compare_raw(key_range(b1, s1, l1)?, key_range(b2, s2, l2)?)
    }
}

/// Sort-phase order: first, then second.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FullComparator {
    direction: Direction,
}

impl FullComparator {
    pub fn new(direction: Direction) -> Self {
        FullComparator { direction }
    }

    pub fn ascending() -> Self {
        Self::new(Direction::Ascending)
    }

    pub fn descending() -> Self {
        Self::new(Direction::Descending)
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }
}

impl RawComparator for FullComparator {
    fn compare(&self, a: &CompositeKey, b: &CompositeKey) -> Ordering {
        self.direction.apply(a.cmp(b))
    }

    fn compare_raw(&self, a: &[u8], b: &[u8]) -> Result<Ordering> {
        let (a_first, a_used) = read_field(a)?;
        let (b_first, b_used) = read_field(b)?;
        let ord = compare_bytes(a_first, b_first);
        if ord != Ordering::Equal {
            return Ok(self.direction.apply(ord));
        }

        let (a_second, _) = read_field(&a[a_used..])?;
        let (b_second, _) = read_field(&b[b_used..])?;
        Ok(self.direction.apply(compare_bytes(a_second, b_second)))
    }
}

/// Grouping-phase order: first only.
///
/// Two consecutive sorted records belong to the same reduce group iff this
/// returns `Equal` for their keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupComparator {
    direction: Direction,
}

impl GroupComparator {
    pub fn new(direction: Direction) -> Self {
        GroupComparator { direction }
    }

    pub fn ascending() -> Self {
        Self::new(Direction::Ascending)
    }

    pub fn descending() -> Self {
        Self::new(Direction::Descending)
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }
}

impl RawComparator for GroupComparator {
    fn compare(&self, a: &CompositeKey, b: &CompositeKey) -> Ordering {
        self.direction
            .apply(compare_bytes(a.first().as_bytes(), b.first().as_bytes()))
    }

    fn compare_raw(&self, a: &[u8], b: &[u8]) -> Result<Ordering> {
        let (a_first, _) = read_field(a)?;
        let (b_first, _) = read_field(b)?;
        Ok(self.direction.apply(compare_bytes(a_first, b_first)))
    }
}

/// Slice `buf[offset..offset + len]`, rejecting ranges outside the buffer.
pub(crate) fn key_range(buf: &[u8], offset: usize, len: usize) -> Result<&[u8]> {
    offset
        .checked_add(len)
        .and_then(|end| buf.get(offset..end))
        .ok_or_else(|| {
            Error::MalformedKey(format!(
                "key range {offset}..+{len} outside buffer of {} bytes",
                buf.len()
            ))
        })
}

/// Full order over two keys. Returns -1, 0 or 1.
pub fn full_compare(a: &CompositeKey, b: &CompositeKey, ascending: bool) -> i32 {
    FullComparator::new(Direction::from_ascending(ascending)).compare(a, b) as i32
}

/// Full order over two serialized keys at `buf[off..off + len]`. Returns -1, 0 or 1.
pub fn full_compare_raw(
    buf1: &[u8],
    off1: usize,
    len1: usize,
    buf2: &[u8],
    off2: usize,
    len2: usize,
    ascending: bool,
) -> Result<i32> {
    FullComparator::new(Direction::from_ascending(ascending))
        .compare_raw_at(buf1, off1, len1, buf2, off2, len2)
        .map(|ord| ord as i32)
}

/// First-only order over two keys. Returns -1, 0 or 1.
pub fn group_compare(a: &CompositeKey, b: &CompositeKey, ascending: bool) -> i32 {
    GroupComparator::new(Direction::from_ascending(ascending)).compare(a, b) as i32
}

/// First-only order over two serialized keys at `buf[off..off + len]`. Returns -1, 0 or 1.
pub fn group_compare_raw(
    buf1: &[u8],
    off1: usize,
    len1: usize,
    buf2: &[u8],
    off2: usize,
    len2: usize,
    ascending: bool,
) -> Result<i32> {
    GroupComparator::new(Direction::from_ascending(ascending))
        .compare_raw_at(buf1, off1, len1, buf2, off2, len2)
        .map(|ord| ord as i32)
}
