use crate::error::{Error, Result};

/// Maximum encoded size of a u64 varint.
pub const MAX_VARINT_LEN: usize = 10;

/// Append `value` as an unsigned LEB128 varint.
///
/// ```text
/// 7 payload bits per byte, least significant group first.
/// High bit set = more bytes follow.
///
///     0 → [0x00]
///   127 → [0x7F]
///   128 → [0x80, 0x01]
///   300 → [0xAC, 0x02]
/// ```
pub fn put_varint(buf: &mut Vec<u8>, mut value: u64) {
    while value >= 0x80 {
        buf.push((value as u8) | 0x80);
        value >>= 7;
    }
    buf.push(value as u8);
}

/// Number of bytes `put_varint` writes for `value`.
pub fn varint_len(value: u64) -> usize {
    let bits = 64 - (value | 1).leading_zeros() as usize;
    bits.div_ceil(7)
}

/// Decode a varint from the front of `data`, returning (value, bytes_consumed).
pub fn decode_varint(data: &[u8]) -> Result<(u64, usize)> {
    let mut value = 0u64;
    for (i, &byte) in data.iter().take(MAX_VARINT_LEN).enumerate() {
        // The 10th byte may only contribute the single remaining bit.
        if i == MAX_VARINT_LEN - 1 && byte > 0x01 {
            return Err(Error::MalformedKey("varint overflows u64".into()));
        }
        value |= u64::from(byte & 0x7F) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }
    Err(Error::MalformedKey("length prefix truncated".into()))
}

/// Append a length-prefixed field: [len (varint)][bytes].
pub fn put_field(buf: &mut Vec<u8>, bytes: &[u8]) {
    put_varint(buf, bytes.len() as u64);
    buf.extend_from_slice(bytes);
}

/// Encoded size of a length-prefixed field holding `len` bytes.
pub fn field_len(len: usize) -> usize {
    varint_len(len as u64) + len
}

/// Parse one length-prefixed field from the front of `data`.
///
/// Returns the payload slice and the total bytes consumed (prefix + payload).
/// Only the prefix is decoded; the payload is never inspected.
pub fn read_field(data: &[u8]) -> Result<(&[u8], usize)> {
    let (len, prefix) = decode_varint(data)?;
    let len = usize::try_from(len)
        .map_err(|_| Error::MalformedKey(format!("field length {len} does not fit in memory")))?;
    let end = prefix
        .checked_add(len)
        .filter(|&end| end <= data.len())
        .ok_or_else(|| {
            Error::MalformedKey(format!(
                "field declares {len} bytes but only {} remain",
                data.len() - prefix
            ))
        })?;
    Ok((&data[prefix..end], end))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn varint_known_encodings() {
        for (value, expected) in [
            (0u64, vec![0x00]),
            (127, vec![0x7F]),
            (128, vec![0x80, 0x01]),
            (300, vec![0xAC, 0x02]),
        ] {
            let mut buf = Vec::new();
            put_varint(&mut buf, value);
            assert_eq!(buf, expected);
            assert_eq!(varint_len(value), expected.len());
            assert_eq!(decode_varint(&buf).unwrap(), (value, expected.len()));
        }
    }

    #[test]
    fn varint_max_value() {
        let mut buf = Vec::new();
        put_varint(&mut buf, u64::MAX);
        assert_eq!(buf.len(), MAX_VARINT_LEN);
        assert_eq!(varint_len(u64::MAX), MAX_VARINT_LEN);
        assert_eq!(decode_varint(&buf).unwrap(), (u64::MAX, MAX_VARINT_LEN));
    }

    #[test]
    fn varint_overflow_rejected() {
        let mut buf = vec![0xFF; MAX_VARINT_LEN - 1];
        buf.push(0x02);
        assert!(decode_varint(&buf).is_err());
        assert!(decode_varint(&[0x80; 11]).is_err());
    }

    #[test]
    fn truncated_prefix_rejected() {
        assert!(decode_varint(&[]).is_err());
        assert!(decode_varint(&[0x80]).is_err());
        assert!(read_field(&[0xAC]).is_err());
    }

    #[test]
    fn field_overrun_rejected() {
        // Declares 10 bytes, supplies 3.
        let err = read_field(&[10, b'a', b'b', b'c']).unwrap_err();
        assert!(matches!(err, Error::MalformedKey(_)));
    }

    #[test]
    fn field_roundtrip_leaves_tail() {
        let mut buf = Vec::new();
        put_field(&mut buf, b"alpha");
        buf.extend_from_slice(b"tail");
        let (payload, consumed) = read_field(&buf).unwrap();
        assert_eq!(payload, b"alpha");
        assert_eq!(consumed, field_len(5));
        assert_eq!(&buf[consumed..], b"tail");
    }
}
