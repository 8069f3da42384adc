//! Compact length encoding used for every count and length in a serialized message.
//!
//! The first two bytes carry 7 bits each, low bits first, with the top bit
//! flagging that another byte follows. A third byte, when present, carries a
//! full 8 bits. Values up to [`MAX_VALUE`] are representable.

use crate::error::Error;

/// Largest value that fits in three bytes (7 + 7 + 8 bits).
pub const MAX_VALUE: u32 = 0x3F_FFFF;

const CONTINUATION: u8 = 0x80;
const PAYLOAD: u8 = 0x7f;

/// Decodes one value starting at `offset`.
///
/// Returns the value and the offset just past it. Running off the end of
/// `buf` yields `(0, offset)`: callers detect the lack of progress and abort.
pub fn decode(buf: &[u8], offset: usize) -> (u32, usize) {
    let Some(&first) = buf.get(offset) else {
        return (0, offset);
    };
    if first & CONTINUATION == 0 {
        return (u32::from(first), offset + 1);
    }

    let Some(&second) = buf.get(offset + 1) else {
        return (0, offset);
    };
    let low = u32::from(first & PAYLOAD) | (u32::from(second & PAYLOAD) << 7);
    if second & CONTINUATION == 0 {
        return (low, offset + 2);
    }

    let Some(&third) = buf.get(offset + 2) else {
        return (0, offset);
    };
    (low | (u32::from(third) << 14), offset + 3)
}

/// Appends the minimal encoding of `value` to `out`.
pub fn encode(value: u32, out: &mut Vec<u8>) -> Result<(), Error> {
    if value > MAX_VALUE {
        return Err(Error::VarintOverflow { value });
    }
    if value < 0x80 {
        out.push(value as u8);
    } else if value < 0x4000 {
        out.push((value as u8 & PAYLOAD) | CONTINUATION);
        out.push((value >> 7) as u8);
    } else {
        out.push((value as u8 & PAYLOAD) | CONTINUATION);
        out.push(((value >> 7) as u8 & PAYLOAD) | CONTINUATION);
        out.push((value >> 14) as u8);
    }
    Ok(())
}

/// Number of bytes [`encode`] produces for `value`.
pub fn encoded_len(value: u32) -> usize {
    match value {
        0..0x80 => 1,
        0x80..0x4000 => 2,
        _ => 3,
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "test assertions")]
mod tests {
    use super::{MAX_VALUE, decode, encode, encoded_len};
    use crate::error::Error;

    fn encoded(value: u32) -> Vec<u8> {
        let mut out = Vec::new();
        encode(value, &mut out).unwrap();
        out
    }

    #[test]
    fn single_byte_values() {
        assert_eq!(decode(&[0x00], 0), (0, 1));
        assert_eq!(decode(&[0x01], 0), (1, 1));
        assert_eq!(decode(&[0x7f], 0), (127, 1));
    }

    #[test]
    fn two_byte_values_are_little_endian_base_128() {
        assert_eq!(decode(&[0x80, 0x01], 0), (128, 2));
        assert_eq!(decode(&[0xff, 0x01], 0), (255, 2));
        assert_eq!(decode(&[0xac, 0x02], 0), (300, 2));
        assert_eq!(decode(&[0xff, 0x7f], 0), (0x3fff, 2));
    }

    #[test]
    fn three_byte_values() {
        assert_eq!(decode(&[0x80, 0x80, 0x01], 0), (0x4000, 3));
        assert_eq!(decode(&[0xff, 0xff, 0x03], 0), (0xffff, 3));
        assert_eq!(decode(&[0xff, 0xff, 0xff], 0), (MAX_VALUE, 3));
    }

    #[test]
    fn decode_respects_offset() {
        let data = [0xaa, 0xbb, 0x05, 0x80, 0x01];
        assert_eq!(decode(&data, 2), (5, 3));
        assert_eq!(decode(&data, 3), (128, 5));
    }

    #[test]
    fn truncated_input_makes_no_progress() {
        assert_eq!(decode(&[], 0), (0, 0));
        assert_eq!(decode(&[0x00], 1), (0, 1));
        assert_eq!(decode(&[0x80], 0), (0, 0));
        assert_eq!(decode(&[0x80, 0x80], 0), (0, 0));
        assert_eq!(decode(&[0x01, 0xff, 0xff], 1), (0, 1));
    }

    #[test]
    fn roundtrip_covers_all_length_classes() {
        let upper = (1_u32 << 14) + (1_u32 << 21) - 1;
        let mut bytes = Vec::with_capacity(3);
        for value in 0..=upper {
            bytes.clear();
            encode(value, &mut bytes).unwrap();
            assert_eq!(bytes.len(), encoded_len(value), "length mismatch for {value}");
            assert_eq!(decode(&bytes, 0), (value, bytes.len()), "roundtrip failed for {value}");
        }
        for edge in [0x7f, 0x80, 0x3fff, 0x4000, upper, MAX_VALUE] {
            let bytes = encoded(edge);
            assert_eq!(decode(&bytes, 0), (edge, bytes.len()));
        }
    }

    #[test]
    fn encoding_is_minimal() {
        assert_eq!(encoded(0x7f), vec![0x7f]);
        assert_eq!(encoded(0x80), vec![0x80, 0x01]);
        assert_eq!(encoded(0x3fff), vec![0xff, 0x7f]);
        assert_eq!(encoded(0x4000), vec![0x80, 0x80, 0x01]);
    }

    #[test]
    fn encode_rejects_values_beyond_three_bytes() {
        let mut out = Vec::new();
        assert!(matches!(
            encode(MAX_VALUE + 1, &mut out),
            Err(Error::VarintOverflow { value }) if value == MAX_VALUE + 1
        ));
        assert!(out.is_empty());
    }
}
