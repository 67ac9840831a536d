//! Unsigned LEB128-style varints: 7 value bits per byte, high bit set on
//! every byte except the last.

use std::io::{self, Read};

/// Longest encoding of a `u32`.
pub const MAX_LEN: usize = 5;

/// Encoded size of `value` in bytes.
#[inline]
pub const fn encoded_len(mut value: u32) -> usize {
    let mut len = 1;
    while value >= 0x80 {
        value >>= 7;
        len += 1;
    }
    len
}

/// Append the encoding of `value` to `buf`.
#[inline]
pub fn encode_into(mut value: u32, buf: &mut Vec<u8>) {
    while value >= 0x80 {
        buf.push((value & 0x7F) as u8 | 0x80);
        value >>= 7;
    }
    buf.push(value as u8);
}

/// Read one varint from `reader`.
pub fn read<R: Read>(reader: &mut R) -> io::Result<u32> {
    let mut value = 0u32;
    for i in 0..MAX_LEN {
        let mut byte = [0u8; 1];
        reader.read_exact(&mut byte)?;
        value |= ((byte[0] & 0x7F) as u32) << (7 * i);
        if byte[0] & 0x80 == 0 {
            return Ok(value);
        }
    }
    Err(io::Error::new(io::ErrorKind::InvalidData, "varint longer than 5 bytes"))
}

/// Decode a whole buffer of back-to-back varints.
pub fn decode_all(mut bytes: &[u8]) -> io::Result<Vec<u32>> {
    let mut out = Vec::new();
    while !bytes.is_empty() {
        out.push(read(&mut bytes)?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_300() {
        let mut buf = Vec::new();
        encode_into(300, &mut buf);
        assert_eq!(buf, [0xAC, 0x02]);
        assert_eq!(read(&mut &buf[..]).unwrap(), 300);
    }

    #[test]
    fn test_encoded_len_boundaries() {
        assert_eq!(encoded_len(0), 1);
        assert_eq!(encoded_len(127), 1);
        assert_eq!(encoded_len(128), 2);
        assert_eq!(encoded_len(16383), 2);
        assert_eq!(encoded_len(16384), 3);
        assert_eq!(encoded_len(u16::MAX as u32), 3);
        assert_eq!(encoded_len(u32::MAX), 5);
    }

    #[test]
    fn test_encoded_len_matches_encoding() {
        for v in [0u32, 1, 127, 128, 255, 300, 16383, 16384, 65535, 1 << 28] {
            let mut buf = Vec::new();
            encode_into(v, &mut buf);
            assert_eq!(buf.len(), encoded_len(v), "value {v}");
        }
    }

    #[test]
    fn test_decode_all() {
        let mut buf = Vec::new();
        for v in [0u32, 5, 200, 65535] {
            encode_into(v, &mut buf);
        }
        assert_eq!(decode_all(&buf).unwrap(), vec![0, 5, 200, 65535]);
    }

    #[test]
    fn test_truncated_varint_fails() {
        assert!(read(&mut &[0x80u8][..]).is_err());
    }
}
