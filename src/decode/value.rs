//! Primitive value decoders.

use super::Decoded;
use crate::wire::render_string;

pub fn decode_bool(bytes: &[u8]) -> Decoded<String> {
    match bytes.first() {
        None => Decoded::Incomplete,
        Some(0) => Decoded::Complete {
            value: "false".to_string(),
            consumed: 1,
        },
        Some(_) => Decoded::Complete {
            value: "true".to_string(),
            consumed: 1,
        },
    }
}

pub fn decode_byte(bytes: &[u8]) -> Decoded<String> {
    match bytes.first() {
        None => Decoded::Incomplete,
        Some(&b) => Decoded::Complete {
            value: (b as i8).to_string(),
            consumed: 1,
        },
    }
}

pub fn decode_double(bytes: &[u8]) -> Decoded<String> {
    if bytes.len() < 8 {
        return Decoded::Incomplete;
    }
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&bytes[..8]);
    Decoded::Complete {
        value: crate::wire::render_double(f64::from_be_bytes(buf)),
        consumed: 8,
    }
}

pub fn decode_i16(bytes: &[u8]) -> Decoded<String> {
    if bytes.len() < 2 {
        return Decoded::Incomplete;
    }
    let mut buf = [0u8; 2];
    buf.copy_from_slice(&bytes[..2]);
    Decoded::Complete {
        value: i16::from_be_bytes(buf).to_string(),
        consumed: 2,
    }
}

pub fn decode_i32(bytes: &[u8]) -> Decoded<String> {
    if bytes.len() < 4 {
        return Decoded::Incomplete;
    }
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[..4]);
    Decoded::Complete {
        value: i32::from_be_bytes(buf).to_string(),
        consumed: 4,
    }
}

pub fn decode_i64(bytes: &[u8]) -> Decoded<String> {
    if bytes.len() < 8 {
        return Decoded::Incomplete;
    }
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&bytes[..8]);
    Decoded::Complete {
        value: i64::from_be_bytes(buf).to_string(),
        consumed: 8,
    }
}

/// Reads an i32-length-prefixed string. `consumed` always reflects the full
/// on-wire length, even when the rendered value is truncated to
/// `max_size` — the stream must stay byte-aligned regardless of rendering.
pub fn decode_string(bytes: &[u8], max_size: usize, obfuscate: bool) -> Decoded<String> {
    if bytes.len() < 4 {
        return Decoded::Incomplete;
    }
    let mut len_buf = [0u8; 4];
    len_buf.copy_from_slice(&bytes[..4]);
    let len = i32::from_be_bytes(len_buf);
    if len < 0 {
        return Decoded::Invalid;
    }
    let len = len as usize;
    let total = 4 + len;
    if bytes.len() < total {
        return Decoded::Incomplete;
    }
    Decoded::Complete {
        value: render_string(&bytes[4..total], max_size, obfuscate),
        consumed: total,
    }
}

/// Reads an i32-length-prefixed string as a raw (unrendered) identifier,
/// used for the method name in a message-begin header rather than for a
/// field value. Invalid UTF-8 is replaced lossily since method names are
/// identifiers, not arbitrary payload bytes worth hex-dumping.
pub fn decode_raw_string(bytes: &[u8]) -> Decoded<String> {
    if bytes.len() < 4 {
        return Decoded::Incomplete;
    }
    let mut len_buf = [0u8; 4];
    len_buf.copy_from_slice(&bytes[..4]);
    let len = i32::from_be_bytes(len_buf);
    if len < 0 {
        return Decoded::Invalid;
    }
    let len = len as usize;
    let total = 4 + len;
    if bytes.len() < total {
        return Decoded::Incomplete;
    }
    Decoded::Complete {
        value: String::from_utf8_lossy(&bytes[4..total]).into_owned(),
        consumed: total,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn decodes_i32_big_endian() {
        assert_eq!(
            decode_i32(&[0x00, 0x00, 0x00, 0x2a]),
            Decoded::Complete {
                value: "42".to_string(),
                consumed: 4
            }
        );
    }

    #[test]
    fn negative_string_length_is_invalid() {
        assert_eq!(decode_string(&[0xff, 0xff, 0xff, 0xff], 200, false), Decoded::Invalid);
    }

    #[test]
    fn string_consumed_reflects_full_wire_length_even_when_truncated() {
        let payload = vec![b'x'; 1200];
        let mut bytes = vec![0x00, 0x00, 0x04, 0xb0]; // len = 1200
        bytes.extend_from_slice(&payload);
        match decode_string(&bytes, 200, false) {
            Decoded::Complete { value, consumed } => {
                assert_eq!(consumed, 4 + 1200);
                assert!(value.len() <= 200 + 3 + 2);
            }
            other => panic!("expected Complete, got {other:?}"),
        }
    }

    #[test]
    fn truncated_string_length_suspends() {
        assert_eq!(decode_string(&[0x00, 0x00], 200, false), Decoded::Incomplete);
    }
}
