//! List, set, and map decoders.

use super::{decode_value, Decoded};
use crate::config::Config;
use crate::wire::{wrap_collection, TType, TRUNCATION_PLACEHOLDER};

/// Decodes a list or set header (1 byte element type, i32 size) followed by
/// `size` elements of that type, wrapping the joined rendering in `open`/
/// `close`. Every element is decoded and its bytes consumed even past
/// `collection_max_size`, so the stream stays aligned; only the renderings
/// are dropped once the cap is reached.
pub fn decode_list_or_set(bytes: &[u8], cfg: &Config, open: char, close: char) -> Decoded<String> {
    if bytes.is_empty() {
        return Decoded::Incomplete;
    }
    let elem_type = match TType::from_byte(bytes[0]) {
        Some(t) => t,
        None => return Decoded::Invalid,
    };
    if bytes.len() < 5 {
        return Decoded::Incomplete;
    }
    let mut size_buf = [0u8; 4];
    size_buf.copy_from_slice(&bytes[1..5]);
    let size = i32::from_be_bytes(size_buf);
    if size < 0 {
        return Decoded::Invalid;
    }
    let size = size as usize;

    let mut offset = 5;
    let mut rendered = Vec::new();
    for index in 0..size {
        match decode_value(elem_type, &bytes[offset..], cfg) {
            Decoded::Complete { value, consumed } => {
                offset += consumed;
                if index < cfg.collection_max_size {
                    rendered.push(value);
                } else if index == cfg.collection_max_size {
                    rendered.push(TRUNCATION_PLACEHOLDER.to_string());
                }
            }
            Decoded::Incomplete => return Decoded::Incomplete,
            Decoded::Invalid => return Decoded::Invalid,
        }
    }

    Decoded::Complete {
        value: wrap_collection(&rendered.join(", "), open, close),
        consumed: offset,
    }
}

/// Decodes a map header (1 byte key type, 1 byte value type, i32 size)
/// followed by `size` key/value pairs, each rendered as `<key>: <value>`.
pub fn decode_map(bytes: &[u8], cfg: &Config) -> Decoded<String> {
    if bytes.len() < 2 {
        return Decoded::Incomplete;
    }
    let key_type = match TType::from_byte(bytes[0]) {
        Some(t) => t,
        None => return Decoded::Invalid,
    };
    let value_type = match TType::from_byte(bytes[1]) {
        Some(t) => t,
        None => return Decoded::Invalid,
    };
    if bytes.len() < 6 {
        return Decoded::Incomplete;
    }
    let mut size_buf = [0u8; 4];
    size_buf.copy_from_slice(&bytes[2..6]);
    let size = i32::from_be_bytes(size_buf);
    if size < 0 {
        return Decoded::Invalid;
    }
    let size = size as usize;

    let mut offset = 6;
    let mut rendered = Vec::new();
    for index in 0..size {
        let key = match decode_value(key_type, &bytes[offset..], cfg) {
            Decoded::Complete { value, consumed } => {
                offset += consumed;
                value
            }
            Decoded::Incomplete => return Decoded::Incomplete,
            Decoded::Invalid => return Decoded::Invalid,
        };
        let value = match decode_value(value_type, &bytes[offset..], cfg) {
            Decoded::Complete { value, consumed } => {
                offset += consumed;
                value
            }
            Decoded::Incomplete => return Decoded::Incomplete,
            Decoded::Invalid => return Decoded::Invalid,
        };
        if index < cfg.collection_max_size {
            rendered.push(format!("{key}: {value}"));
        } else if index == cfg.collection_max_size {
            rendered.push(TRUNCATION_PLACEHOLDER.to_string());
        }
    }

    Decoded::Complete {
        value: format!("{{{}}}", rendered.join(", ")),
        consumed: offset,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn empty_list_renders_as_empty_string() {
        let cfg = Config::default();
        let bytes = [
            8, // elem type I32
            0, 0, 0, 0, // size 0
        ];
        assert_eq!(
            decode_list_or_set(&bytes, &cfg, '[', ']'),
            Decoded::Complete {
                value: String::new(),
                consumed: 5
            }
        );
    }

    #[test]
    fn list_of_two_i32s() {
        let cfg = Config::default();
        let bytes = [
            8, // I32
            0, 0, 0, 2, // size 2
            0, 0, 0, 1, // 1
            0, 0, 0, 2, // 2
        ];
        assert_eq!(
            decode_list_or_set(&bytes, &cfg, '[', ']'),
            Decoded::Complete {
                value: "[1, 2]".to_string(),
                consumed: 13
            }
        );
    }

    #[test]
    fn unknown_element_type_is_invalid() {
        let cfg = Config::default();
        let bytes = [0xfe, 0, 0, 0, 0];
        assert_eq!(decode_list_or_set(&bytes, &cfg, '[', ']'), Decoded::Invalid);
    }

    #[test]
    fn list_beyond_collection_max_size_truncates_rendering_but_consumes_all() {
        let mut cfg = Config::default();
        cfg.collection_max_size = 2;
        let mut bytes = vec![8, 0, 0, 0, 3]; // I32, size 3
        bytes.extend_from_slice(&1i32.to_be_bytes());
        bytes.extend_from_slice(&2i32.to_be_bytes());
        bytes.extend_from_slice(&3i32.to_be_bytes());
        assert_eq!(
            decode_list_or_set(&bytes, &cfg, '[', ']'),
            Decoded::Complete {
                value: "[1, 2, ...]".to_string(),
                consumed: 5 + 12
            }
        );
    }

    #[test]
    fn map_of_one_entry() {
        let cfg = Config::default();
        let mut bytes = vec![11, 8, 0, 0, 0, 1]; // key=string, value=i32, size 1
        bytes.extend_from_slice(&3i32.to_be_bytes());
        bytes.extend_from_slice(b"key");
        bytes.extend_from_slice(&7i32.to_be_bytes());
        assert_eq!(
            decode_map(&bytes, &cfg),
            Decoded::Complete {
                value: "{\"key\": 7}".to_string(),
                consumed: bytes.len()
            }
        );
    }
}
