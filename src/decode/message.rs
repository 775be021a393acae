//! Message-begin header decoder.

use super::value::decode_raw_string;
use super::Decoded;
use crate::wire::{MessageType, VERSION_1, VERSION_MASK};

/// The parsed message-begin header: message type, method name, and sequence
/// id, plus the derived `is_request` flag.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageHeader {
    pub message_type: MessageType,
    pub method: String,
    pub seq_id: i32,
}

impl MessageHeader {
    pub fn is_request(&self) -> bool {
        self.message_type.is_request()
    }
}

/// Decodes a message-begin header in either strict-version mode (first i32
/// negative, version+type packed into it) or no-version mode (first i32 is
/// the method name's length prefix).
pub fn decode_message_begin(bytes: &[u8]) -> Decoded<MessageHeader> {
    if bytes.len() < 4 {
        return Decoded::Incomplete;
    }
    let mut header_buf = [0u8; 4];
    header_buf.copy_from_slice(&bytes[..4]);
    let header_word = i32::from_be_bytes(header_buf);

    if header_word < 0 {
        decode_strict(bytes, header_word)
    } else {
        decode_unversioned(bytes)
    }
}

fn decode_strict(bytes: &[u8], header_word: i32) -> Decoded<MessageHeader> {
    let version = header_word & VERSION_MASK;
    if version != VERSION_1 {
        crate::logging::debug(&format!(
            "strict-header version mismatch: got {:#010x}, expected {:#010x}",
            version as u32, VERSION_1 as u32
        ));
    }
    let type_byte = (header_word & 0xff) as i8;
    let message_type = match MessageType::from_i8(type_byte) {
        Some(t) => t,
        None => return Decoded::Invalid,
    };

    let (method, method_consumed) = match decode_raw_string(&bytes[4..]) {
        Decoded::Complete { value, consumed } => (value, consumed),
        Decoded::Incomplete => return Decoded::Incomplete,
        Decoded::Invalid => return Decoded::Invalid,
    };

    let seq_offset = 4 + method_consumed;
    if bytes.len() < seq_offset + 4 {
        return Decoded::Incomplete;
    }
    let mut seq_buf = [0u8; 4];
    seq_buf.copy_from_slice(&bytes[seq_offset..seq_offset + 4]);
    let seq_id = i32::from_be_bytes(seq_buf);

    Decoded::Complete {
        value: MessageHeader {
            message_type,
            method,
            seq_id,
        },
        consumed: seq_offset + 4,
    }
}

fn decode_unversioned(bytes: &[u8]) -> Decoded<MessageHeader> {
    let (method, method_consumed) = match decode_raw_string(bytes) {
        Decoded::Complete { value, consumed } => (value, consumed),
        Decoded::Incomplete => return Decoded::Incomplete,
        Decoded::Invalid => return Decoded::Invalid,
    };

    let type_offset = method_consumed;
    if bytes.len() < type_offset + 1 {
        return Decoded::Incomplete;
    }
    let message_type = match MessageType::from_i8(bytes[type_offset] as i8) {
        Some(t) => t,
        None => return Decoded::Invalid,
    };

    let seq_offset = type_offset + 1;
    if bytes.len() < seq_offset + 4 {
        return Decoded::Incomplete;
    }
    let mut seq_buf = [0u8; 4];
    seq_buf.copy_from_slice(&bytes[seq_offset..seq_offset + 4]);
    let seq_id = i32::from_be_bytes(seq_buf);

    Decoded::Complete {
        value: MessageHeader {
            message_type,
            method,
            seq_id,
        },
        consumed: seq_offset + 4,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn strict_header(message_type: u8, method: &str, seq_id: i32) -> Vec<u8> {
        let mut bytes = Vec::new();
        let header = (0x8001_0000u32 | message_type as u32) as i32;
        bytes.extend_from_slice(&header.to_be_bytes());
        bytes.extend_from_slice(&(method.len() as i32).to_be_bytes());
        bytes.extend_from_slice(method.as_bytes());
        bytes.extend_from_slice(&seq_id.to_be_bytes());
        bytes
    }

    #[test]
    fn decodes_strict_call_header() {
        let bytes = strict_header(1, "ping", 42);
        assert_eq!(
            decode_message_begin(&bytes),
            Decoded::Complete {
                value: MessageHeader {
                    message_type: MessageType::Call,
                    method: "ping".to_string(),
                    seq_id: 42,
                },
                consumed: bytes.len(),
            }
        );
    }

    #[test]
    fn strict_header_is_request_for_call_and_oneway() {
        let header = decode_message_begin(&strict_header(1, "ping", 1));
        match header {
            Decoded::Complete { value, .. } => assert!(value.is_request()),
            other => panic!("expected Complete, got {other:?}"),
        }
    }

    #[test]
    fn decodes_unversioned_header() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&3i32.to_be_bytes());
        bytes.extend_from_slice(b"add");
        bytes.push(1); // call
        bytes.extend_from_slice(&7i32.to_be_bytes());
        assert_eq!(
            decode_message_begin(&bytes),
            Decoded::Complete {
                value: MessageHeader {
                    message_type: MessageType::Call,
                    method: "add".to_string(),
                    seq_id: 7,
                },
                consumed: bytes.len(),
            }
        );
    }

    #[test]
    fn truncated_header_suspends() {
        assert_eq!(decode_message_begin(&[0x80, 0x01]), Decoded::Incomplete);
    }
}
