//! Thrift binary protocol wire types and value rendering.
//!
//! Covers the fixed vocabulary every decoder in [`crate::decode`] dispatches
//! on (wire type bytes, the STOP marker, the strict-header version mask) and
//! the string/number formatting rules shared by the value, composite, and
//! struct decoders.

/// One Thrift wire type byte, as it appears before every field and inside
/// every list/set/map header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TType {
    Bool,
    Byte,
    Double,
    I16,
    I32,
    I64,
    String,
    Struct,
    Map,
    Set,
    List,
}

impl TType {
    /// Maps a wire type byte to a [`TType`], or `None` if the byte is not one
    /// of the types this crate decodes (the STOP marker included).
    pub fn from_byte(byte: u8) -> Option<TType> {
        match byte {
            2 => Some(TType::Bool),
            3 => Some(TType::Byte),
            4 => Some(TType::Double),
            6 => Some(TType::I16),
            8 => Some(TType::I32),
            10 => Some(TType::I64),
            11 => Some(TType::String),
            12 => Some(TType::Struct),
            13 => Some(TType::Map),
            14 => Some(TType::Set),
            15 => Some(TType::List),
            _ => None,
        }
    }
}

/// The zero byte that terminates a struct body on the wire.
pub const STOP: u8 = 0x00;

/// Mask over the top 16 bits of the first 4 header bytes that, in strict
/// header mode, must equal [`BINARY_VERSION_1`].
pub const VERSION_MASK: i32 = 0xffff_0000u32 as i32;

/// The only strict-header version this crate recognizes (Thrift's binary
/// protocol version 1, packed into the top 16 bits).
pub const VERSION_1: i32 = 0x8001_0000u32 as i32;

/// Thrift message type tag, carried in the message-begin header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Call,
    Reply,
    Exception,
    OneWay,
}

impl MessageType {
    pub fn from_i8(byte: i8) -> Option<MessageType> {
        match byte {
            1 => Some(MessageType::Call),
            2 => Some(MessageType::Reply),
            3 => Some(MessageType::Exception),
            4 => Some(MessageType::OneWay),
            _ => None,
        }
    }

    /// A call or a one-way message expects no correlated processing beyond
    /// dispatch; both count as a request for the purposes of §3's
    /// `is_request` attribute.
    pub fn is_request(self) -> bool {
        matches!(self, MessageType::Call | MessageType::OneWay)
    }
}

/// Renders a Thrift string field's raw bytes.
///
/// Empty strings render as `""`. If `obfuscate` is set, any non-empty string
/// renders as `"*"`. Otherwise valid UTF-8 renders as a quoted, escaped
/// string; invalid UTF-8 falls back to lowercase hex. The result is
/// truncated to at most `max_size` bytes with a trailing `...`, independent
/// of how many bytes were actually consumed from the wire.
pub fn render_string(bytes: &[u8], max_size: usize, obfuscate: bool) -> String {
    if bytes.is_empty() {
        return "\"\"".to_string();
    }
    if obfuscate {
        return "\"*\"".to_string();
    }
    match std::str::from_utf8(bytes) {
        Ok(text) => {
            let escaped = text.replace('\\', "\\\\").replace('"', "\\\"");
            format!("\"{}\"", truncate_content(&escaped, max_size))
        }
        Err(_) => {
            let hex: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();
            truncate_content(&hex, max_size)
        }
    }
}

/// Truncates rendered content (excluding any surrounding quotes) to at most
/// `max_size` bytes, appending `...` when it was actually cut.
fn truncate_content(content: &str, max_size: usize) -> String {
    if content.len() <= max_size {
        return content.to_string();
    }
    let mut boundary = max_size;
    while boundary > 0 && !content.is_char_boundary(boundary) {
        boundary -= 1;
    }
    let mut truncated = content[..boundary].to_string();
    truncated.push_str(TRUNCATION_PLACEHOLDER);
    truncated
}

/// Renders a double using the shortest decimal that round-trips, matching
/// Rust's default `f64` `Display` formatting.
pub fn render_double(value: f64) -> String {
    format!("{}", value)
}

/// Wraps a joined list of element renderings, honoring the "empty results
/// render as an empty string, not empty brackets" rule from §4.2.
pub fn wrap_collection(joined: &str, open: char, close: char) -> String {
    if joined.is_empty() {
        String::new()
    } else {
        format!("{open}{joined}{close}")
    }
}

/// Appends the `...` placeholder used once a collection or struct rendering
/// reaches `collection_max_size` elements.
pub const TRUNCATION_PLACEHOLDER: &str = "...";

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn ttype_round_trips_known_bytes() {
        assert_eq!(TType::from_byte(2), Some(TType::Bool));
        assert_eq!(TType::from_byte(11), Some(TType::String));
        assert_eq!(TType::from_byte(15), Some(TType::List));
        assert_eq!(TType::from_byte(0), None);
        assert_eq!(TType::from_byte(99), None);
    }

    #[test]
    fn message_type_classifies_requests() {
        assert!(MessageType::Call.is_request());
        assert!(MessageType::OneWay.is_request());
        assert!(!MessageType::Reply.is_request());
        assert!(!MessageType::Exception.is_request());
    }

    #[test]
    fn empty_string_renders_as_empty_quotes() {
        assert_eq!(render_string(b"", 200, false), "\"\"");
    }

    #[test]
    fn obfuscated_string_renders_as_star() {
        assert_eq!(render_string(b"secret", 200, true), "\"*\"");
    }

    #[test]
    fn valid_utf8_renders_quoted() {
        assert_eq!(render_string(b"ping", 200, false), "\"ping\"");
    }

    #[test]
    fn invalid_utf8_falls_back_to_hex() {
        assert_eq!(render_string(&[0xff, 0x00], 200, false), "ff00");
    }

    #[test]
    fn oversize_string_is_truncated_with_ellipsis() {
        let long = vec![b'a'; 50];
        let rendered = render_string(&long, 10, false);
        // quoted content (<= max_size + "...") plus the two surrounding quotes
        assert!(rendered.len() <= 10 + 3 + 2);
        assert!(rendered.ends_with("...\""));
    }

    #[test]
    fn empty_collection_has_no_wrapper() {
        assert_eq!(wrap_collection("", '[', ']'), "");
    }

    #[test]
    fn nonempty_collection_is_wrapped() {
        assert_eq!(wrap_collection("1, 2", '[', ']'), "[1, 2]");
    }
}
