//! Resumable binary-Thrift value decoding.
//!
//! Every decoder in this module family is a pure function over a byte slice
//! that reports one of three outcomes via [`Decoded`]: successful decode
//! with the number of bytes consumed, "need more bytes" (the caller
//! suspends and retries once the buffer has grown), or "structurally
//! invalid" (the caller must drop the flow). None of these decoders hold
//! state between calls; a suspended decode is simply re-attempted from the
//! same starting offset once more bytes are available, which is why the
//! [`crate::stream`] parser only ever needs to remember an offset, not a
//! partially-built decoder.

mod collection;
mod message;
mod strct;
mod value;

pub use message::{decode_message_begin, MessageHeader};
pub use strct::{decode_struct, read_field, render_fields, FieldOutcome};

use crate::config::Config;
use crate::wire::TType;

/// The outcome of a single decode attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded<T> {
    /// `value` was fully decoded, consuming `consumed` bytes from the start
    /// of the input slice.
    Complete { value: T, consumed: usize },
    /// The input slice is a valid-so-far prefix, but does not yet contain
    /// enough bytes to finish decoding. The caller must wait for more data
    /// and retry from the same offset.
    Incomplete,
    /// The input is structurally invalid (unknown wire type, negative
    /// length, or similar). The caller must drop the owning flow.
    Invalid,
}

impl<T> Decoded<T> {
    pub fn is_invalid(&self) -> bool {
        matches!(self, Decoded::Invalid)
    }

    pub fn is_incomplete(&self) -> bool {
        matches!(self, Decoded::Incomplete)
    }

    /// Transforms a successful decode's value, leaving `Incomplete`/`Invalid`
    /// untouched.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Decoded<U> {
        match self {
            Decoded::Complete { value, consumed } => Decoded::Complete {
                value: f(value),
                consumed,
            },
            Decoded::Incomplete => Decoded::Incomplete,
            Decoded::Invalid => Decoded::Invalid,
        }
    }
}

/// Decodes one value of wire type `ttype` from the start of `bytes`,
/// rendering it to a display string using the composite and struct
/// decoders below.
///
/// Dispatches by matching on `ttype` directly rather than through a
/// pre-built lookup table, so there is no module-initialization ordering
/// dependency between this dispatcher and the struct/collection decoders it
/// calls back into.
pub fn decode_value(ttype: TType, bytes: &[u8], cfg: &Config) -> Decoded<String> {
    match ttype {
        TType::Bool => value::decode_bool(bytes),
        TType::Byte => value::decode_byte(bytes),
        TType::Double => value::decode_double(bytes),
        TType::I16 => value::decode_i16(bytes),
        TType::I32 => value::decode_i32(bytes),
        TType::I64 => value::decode_i64(bytes),
        TType::String => value::decode_string(bytes, cfg.string_max_size, cfg.obfuscate_strings),
        TType::Struct => decode_struct(bytes, cfg, None),
        TType::List => collection::decode_list_or_set(bytes, cfg, '[', ']'),
        TType::Set => collection::decode_list_or_set(bytes, cfg, '{', '}'),
        TType::Map => collection::decode_map(bytes, cfg),
    }
}
