//! Struct field reader and struct value decoder.

use super::{decode_value, Decoded};
use crate::config::Config;
use crate::idl::MethodSignature;
use crate::model::Field;
use crate::wire::{TType, TRUNCATION_PLACEHOLDER, STOP};

/// The three-way result of reading a single field from a struct body. A
/// boolean `complete` flag can't distinguish "one field was read, keep
/// going" from "the struct just ended" without overloading its meaning, so
/// those two outcomes get their own enum instead. The `ok`/`complete` halves
/// of the underlying decode are folded into the surrounding [`Decoded`]:
/// `Decoded::Invalid` is `ok=false`, `Decoded::Incomplete` is
/// `ok=true, complete=false`, and `Decoded::Complete` is a successfully
/// read field *or* the struct's end, distinguished by this enum.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldOutcome {
    /// A field was read; `consumed` in the surrounding [`Decoded`] covers
    /// the type byte, field id, and value.
    Field(Field),
    /// The STOP marker was read; the struct is finished.
    StructEnd,
}

/// Reads one field (or the terminating STOP marker) from the start of
/// `bytes`.
pub fn read_field(bytes: &[u8], cfg: &Config) -> Decoded<FieldOutcome> {
    let type_byte = match bytes.first() {
        Some(&b) => b,
        None => return Decoded::Incomplete,
    };
    if type_byte == STOP {
        return Decoded::Complete {
            value: FieldOutcome::StructEnd,
            consumed: 1,
        };
    }
    let wire_type = match TType::from_byte(type_byte) {
        Some(t) => t,
        None => return Decoded::Invalid,
    };
    if bytes.len() < 3 {
        return Decoded::Incomplete;
    }
    let mut id_buf = [0u8; 2];
    id_buf.copy_from_slice(&bytes[1..3]);
    let id = i16::from_be_bytes(id_buf);

    match decode_value(wire_type, &bytes[3..], cfg) {
        Decoded::Complete { value, consumed } => Decoded::Complete {
            value: FieldOutcome::Field(Field {
                id,
                wire_type,
                rendered_value: value,
            }),
            consumed: 3 + consumed,
        },
        Decoded::Incomplete => Decoded::Incomplete,
        Decoded::Invalid => Decoded::Invalid,
    }
}

/// Decodes a struct body: repeated fields terminated by STOP, rendered as
/// `(id1: v1, id2: v2, …)`. Unlike list/set/map, an empty struct still
/// renders as `()`, never an empty string.
///
/// When `signature` is supplied, a field id present in its parameter names
/// is rendered with that name instead of the numeric id. This only applies
/// at the depth this function is called at — nested structs decoded via
/// [`decode_value`]'s `TType::Struct` arm always pass `None`, since the IDL
/// only names the top-level argument/return struct's fields.
pub fn decode_struct(bytes: &[u8], cfg: &Config, signature: Option<&MethodSignature>) -> Decoded<String> {
    let mut offset = 0;
    let mut fields = Vec::new();

    loop {
        match read_field(&bytes[offset..], cfg) {
            Decoded::Complete {
                value: FieldOutcome::StructEnd,
                consumed,
            } => {
                offset += consumed;
                break;
            }
            Decoded::Complete {
                value: FieldOutcome::Field(field),
                consumed,
            } => {
                offset += consumed;
                fields.push(field);
                if fields.len() > cfg.drop_after_n_struct_fields {
                    crate::logging::warn(&format!(
                        "struct body exceeded {} fields without a STOP marker, dropping the flow",
                        cfg.drop_after_n_struct_fields
                    ));
                    return Decoded::Invalid;
                }
            }
            Decoded::Incomplete => return Decoded::Incomplete,
            Decoded::Invalid => return Decoded::Invalid,
        }
    }

    Decoded::Complete {
        value: render_fields(&fields, cfg, signature, |name, value| format!("{name}: {value}")),
        consumed: offset,
    }
}

/// Renders a list of already-decoded fields as `(id1: v1, id2: v2, …)`,
/// applying the same `collection_max_size` truncation as every other
/// composite rendering and substituting field names from `signature` where
/// available. `label_field` formats one `id: value` (or `name: value`)
/// entry; it exists so the caller can reuse this for both argument structs
/// and exception structs without duplicating the truncation loop.
pub fn render_fields(
    fields: &[Field],
    cfg: &Config,
    signature: Option<&MethodSignature>,
    label_field: impl Fn(&str, &str) -> String,
) -> String {
    let mut rendered = Vec::new();
    for field in fields {
        if rendered.len() < cfg.collection_max_size {
            let label = signature
                .and_then(|sig| sig.param_name(field.id))
                .map(str::to_string)
                .unwrap_or_else(|| field.id.to_string());
            rendered.push(label_field(&label, &field.rendered_value));
        } else if rendered.len() == cfg.collection_max_size {
            rendered.push(TRUNCATION_PLACEHOLDER.to_string());
            break;
        }
    }
    format!("({})", rendered.join(", "))
}
