//! Per-(flow, direction) stream parser.
//!
//! A [`Stream`] owns a growing byte buffer, a parse offset into it, and the
//! message currently under construction. [`Stream::step`] drives the
//! message-begin and field decoders to completion, suspending (returning
//! [`StepOutcome::NeedMore`]) whenever the buffer runs out of bytes, and
//! always leaving `parse_offset` at the last known-good boundary so the
//! next appended segment can simply retry.

use crate::config::{Config, TransportType};
use crate::decode::{decode_message_begin, read_field, render_fields, Decoded, FieldOutcome};
use crate::idl::IdlResolver;
use crate::model::{Direction, FlowTuple, Message};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    Start,
    Field,
}

/// Result of one [`Stream::step`] call.
#[derive(Debug)]
pub enum StepOutcome {
    /// Not enough bytes yet; the stream retains its state and waits.
    NeedMore,
    /// The buffered bytes are structurally invalid; the caller must drop
    /// this stream.
    Invalid,
    /// A message finished decoding.
    Complete(Message),
}

pub struct Stream {
    buffer: Vec<u8>,
    parse_offset: usize,
    parse_state: ParseState,
    message: Option<Message>,
    /// Suppresses all decoding on this direction until the next request on
    /// the reverse direction clears it. Used to bypass an uninteresting
    /// reply body without tearing the stream down; any pipelined replies
    /// received before the next request are lost as a result, which is
    /// intentional.
    pub skip_input: bool,
    transport: TransportType,
}

impl Stream {
    pub fn new(transport: TransportType) -> Self {
        Stream {
            buffer: Vec::new(),
            parse_offset: 0,
            parse_state: ParseState::Start,
            message: None,
            skip_input: false,
            transport,
        }
    }

    /// Appends a reassembled segment to the buffer.
    pub fn append(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Drops all buffered bytes and resets to a fresh message boundary.
    /// Used when a reply body is being skipped, and when the dispatcher
    /// discards a stream after a decode failure.
    pub fn flush(&mut self) {
        self.buffer.clear();
        self.parse_offset = 0;
        self.parse_state = ParseState::Start;
        self.message = None;
    }

    /// Discards the consumed prefix after a completed message, retaining
    /// any bytes already buffered past it (the start of a pipelined next
    /// message).
    pub fn advance_past_completed_message(&mut self) {
        self.buffer.drain(0..self.parse_offset);
        self.parse_offset = 0;
        self.parse_state = ParseState::Start;
        self.message = None;
    }

    /// Drives the parser as far as the current buffer allows.
    pub fn step(
        &mut self,
        cfg: &Config,
        flow: FlowTuple,
        direction: Direction,
        timestamp: std::time::SystemTime,
        idl: &dyn IdlResolver,
    ) -> StepOutcome {
        loop {
            match self.parse_state {
                ParseState::Start => match self.step_start(cfg, flow, direction, timestamp) {
                    Some(outcome) => return outcome,
                    None => continue,
                },
                ParseState::Field => match self.step_field(cfg, idl) {
                    Some(outcome) => return outcome,
                    None => continue,
                },
            }
        }
    }

    /// Returns `None` to keep looping (state transitioned to FIELD and
    /// should be driven immediately), `Some(outcome)` to return to the
    /// caller.
    fn step_start(
        &mut self,
        cfg: &Config,
        flow: FlowTuple,
        direction: Direction,
        timestamp: std::time::SystemTime,
    ) -> Option<StepOutcome> {
        let mut message = Message::new(flow, direction, timestamp);
        message.start = self.parse_offset;
        let mut offset = self.parse_offset;

        if self.transport == TransportType::Framed {
            if self.buffer.len() < offset + 4 {
                return Some(StepOutcome::NeedMore);
            }
            let mut len_buf = [0u8; 4];
            len_buf.copy_from_slice(&self.buffer[offset..offset + 4]);
            let frame_size = i32::from_be_bytes(len_buf);
            if frame_size < 0 {
                return Some(StepOutcome::Invalid);
            }
            message.frame_size = frame_size as u32;
            offset += 4;
        }

        let header = match decode_message_begin(&self.buffer[offset..]) {
            Decoded::Invalid => return Some(StepOutcome::Invalid),
            Decoded::Incomplete => return Some(StepOutcome::NeedMore),
            Decoded::Complete { value, consumed } => {
                offset += consumed;
                value
            }
        };

        message.is_request = header.is_request();
        message.message_type = header.message_type;
        message.method = header.method;
        message.seq_id = header.seq_id;
        self.parse_offset = offset;

        if !message.is_request && !cfg.capture_reply {
            message.return_value = Some(String::new());
            message.exceptions = Some(String::new());
            // The body is never parsed in this path, but the header alone
            // still occupied bytes on the wire, so frame_size is synthesized
            // from the header-only consumption for socket transport just
            // like a fully-parsed message (framed transport already set it
            // from the length prefix above).
            self.synthesize_frame_size(&mut message);
            return Some(StepOutcome::Complete(message));
        }

        self.message = Some(message);
        self.parse_state = ParseState::Field;
        None
    }

    /// For socket transport, `frame_size` has no header to read it from;
    /// it is synthesized from how far the parser actually advanced.
    /// Framed transport already set it from the decoded length prefix in
    /// [`Stream::step_start`].
    fn synthesize_frame_size(&self, message: &mut Message) {
        if self.transport == TransportType::Socket {
            message.frame_size = (self.parse_offset - message.start) as u32;
        }
    }

    fn step_field(&mut self, cfg: &Config, idl: &dyn IdlResolver) -> Option<StepOutcome> {
        loop {
            match read_field(&self.buffer[self.parse_offset..], cfg) {
                Decoded::Invalid => return Some(StepOutcome::Invalid),
                Decoded::Incomplete => return Some(StepOutcome::NeedMore),
                Decoded::Complete {
                    value: FieldOutcome::StructEnd,
                    consumed,
                } => {
                    self.parse_offset += consumed;
                    break;
                }
                Decoded::Complete {
                    value: FieldOutcome::Field(field),
                    consumed,
                } => {
                    self.parse_offset += consumed;
                    let message = self.message.as_mut().expect("FIELD state implies a message is under construction");
                    message.fields.push(field);
                    if message.fields.len() > cfg.drop_after_n_struct_fields {
                        crate::logging::warn(&format!(
                            "message body exceeded {} fields without a STOP marker, dropping the flow",
                            cfg.drop_after_n_struct_fields
                        ));
                        return Some(StepOutcome::Invalid);
                    }
                }
            }
        }

        let mut message = self.message.take().expect("FIELD state implies a message is under construction");
        let signature = idl.find_method(&message.method);

        if message.is_request {
            message.service = signature.as_ref().map(|s| s.service_name.clone());
            message.params = Some(render_fields(&message.fields, cfg, signature.as_ref(), |name, value| {
                format!("{name}: {value}")
            }));
        } else {
            match message.fields.len() {
                0 => {
                    message.return_value = Some(String::new());
                    message.exceptions = Some(String::new());
                }
                1 if message.fields[0].id == 0 => {
                    message.return_value = Some(message.fields[0].rendered_value.clone());
                    message.exceptions = Some(String::new());
                }
                _ => {
                    if message.fields.len() > 1 {
                        crate::logging::warn(&format!(
                            "reply to {:?} carried {} fields, expected at most one; using the first",
                            message.method,
                            message.fields.len()
                        ));
                    }
                    message.return_value = Some(String::new());
                    message.has_exception = true;
                    let first = std::slice::from_ref(&message.fields[0]);
                    message.exceptions = Some(render_fields(first, cfg, signature.as_ref(), |name, value| {
                        format!("{name}: {value}")
                    }));
                }
            }
        }

        self.synthesize_frame_size(&mut message);
        Some(StepOutcome::Complete(message))
    }
}
