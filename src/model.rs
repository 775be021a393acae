//! Core data types shared across the decoder, correlator, and publisher.

use crate::wire::MessageType;
use serde::Serialize;

/// The 4-tuple identifying a TCP flow, plus a disambiguating id so that a
/// reused (ip, port) pair across connections does not collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FlowTuple {
    pub src_ip: std::net::IpAddr,
    pub src_port: u16,
    pub dst_ip: std::net::IpAddr,
    pub dst_port: u16,
    pub flow_id: u64,
}

/// Which way a segment travelled relative to the flow tuple's orientation at
/// first observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Forward,
    Reverse,
}

/// An (ip, port, process name) triple attached to a published transaction.
#[derive(Debug, Clone, Serialize)]
pub struct Endpoint {
    pub ip: std::net::IpAddr,
    pub port: u16,
    pub process: Option<String>,
}

impl Endpoint {
    pub fn new(ip: std::net::IpAddr, port: u16) -> Self {
        Endpoint {
            ip,
            port,
            process: None,
        }
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Endpoint::new(std::net::IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED), 0)
    }
}

/// One entry inside a struct payload during decoding (§3).
#[derive(Debug, Clone)]
pub struct Field {
    pub id: i16,
    pub wire_type: crate::wire::TType,
    pub rendered_value: String,
}

/// One Thrift call or reply (§3).
#[derive(Debug, Clone)]
pub struct Message {
    pub timestamp: std::time::SystemTime,
    pub flow: FlowTuple,
    pub direction: Direction,
    pub is_request: bool,
    pub message_type: MessageType,
    pub method: String,
    pub seq_id: i32,
    pub frame_size: u32,
    pub service: Option<String>,
    pub fields: Vec<Field>,
    /// Formatted argument struct, set only for requests.
    pub params: Option<String>,
    /// Formatted return value, set only for replies.
    pub return_value: Option<String>,
    /// Formatted exception struct, set only for replies that carried one.
    pub exceptions: Option<String>,
    pub has_exception: bool,
    /// Offset into the owning stream's buffer where this message started;
    /// used to compute `frame_size` for unframed transport.
    pub start: usize,
    /// Process names for the two sides of the flow, resolved once by the
    /// dispatcher via a [`crate::process::ProcessAttributor`].
    pub process_names: ProcessNames,
}

impl Message {
    pub fn new(flow: FlowTuple, direction: Direction, timestamp: std::time::SystemTime) -> Self {
        Message {
            timestamp,
            flow,
            direction,
            is_request: false,
            message_type: MessageType::Call,
            method: String::new(),
            seq_id: 0,
            frame_size: 0,
            service: None,
            fields: Vec::new(),
            params: None,
            return_value: None,
            exceptions: None,
            has_exception: false,
            start: 0,
            process_names: ProcessNames::default(),
        }
    }
}

/// Names resolved for the two endpoints of a flow, as supplied by a
/// [`crate::process::ProcessAttributor`].
#[derive(Debug, Clone, Default)]
pub struct ProcessNames {
    pub src: Option<String>,
    pub dst: Option<String>,
}

/// A correlated request/reply pair keyed by the flow tuple (§3).
#[derive(Debug, Clone)]
pub struct Transaction {
    pub flow: FlowTuple,
    pub source: Endpoint,
    pub destination: Endpoint,
    pub request_timestamp: std::time::SystemTime,
    pub request: Message,
    pub reply: Option<Message>,
}

impl Transaction {
    /// Milliseconds elapsed between the request and `reply_timestamp`; used
    /// to populate the outbound event's `response_time_ms`.
    pub fn response_time_ms(&self, reply_timestamp: std::time::SystemTime) -> u64 {
        reply_timestamp
            .duration_since(self.request_timestamp)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

/// Outcome tag for a published event (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Ok,
    Error,
}

/// Nested request summary inside an outbound [`Event`].
#[derive(Debug, Clone, Serialize)]
pub struct RequestSummary {
    pub method: String,
    pub params: String,
    pub size: u32,
}

/// Nested reply summary inside an outbound [`Event`].
#[derive(Debug, Clone, Serialize)]
pub struct ReplySummary {
    pub return_value: String,
    pub exceptions: String,
    pub size: u32,
}

/// The outbound record handed to the external publisher (§3, §6).
#[derive(Debug, Clone, Serialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub type_tag: &'static str,
    pub status: Status,
    pub response_time_ms: u64,
    pub request: RequestSummary,
    pub service: Option<String>,
    pub reply: Option<ReplySummary>,
    pub source: Endpoint,
    pub destination: Endpoint,
    pub raw_request: Option<String>,
    pub raw_response: Option<String>,
}
