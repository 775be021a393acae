//! Error types for the fallible seams of the decoder.
//!
//! Decode-time failures (truncated input, unknown wire types, oversize
//! structs) are *not* represented here: per the decoder contract in
//! [`crate::decode`], those are folded into the `ok`/`complete` outcome of
//! the decode itself and handled by dropping the affected flow, not by
//! propagating a `Result`. This module covers the seams that really are
//! one-shot fallible operations: loading configuration and building an IDL
//! index ahead of time.

/// Errors produced while validating or loading a [`crate::config::Config`].
///
/// `transport_type` has no dedicated variant here: it deserializes straight
/// into [`crate::config::TransportType`], so an unrecognized string is
/// already rejected by serde and surfaces as [`ConfigError::Parse`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// `protocol_type` named something other than `"binary"`.
    #[error("unsupported protocol_type: {0:?} (only \"binary\" is implemented)")]
    UnsupportedProtocol(String),

    /// The configuration document could not be parsed as JSON.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Errors produced while building an [`crate::idl::IdlIndex`].
#[derive(Debug, thiserror::Error)]
pub enum IdlError {
    /// Two method signatures were registered under the same name.
    #[error("duplicate method signature for {0:?}")]
    DuplicateMethod(String),
}
