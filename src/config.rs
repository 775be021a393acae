//! Typed configuration surface.
//!
//! Every numeric cap and feature flag the rest of the crate reads comes
//! through a [`Config`]. It can be built programmatically with
//! [`Config::default`] plus field assignment, or loaded from a JSON document
//! with [`Config::from_json`] — this crate reuses `serde_json` rather than
//! pulling in a dedicated config-file crate, since it is already on the
//! dependency graph for event emission.

use crate::error::ConfigError;
use serde::Deserialize;

/// Wire transport framing in use on the observed connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportType {
    /// No length prefix; message boundaries are inferred only by a full parse.
    Socket,
    /// Each message is prefixed with a 4-byte big-endian frame length.
    Framed,
}

impl Default for TransportType {
    fn default() -> Self {
        TransportType::Socket
    }
}

/// Recognized configuration options.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Max bytes of any rendered Thrift string before truncation+ellipsis.
    pub string_max_size: usize,
    /// Max elements rendered per list/set/map/struct before ellipsis.
    pub collection_max_size: usize,
    /// Struct field cap before failing the flow.
    pub drop_after_n_struct_fields: usize,
    /// `socket` or `framed`.
    pub transport_type: TransportType,
    /// Application-level protocol name. Only `"binary"` is implemented; the
    /// compact protocol is not supported. Kept as a raw string and checked
    /// in [`Config::validate`] rather than as an enum, so that an
    /// unsupported value is reported as a [`ConfigError::UnsupportedProtocol`]
    /// rather than a generic JSON parse failure.
    pub protocol_type: String,
    /// If false, parse reply headers only and skip bodies.
    pub capture_reply: bool,
    /// If true, replace all non-empty string renderings with `"*"`.
    pub obfuscate_strings: bool,
    /// Include the raw request string in emitted events.
    pub send_request: bool,
    /// Include the raw response string in emitted events.
    pub send_response: bool,
    /// Paths consumed by the IDL collaborator; opaque to the core.
    pub idl_files: Vec<String>,
    /// Max buffered bytes per stream before the flow is dropped.
    pub tcp_max_data_in_stream: usize,
    /// How long (milliseconds) a request waits for its reply before
    /// publishing as one-way.
    pub transaction_timeout_ms: u64,
    /// Bound on the publish channel.
    pub publish_channel_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            string_max_size: 200,
            collection_max_size: 15,
            drop_after_n_struct_fields: 500,
            transport_type: TransportType::default(),
            protocol_type: "binary".to_string(),
            capture_reply: true,
            obfuscate_strings: false,
            send_request: false,
            send_response: false,
            idl_files: Vec::new(),
            tcp_max_data_in_stream: 10 * 1024 * 1024,
            transaction_timeout_ms: 10_000,
            publish_channel_capacity: 1000,
        }
    }
}

impl Config {
    /// Parses a JSON configuration document, applying defaults for any
    /// omitted field, then validates it.
    pub fn from_json(document: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(document)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that the configuration is internally consistent.
    ///
    /// Deliberately validates `protocol_type` and only `protocol_type`: the
    /// distilled source this crate is modeled on has a documented bug where
    /// the `protocol_type` validation path actually inspects
    /// `transport_type`. `transport_type` needs no validation of its own
    /// here regardless, since `TransportType` already rejects unrecognized
    /// strings at deserialization time via serde.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.protocol_type != "binary" {
            return Err(ConfigError::UnsupportedProtocol(self.protocol_type.clone()));
        }
        Ok(())
    }

    /// `transaction_timeout` as a [`std::time::Duration`].
    pub fn transaction_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.transaction_timeout_ms)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let config = Config::default();
        assert_eq!(config.string_max_size, 200);
        assert_eq!(config.collection_max_size, 15);
        assert_eq!(config.drop_after_n_struct_fields, 500);
        assert_eq!(config.transport_type, TransportType::Socket);
        assert_eq!(config.publish_channel_capacity, 1000);
    }

    #[test]
    fn loads_partial_json_with_defaults() {
        let config = Config::from_json(r#"{"transport_type": "framed", "capture_reply": false}"#)
            .expect("valid config");
        assert_eq!(config.transport_type, TransportType::Framed);
        assert!(!config.capture_reply);
        assert_eq!(config.string_max_size, 200);
    }

    #[test]
    fn rejects_unknown_transport() {
        let err = Config::from_json(r#"{"transport_type": "quic"}"#);
        assert!(err.is_err());
    }

    #[test]
    fn rejects_unsupported_protocol() {
        let err = Config::from_json(r#"{"protocol_type": "compact"}"#);
        assert!(matches!(err, Err(ConfigError::UnsupportedProtocol(p)) if p == "compact"));
    }
}
