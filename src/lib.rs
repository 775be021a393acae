//! A passive, streaming decoder for the Thrift RPC binary protocol.
//!
//! This crate does not capture or reassemble traffic itself — it consumes
//! reassembled byte segments from an upstream TCP flow tracker (see
//! [`dispatcher::FlowDispatcher`]) and emits structured request/reply
//! [`model::Event`]s for downstream telemetry. The binary protocol only;
//! the compact protocol and active protocol participation are out of
//! scope.
//!
//! The pieces, leaves first: [`wire`] and [`decode`] are the pure,
//! resumable value/composite/message decoders; [`stream`] drives them
//! through a per-(flow, direction) state machine; [`dispatcher`] owns the
//! stream table fed by reassembled segments; [`correlator`] pairs a
//! request with its reply; [`publisher`] turns a correlated transaction
//! into an outbound event. [`idl`] and [`process`] are narrow optional
//! collaborator interfaces; [`config`] is the typed configuration surface
//! parameterizing all of the above.

pub mod config;
pub mod correlator;
pub mod decode;
pub mod dispatcher;
pub mod error;
pub mod idl;
mod logging;
pub mod model;
pub mod process;
pub mod publisher;
pub mod stream;
pub mod wire;

pub use config::Config;
pub use dispatcher::FlowDispatcher;
pub use model::{Event, Message, Transaction};
