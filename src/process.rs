//! Process attributor interface.

use crate::model::{FlowTuple, ProcessNames};

/// A pure lookup consulted once per completed message to attach a process
/// name to each side of the flow.
pub trait ProcessAttributor: Send + Sync {
    fn find_processes(&self, flow: &FlowTuple) -> ProcessNames;
}

/// The default attributor when no process/socket table was supplied: both
/// names come back empty.
#[derive(Debug, Default)]
pub struct NullProcessAttributor;

impl ProcessAttributor for NullProcessAttributor {
    fn find_processes(&self, _flow: &FlowTuple) -> ProcessNames {
        ProcessNames::default()
    }
}
