//! Flow dispatcher.
//!
//! Owns the per-(flow, direction) [`Stream`] table, feeds it reassembled
//! segments, and hands completed messages off to the caller. Any panic
//! surfacing from decoding is trapped here and converted into a dropped
//! stream, so one malformed flow can't take the whole process down.

use crate::config::Config;
use crate::idl::IdlResolver;
use crate::model::{Direction, FlowTuple, Message};
use crate::process::ProcessAttributor;
use crate::stream::{Stream, StepOutcome};
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::time::SystemTime;

pub struct FlowDispatcher<'a> {
    cfg: Config,
    streams: HashMap<(FlowTuple, Direction), Stream>,
    idl: &'a dyn IdlResolver,
    process_attributor: &'a dyn ProcessAttributor,
}

impl<'a> FlowDispatcher<'a> {
    pub fn new(cfg: Config, idl: &'a dyn IdlResolver, process_attributor: &'a dyn ProcessAttributor) -> Self {
        FlowDispatcher {
            cfg,
            streams: HashMap::new(),
            idl,
            process_attributor,
        }
    }

    /// Feeds one reassembled segment through the dispatcher, returning every
    /// message that completed as a result (zero, one, or more when several
    /// messages were pipelined in the same segment).
    pub fn on_segment(
        &mut self,
        flow: FlowTuple,
        direction: Direction,
        payload: &[u8],
        timestamp: SystemTime,
    ) -> Vec<Message> {
        let key = (flow, direction);
        let stream = self.streams.entry(key).or_insert_with(|| Stream::new(self.cfg.transport_type));

        if stream.skip_input {
            return Vec::new();
        }

        stream.append(payload);

        if stream.buffered_len() > self.cfg.tcp_max_data_in_stream {
            crate::logging::warn(&format!(
                "flow exceeded tcp_max_data_in_stream ({} bytes), dropping",
                self.cfg.tcp_max_data_in_stream
            ));
            self.streams.remove(&key);
            return Vec::new();
        }

        // Cloned rather than borrowed so later calls in this loop that need
        // `&mut self` (e.g. `clear_reverse_skip`) aren't blocked by a live
        // shared borrow of `self.cfg`.
        let cfg = self.cfg.clone();
        let idl = self.idl;
        let process_attributor = self.process_attributor;
        let mut completed = Vec::new();

        loop {
            let stream = self.streams.get_mut(&key).expect("stream inserted above");
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| stream.step(&cfg, flow, direction, timestamp, idl)));

            let outcome = match outcome {
                Ok(outcome) => outcome,
                Err(_) => {
                    crate::logging::warn("internal fault trapped while decoding, dropping flow");
                    self.streams.remove(&key);
                    return completed;
                }
            };

            match outcome {
                StepOutcome::Invalid => {
                    self.streams.remove(&key);
                    return completed;
                }
                StepOutcome::NeedMore => return completed,
                StepOutcome::Complete(mut message) => {
                    message.process_names = process_attributor.find_processes(&flow);
                    let is_request = message.is_request;
                    let is_reply = !is_request;
                    completed.push(message);

                    let stream = self.streams.get_mut(&key).expect("stream inserted above");
                    if is_reply && !cfg.capture_reply {
                        stream.flush();
                        stream.skip_input = true;
                    } else {
                        stream.advance_past_completed_message();
                    }
                    if is_request && !cfg.capture_reply {
                        self.clear_reverse_skip(flow, direction);
                    }
                }
            }
        }
    }

    /// Notification that a flow direction has reached FIN: any stream state
    /// for it is torn down (the correlator, not the dispatcher, is
    /// responsible for publishing a pending one-way transaction).
    pub fn on_fin(&mut self, flow: FlowTuple, direction: Direction) {
        self.streams.remove(&(flow, direction));
    }

    /// Clears `skip_input` on the reverse direction once a request
    /// completes while reply bodies are not being captured, so at least the
    /// reply's header can still be observed.
    fn clear_reverse_skip(&mut self, flow: FlowTuple, direction: Direction) {
        let reverse = match direction {
            Direction::Forward => Direction::Reverse,
            Direction::Reverse => Direction::Forward,
        };
        if let Some(stream) = self.streams.get_mut(&(flow, reverse)) {
            stream.skip_input = false;
        }
    }
}
