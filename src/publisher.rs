//! Bounded publish channel and event construction.
//!
//! The correlator hands each completed [`Transaction`] to a bounded
//! `sync_channel`; this module drains that channel on a separate thread (or
//! however the caller chooses to drive [`run`]), turning each transaction
//! into the downstream [`Event`] and forwarding it to a caller-supplied
//! [`EventSink`]. This is the single point of backpressure between the hot
//! decode path and whatever external system actually ships events.

use crate::config::Config;
use crate::model::{Event, Message, ReplySummary, RequestSummary, Status, Transaction};
use std::sync::mpsc::{sync_channel, Receiver, SyncSender};

/// A sink for completed events, implemented by the downstream telemetry
/// publisher. The core depends only on this narrow trait, never on a
/// concrete transport.
pub trait EventSink {
    fn publish(&mut self, event: Event);
}

/// Builds the `(sender, receiver)` pair a [`crate::correlator::TransactionCorrelator`]
/// publishes onto, sized per `cfg.publish_channel_capacity`.
pub fn channel(cfg: &Config) -> (SyncSender<Transaction>, Receiver<Transaction>) {
    sync_channel(cfg.publish_channel_capacity)
}

/// Drains `rx` until every sender has been dropped, converting each
/// [`Transaction`] to an [`Event`] and handing it to `sink`. Intended to run
/// on a dedicated consumer thread/task; this function itself blocks.
pub fn run(cfg: &Config, rx: Receiver<Transaction>, mut sink: impl EventSink) {
    for transaction in rx {
        sink.publish(build_event(cfg, transaction));
    }
}

/// Converts one correlated transaction into the outbound event shape. A
/// transaction with no reply (one-way, orphaned-FIN, or superseded)
/// publishes with `reply: None` and `status: OK` — there is no exception to
/// report.
fn build_event(cfg: &Config, transaction: Transaction) -> Event {
    let reply_timestamp = transaction
        .reply
        .as_ref()
        .map(|reply| reply.timestamp)
        .unwrap_or(transaction.request_timestamp);
    let response_time_ms = transaction.response_time_ms(reply_timestamp);

    let request = &transaction.request;
    let request_summary = RequestSummary {
        method: request.method.clone(),
        params: request.params.clone().unwrap_or_default(),
        size: request.frame_size,
    };

    let (status, reply_summary) = match &transaction.reply {
        Some(reply) => {
            let status = if reply.has_exception { Status::Error } else { Status::Ok };
            let summary = ReplySummary {
                return_value: reply.return_value.clone().unwrap_or_default(),
                exceptions: reply.exceptions.clone().unwrap_or_default(),
                size: reply.frame_size,
            };
            (status, Some(summary))
        }
        None => (Status::Ok, None),
    };

    Event {
        type_tag: "thrift",
        status,
        response_time_ms,
        service: request.service.clone(),
        raw_request: cfg.send_request.then(|| raw_dump(request)),
        raw_response: if cfg.send_response {
            transaction.reply.as_ref().map(raw_dump)
        } else {
            None
        },
        request: request_summary,
        reply: reply_summary,
        source: transaction.source,
        destination: transaction.destination,
    }
}

/// A compact single-line rendering of a decoded message, used for the
/// optional `raw_request`/`raw_response` event fields. This crate never
/// retains the original wire bytes past a completed message, so "raw" here
/// means the formatted struct rendering, not the bytes on the wire.
fn raw_dump(message: &Message) -> String {
    if message.is_request {
        format!("{}{}", message.method, message.params.as_deref().unwrap_or("()"))
    } else if message.has_exception {
        format!("{} throws {}", message.method, message.exceptions.as_deref().unwrap_or("()"))
    } else {
        format!("{} -> {}", message.method, message.return_value.as_deref().unwrap_or(""))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::model::{Direction, Endpoint, FlowTuple};
    use crate::wire::MessageType;
    use std::net::{IpAddr, Ipv4Addr};
    use std::time::SystemTime;

    fn flow() -> FlowTuple {
        FlowTuple {
            src_ip: IpAddr::V4(Ipv4Addr::LOCALHOST),
            src_port: 1,
            dst_ip: IpAddr::V4(Ipv4Addr::LOCALHOST),
            dst_port: 2,
            flow_id: 0,
        }
    }

    fn request(method: &str) -> Message {
        let mut msg = Message::new(flow(), Direction::Forward, SystemTime::now());
        msg.is_request = true;
        msg.message_type = MessageType::Call;
        msg.method = method.to_string();
        msg.params = Some("(1: 7)".to_string());
        msg.frame_size = 20;
        msg
    }

    fn reply(method: &str) -> Message {
        let mut msg = Message::new(flow(), Direction::Reverse, SystemTime::now());
        msg.message_type = MessageType::Reply;
        msg.method = method.to_string();
        msg.return_value = Some("7".to_string());
        msg.exceptions = Some(String::new());
        msg.frame_size = 12;
        msg
    }

    fn transaction(request: Message, reply: Option<Message>) -> Transaction {
        Transaction {
            flow: flow(),
            source: Endpoint::new(flow().src_ip, flow().src_port),
            destination: Endpoint::new(flow().dst_ip, flow().dst_port),
            request_timestamp: request.timestamp,
            request,
            reply,
        }
    }

    #[test]
    fn completed_transaction_builds_ok_event() {
        let cfg = Config::default();
        let event = build_event(&cfg, transaction(request("add"), Some(reply("add"))));
        assert_eq!(event.type_tag, "thrift");
        assert_eq!(event.status, Status::Ok);
        assert_eq!(event.request.method, "add");
        assert_eq!(event.reply.unwrap().return_value, "7");
        assert!(event.raw_request.is_none());
        assert!(event.raw_response.is_none());
    }

    #[test]
    fn one_way_transaction_has_no_reply_summary() {
        let cfg = Config::default();
        let event = build_event(&cfg, transaction(request("fireAndForget"), None));
        assert_eq!(event.status, Status::Ok);
        assert!(event.reply.is_none());
    }

    #[test]
    fn exception_reply_sets_error_status() {
        let cfg = Config::default();
        let mut err_reply = reply("add");
        err_reply.has_exception = true;
        err_reply.return_value = Some(String::new());
        err_reply.exceptions = Some("(1: (...))".to_string());
        let event = build_event(&cfg, transaction(request("add"), Some(err_reply)));
        assert_eq!(event.status, Status::Error);
        assert_eq!(event.reply.unwrap().exceptions, "(1: (...))");
    }

    #[test]
    fn raw_strings_included_only_when_flags_set() {
        let mut cfg = Config::default();
        cfg.send_request = true;
        cfg.send_response = true;
        let event = build_event(&cfg, transaction(request("add"), Some(reply("add"))));
        assert!(event.raw_request.unwrap().contains("add"));
        assert!(event.raw_response.unwrap().contains("7"));
    }

    #[test]
    fn publish_channel_drains_transactions_into_events() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let cfg = Config::default();
        let (tx, rx) = channel(&cfg);
        tx.send(transaction(request("ping"), None)).unwrap();
        drop(tx);

        struct Collect(Rc<RefCell<Vec<Event>>>);
        impl EventSink for Collect {
            fn publish(&mut self, event: Event) {
                self.0.borrow_mut().push(event);
            }
        }
        let received = Rc::new(RefCell::new(Vec::new()));
        run(&cfg, rx, Collect(received.clone()));
        assert_eq!(received.borrow().len(), 1);
        assert_eq!(received.borrow()[0].request.method, "ping");
    }
}
