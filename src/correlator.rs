//! Transaction correlator.
//!
//! Pairs a request observed on one flow direction with its reply on the
//! other, publishing completed (or presumed one-way) transactions onto a
//! bounded channel for [`crate::publisher`] to drain. At most one pending
//! transaction exists per flow tuple; a second request supersedes the
//! first, publishing it as one-way.

use crate::model::{Direction, Endpoint, FlowTuple, Message, Transaction};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::hash::{Hash, Hasher};
use std::sync::mpsc::SyncSender;
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

struct PendingEntry {
    transaction: Transaction,
    generation: u64,
}

/// One armed expiry timer. Ordered by `deadline` only, so a `BinaryHeap` of
/// these (wrapped in [`Reverse`]) acts as a min-heap over time.
struct TimerEntry {
    deadline: SystemTime,
    flow: FlowTuple,
    generation: u64,
}

impl PartialEq for TimerEntry {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline
    }
}
impl Eq for TimerEntry {}
impl PartialOrd for TimerEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for TimerEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.deadline.cmp(&other.deadline)
    }
}

/// Maps live flows to pending transactions and drives expiry. Single-
/// threaded: the caller owns exclusive access to one instance (or uses
/// [`ShardedCorrelator`] to spread flows across threads).
pub struct TransactionCorrelator {
    pending: HashMap<FlowTuple, PendingEntry>,
    timers: BinaryHeap<Reverse<TimerEntry>>,
    next_generation: u64,
    timeout: Duration,
    publish_tx: SyncSender<Transaction>,
}

impl TransactionCorrelator {
    pub fn new(timeout: Duration, publish_tx: SyncSender<Transaction>) -> Self {
        TransactionCorrelator {
            pending: HashMap::new(),
            timers: BinaryHeap::new(),
            next_generation: 0,
            timeout,
            publish_tx,
        }
    }

    /// A request arrived. If a transaction was already pending for this
    /// flow tuple, it is published as presumed one-way first.
    pub fn on_request(&mut self, msg: Message) {
        if let Some(superseded) = self.pending.remove(&msg.flow) {
            crate::logging::warn(&format!(
                "request {:?} superseded pending request {:?} on the same flow, publishing it as one-way",
                msg.method, superseded.transaction.request.method
            ));
            self.publish(superseded.transaction);
        }

        let generation = self.next_generation;
        self.next_generation += 1;
        let deadline = msg.timestamp + self.timeout;
        let flow = msg.flow;
        let (source, destination) = endpoints_for(&msg);
        let transaction = Transaction {
            flow,
            source,
            destination,
            request_timestamp: msg.timestamp,
            request: msg,
            reply: None,
        };
        self.pending.insert(flow, PendingEntry { transaction, generation });
        self.timers.push(Reverse(TimerEntry { deadline, flow, generation }));
    }

    /// A reply arrived. Dropped silently if there is no pending transaction
    /// for this flow tuple, or if the method name doesn't match the
    /// pending request's.
    pub fn on_reply(&mut self, msg: Message) {
        let matches = self
            .pending
            .get(&msg.flow)
            .map(|entry| entry.transaction.request.method == msg.method)
            .unwrap_or(false);
        if !matches {
            crate::logging::warn(&format!(
                "dropping reply for {:?}: no matching pending request",
                msg.method
            ));
            return;
        }
        let mut entry = self.pending.remove(&msg.flow).expect("presence checked above");
        entry.transaction.reply = Some(msg);
        self.publish(entry.transaction);
    }

    /// The flow reached FIN. Any pending request with no reply yet is
    /// published as one-way.
    pub fn on_fin(&mut self, flow: FlowTuple) {
        if let Some(entry) = self.pending.remove(&flow) {
            self.publish(entry.transaction);
        }
    }

    /// Removes every transaction whose deadline has passed as of `now`,
    /// without publishing. Generation-tagged so a timer for a superseded or
    /// already-published transaction is a no-op rather than expiring a
    /// reused slot.
    pub fn sweep_expired(&mut self, now: SystemTime) {
        while let Some(Reverse(top)) = self.timers.peek() {
            if top.deadline > now {
                break;
            }
            let Reverse(entry) = self.timers.pop().expect("peeked above");
            let still_current = self
                .pending
                .get(&entry.flow)
                .map(|pending| pending.generation == entry.generation)
                .unwrap_or(false);
            if still_current {
                let expired = self.pending.remove(&entry.flow);
                if let Some(expired) = expired {
                    crate::logging::warn(&format!(
                        "request {:?} on flow {:?} expired with no reply, dropping without publishing",
                        expired.transaction.request.method, entry.flow
                    ));
                }
            }
        }
    }

    fn publish(&self, transaction: Transaction) {
        if self.publish_tx.send(transaction).is_err() {
            crate::logging::warn("publish channel closed, dropping transaction");
        }
    }
}

fn endpoints_for(msg: &Message) -> (Endpoint, Endpoint) {
    let flow = msg.flow;
    let (mut source, mut destination) = match msg.direction {
        Direction::Forward => (
            Endpoint::new(flow.src_ip, flow.src_port),
            Endpoint::new(flow.dst_ip, flow.dst_port),
        ),
        Direction::Reverse => (
            Endpoint::new(flow.dst_ip, flow.dst_port),
            Endpoint::new(flow.src_ip, flow.src_port),
        ),
    };
    match msg.direction {
        Direction::Forward => {
            source.process = msg.process_names.src.clone();
            destination.process = msg.process_names.dst.clone();
        }
        Direction::Reverse => {
            source.process = msg.process_names.dst.clone();
            destination.process = msg.process_names.src.clone();
        }
    }
    (source, destination)
}

/// A fixed array of independently-locked [`TransactionCorrelator`] shards,
/// flow tuple hashed to a shard, for callers who want to spread flows
/// across worker threads without a single global lock.
pub struct ShardedCorrelator {
    shards: Vec<Mutex<TransactionCorrelator>>,
}

impl ShardedCorrelator {
    pub fn new(shard_count: usize, timeout: Duration, publish_tx: SyncSender<Transaction>) -> Self {
        let shards = (0..shard_count.max(1))
            .map(|_| Mutex::new(TransactionCorrelator::new(timeout, publish_tx.clone())))
            .collect();
        ShardedCorrelator { shards }
    }

    fn shard_for(&self, flow: &FlowTuple) -> &Mutex<TransactionCorrelator> {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        flow.hash(&mut hasher);
        let index = (hasher.finish() as usize) % self.shards.len();
        &self.shards[index]
    }

    pub fn on_request(&self, msg: Message) {
        self.shard_for(&msg.flow).lock().unwrap().on_request(msg);
    }

    pub fn on_reply(&self, msg: Message) {
        self.shard_for(&msg.flow).lock().unwrap().on_reply(msg);
    }

    pub fn on_fin(&self, flow: FlowTuple) {
        self.shard_for(&flow).lock().unwrap().on_fin(flow);
    }

    pub fn sweep_expired(&self, now: SystemTime) {
        for shard in &self.shards {
            shard.lock().unwrap().sweep_expired(now);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::wire::MessageType;
    use std::net::{IpAddr, Ipv4Addr};
    use std::sync::mpsc::sync_channel;

    fn flow() -> FlowTuple {
        FlowTuple {
            src_ip: IpAddr::V4(Ipv4Addr::LOCALHOST),
            src_port: 1,
            dst_ip: IpAddr::V4(Ipv4Addr::LOCALHOST),
            dst_port: 2,
            flow_id: 0,
        }
    }

    fn message(method: &str, is_request: bool, direction: Direction, timestamp: SystemTime) -> Message {
        let mut msg = Message::new(flow(), direction, timestamp);
        msg.method = method.to_string();
        msg.is_request = is_request;
        msg.message_type = if is_request { MessageType::Call } else { MessageType::Reply };
        msg
    }

    #[test]
    fn request_then_matching_reply_publishes_once() {
        let (tx, rx) = sync_channel(10);
        let mut correlator = TransactionCorrelator::new(Duration::from_secs(10), tx);
        let now = SystemTime::now();
        correlator.on_request(message("add", true, Direction::Forward, now));
        correlator.on_reply(message("add", false, Direction::Reverse, now));

        let published = rx.try_recv().expect("one publish expected");
        assert_eq!(published.request.method, "add");
        assert!(published.reply.is_some());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn orphaned_reply_is_dropped() {
        let (tx, rx) = sync_channel(10);
        let mut correlator = TransactionCorrelator::new(Duration::from_secs(10), tx);
        correlator.on_reply(message("foo", false, Direction::Reverse, SystemTime::now()));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn mismatched_method_reply_is_dropped() {
        let (tx, rx) = sync_channel(10);
        let mut correlator = TransactionCorrelator::new(Duration::from_secs(10), tx);
        let now = SystemTime::now();
        correlator.on_request(message("add", true, Direction::Forward, now));
        correlator.on_reply(message("subtract", false, Direction::Reverse, now));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn second_request_supersedes_first_as_one_way() {
        let (tx, rx) = sync_channel(10);
        let mut correlator = TransactionCorrelator::new(Duration::from_secs(10), tx);
        let now = SystemTime::now();
        correlator.on_request(message("first", true, Direction::Forward, now));
        correlator.on_request(message("second", true, Direction::Forward, now));

        let published = rx.try_recv().expect("superseded request published");
        assert_eq!(published.request.method, "first");
        assert!(published.reply.is_none());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn expired_transaction_is_not_published() {
        let (tx, rx) = sync_channel(10);
        let mut correlator = TransactionCorrelator::new(Duration::from_millis(5), tx);
        let now = SystemTime::now();
        correlator.on_request(message("add", true, Direction::Forward, now));
        correlator.sweep_expired(now + Duration::from_secs(1));
        assert!(rx.try_recv().is_err());
        // a late reply after expiry finds nothing pending
        correlator.on_reply(message("add", false, Direction::Reverse, now));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn fin_publishes_pending_request_as_one_way() {
        let (tx, rx) = sync_channel(10);
        let mut correlator = TransactionCorrelator::new(Duration::from_secs(10), tx);
        let now = SystemTime::now();
        correlator.on_request(message("add", true, Direction::Forward, now));
        correlator.on_fin(flow());
        let published = rx.try_recv().expect("fin publishes pending request");
        assert!(published.reply.is_none());
    }
}
