use std::cell::RefCell;
use std::rc::Rc;

use bytes::Bytes;

use tickloom_runtime::{
    MessageBus, PendingFuture, QuorumAggregator, QuorumCallback, QuorumError, RuntimeError,
    WaitingList,
};
use tickloom_types::{CorrelationId, Message, MessageType, PeerType, ProcessId, Tick};

/// Shared state and operations every `Process` implementation composes
/// (§4.F). `ProcessBase` is not itself a trait object — concrete
/// replicas and clients hold one as a field and implement
/// `tickloom_runtime::MessageHandler` by hand, routing through
/// [`ProcessBase::intercept_response`] first.
pub struct ProcessBase {
    id: ProcessId,
    peer_type: PeerType,
    peers: Vec<ProcessId>,
    bus: Rc<RefCell<MessageBus>>,
    waiting_list: WaitingList,
    correlation_sequence: u64,
    current_tick: Tick,
}

impl ProcessBase {
    pub fn new(
        id: ProcessId,
        peer_type: PeerType,
        peers: Vec<ProcessId>,
        bus: Rc<RefCell<MessageBus>>,
        timeout_ticks: u64,
    ) -> Self {
        Self {
            id,
            peer_type,
            peers,
            bus,
            waiting_list: WaitingList::new(timeout_ticks),
            correlation_sequence: 0,
            current_tick: Tick::ZERO,
        }
    }

    pub fn id(&self) -> &ProcessId {
        &self.id
    }

    /// Defensive copy: callers can't mutate this process's view of its
    /// peers through the returned vec (§3 "never leak iterators" into
    /// owned mutable collections).
    pub fn peers(&self) -> Vec<ProcessId> {
        self.peers.clone()
    }

    pub fn waiting_list(&self) -> &WaitingList {
        &self.waiting_list
    }

    pub fn current_tick(&self) -> Tick {
        self.current_tick
    }

    /// Mints a correlation id unique to this process: `"{id}-{n}"` with
    /// a per-process monotonic counter, so two processes never collide
    /// even if they happen to pick the same numeric sequence (§4.F).
    pub fn next_correlation_id(&mut self) -> CorrelationId {
        self.correlation_sequence += 1;
        CorrelationId::from(format!("{}-{}", self.id, self.correlation_sequence))
    }

    /// Sends one message through the bound `MessageBus`, stamping
    /// `source` and `peer_type` from this process.
    pub fn send(&self, destination: ProcessId, message_type: MessageType, payload: Bytes, correlation_id: CorrelationId) {
        let message = Message::new(
            self.id.clone(),
            destination,
            self.peer_type,
            message_type,
            payload,
            correlation_id,
        );
        self.bus.borrow().send(message);
    }

    /// Registers a one-shot waiting-list entry and returns the future
    /// it will resolve (§4.E/§4.F single-request/response pattern).
    pub fn await_response(&mut self, correlation_id: CorrelationId) -> PendingFuture<Message, RuntimeError> {
        let future = PendingFuture::new();
        let callback = SingleResponse {
            future: future.clone(),
        };
        // A duplicate correlation id here is a caller bug (ids come from
        // `next_correlation_id`); propagating it as a panic matches how
        // `MessageBus::send` treats its own setup invariant.
        self.waiting_list
            .add(correlation_id, Box::new(callback), self.current_tick)
            .expect("correlation id must be fresh");
        future
    }

    /// Routes a delivered message: if it answers one of this process's
    /// own outstanding requests, the waiting list consumes it and this
    /// returns `None`. Otherwise the message is unclaimed and returned
    /// to the caller for protocol-specific handling (§4.F).
    pub fn intercept_response(&mut self, message: Message) -> Option<Message> {
        if self.waiting_list.contains(&message.correlation_id) {
            let from = message.source.clone();
            let correlation_id = message.correlation_id.clone();
            self.waiting_list.handle_response(&correlation_id, message, from);
            None
        } else {
            Some(message)
        }
    }

    /// Adopts `now` as this process's notion of the current tick and
    /// expires any waiting-list entries whose timeout has elapsed.
    ///
    /// `now` comes from this process's `LogicalClock`, which the owning
    /// `Cluster` advances (or skews, for tests) before calling this —
    /// `ProcessBase` never increments its own clock, so injected skew
    /// is visible here rather than overridden by it (§4.G).
    pub fn tick(&mut self, now: Tick) {
        self.current_tick = now;
        self.waiting_list.tick(self.current_tick);
    }

    /// Fans `message_type` out to every peer except this process
    /// itself (§9 open-question resolution: broadcasts never include
    /// the sender), one correlation id per destination, and returns a
    /// future that resolves once `quorum` of the decoded responses
    /// satisfy `predicate`, or fails once that becomes impossible
    /// (§4.E/§4.F).
    pub fn broadcast_to_all_replicas<R: Clone + 'static>(
        &mut self,
        message_type: MessageType,
        mut payload_for: impl FnMut(&ProcessId) -> Bytes,
        quorum: usize,
        predicate: impl Fn(&R) -> bool + 'static,
        decode: impl Fn(&Message) -> Option<R> + 'static,
    ) -> PendingFuture<Vec<R>, QuorumError> {
        let targets: Vec<ProcessId> = self.peers.iter().filter(|p| **p != self.id).cloned().collect();
        let aggregator = Rc::new(RefCell::new(QuorumAggregator::new(quorum, targets.len(), predicate)));
        let decode: Rc<dyn Fn(&Message) -> Option<R>> = Rc::new(decode);
        let future = aggregator.borrow().future();

        for peer in targets {
            let correlation_id = self.next_correlation_id();
            let callback = QuorumCallback::new(Rc::clone(&aggregator), Rc::clone(&decode), peer.clone());
            self.waiting_list
                .add(correlation_id.clone(), Box::new(callback), self.current_tick)
                .expect("correlation id must be fresh");
            self.send(peer.clone(), message_type, payload_for(&peer), correlation_id);
        }

        future
    }
}

struct SingleResponse {
    future: PendingFuture<Message, RuntimeError>,
}

impl tickloom_runtime::WaitingCallback for SingleResponse {
    fn on_response(&mut self, response: Message, _from: ProcessId) {
        let _ = self.future.complete(response);
    }

    fn on_error(&mut self, error: RuntimeError) {
        let _ = self.future.fail(error);
    }

    fn is_complete(&self) -> bool {
        true
    }
}
