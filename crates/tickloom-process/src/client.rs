use std::cell::RefCell;
use std::rc::Rc;

use bytes::Bytes;

use tickloom_runtime::{MessageBus, MessageHandler, PendingFuture, RuntimeError};
use tickloom_types::{Message, MessageType, PeerType, ProcessId};

use crate::base::ProcessBase;

/// A minimal client process (§4.F): sends a request to one replica and
/// awaits the correlated reply. Real applications will usually wrap
/// this with retry-on-timeout or leader-redirect logic; `Client` itself
/// only implements the one-shot request/response exchange the rest of
/// that logic is built from.
pub struct Client {
    base: ProcessBase,
}

impl Client {
    pub fn new(id: ProcessId, bus: Rc<RefCell<MessageBus>>, timeout_ticks: u64) -> Self {
        Self {
            base: ProcessBase::new(id, PeerType::Client, Vec::new(), bus, timeout_ticks),
        }
    }

    pub fn id(&self) -> &ProcessId {
        self.base.id()
    }

    /// Sends `payload` as `message_type` to `destination` and returns a
    /// future resolving with the correlated reply, or a timeout error
    /// if none arrives within this client's configured timeout.
    pub fn send_request(
        &mut self,
        destination: ProcessId,
        message_type: MessageType,
        payload: Bytes,
    ) -> PendingFuture<Message, RuntimeError> {
        let correlation_id = self.base.next_correlation_id();
        let future = self.base.await_response(correlation_id.clone());
        self.base.send(destination, message_type, payload, correlation_id);
        future
    }

    pub fn tick(&mut self, now: tickloom_types::Tick) {
        self.base.tick(now);
    }
}

impl MessageHandler for Client {
    fn on_message_received(&mut self, message: Message) {
        if self.base.intercept_response(message).is_some() {
            tracing::debug!(
                destination = %self.base.id(),
                "client received an unclaimed message; clients only expect replies to their own requests"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell as StdRefCell;
    use tickloom_types::CorrelationId;

    struct FakeNetwork {
        sent: Rc<StdRefCell<Vec<Message>>>,
    }

    impl tickloom_runtime::NetworkSender for FakeNetwork {
        fn send(&mut self, message: Message) {
            self.sent.borrow_mut().push(message);
        }
    }

    fn wired_bus() -> (Rc<RefCell<MessageBus>>, Rc<StdRefCell<Vec<Message>>>) {
        let sent = Rc::new(StdRefCell::new(Vec::new()));
        let network = Rc::new(RefCell::new(FakeNetwork { sent: sent.clone() }));
        let mut bus = MessageBus::new();
        bus.set_network(network);
        (Rc::new(RefCell::new(bus)), sent)
    }

    #[test]
    fn send_request_then_receiving_reply_resolves_future() {
        let (bus, sent) = wired_bus();
        let mut client = Client::new(ProcessId::from("client-1"), bus, 5);

        let future = client.send_request(ProcessId::from("replica-1"), MessageType::new("get"), Bytes::new());
        assert_eq!(sent.borrow().len(), 1);
        let correlation_id = sent.borrow()[0].correlation_id.clone();

        let reply = Message::new(
            ProcessId::from("replica-1"),
            ProcessId::from("client-1"),
            PeerType::Server,
            MessageType::new("get-reply"),
            Bytes::from_static(b"value"),
            correlation_id,
        );
        client.on_message_received(reply);
        assert_eq!(future.get_result().unwrap().payload, Bytes::from_static(b"value"));
    }

    #[test]
    fn timeout_fails_future_with_runtime_error() {
        let (bus, _sent) = wired_bus();
        let mut client = Client::new(ProcessId::from("client-1"), bus, 2);
        let future = client.send_request(ProcessId::from("replica-1"), MessageType::new("get"), Bytes::new());

        client.tick(tickloom_types::Tick(1));
        client.tick(tickloom_types::Tick(2));
        client.tick(tickloom_types::Tick(3));
        assert_eq!(future.get_exception().unwrap(), RuntimeError::Timeout);
    }

    #[test]
    fn unclaimed_message_is_logged_and_dropped_not_panicked() {
        let (bus, _sent) = wired_bus();
        let mut client = Client::new(ProcessId::from("client-1"), bus, 5);
        let stray = Message::new(
            ProcessId::from("replica-1"),
            ProcessId::from("client-1"),
            PeerType::Server,
            MessageType::new("unexpected"),
            Bytes::new(),
            CorrelationId::from("no-such-request"),
        );
        client.on_message_received(stray);
    }
}
