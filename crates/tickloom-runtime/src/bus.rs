use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tickloom_types::{Message, ProcessId};

/// Anything that can receive a delivered [`Message`] (§4.D).
///
/// Implemented by `tickloom-process::Process`; kept as a trait here so
/// the bus has no dependency on the process crate.
pub trait MessageHandler {
    fn on_message_received(&mut self, message: Message);
}

/// Whatever transport a bus forwards outgoing sends to (§4.D
/// `send(message)`).
///
/// Implemented by `tickloom-net`'s simulated and real networks; kept
/// as a trait here rather than a dependency on `tickloom-net` to avoid
/// a crate cycle (the network depends on the bus to deliver incoming
/// messages, not the other way around).
pub trait NetworkSender {
    fn send(&mut self, message: Message);
}

/// Routes delivered messages from the network layer to per-process
/// handlers (§4.D).
///
/// The bus never suspends or buffers: `on_message` dispatches
/// synchronously to the registered handler, or drops the message if
/// none is registered (observable only via tests, per §9's adopted
/// "drop and log" resolution of the open question in §9).
#[derive(Default)]
pub struct MessageBus {
    handlers: HashMap<ProcessId, Rc<RefCell<dyn MessageHandler>>>,
    network: Option<Rc<RefCell<dyn NetworkSender>>>,
}

impl MessageBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds the transport `send` forwards to. Set once, at
    /// construction time, by whatever wires up a `Cluster`.
    pub fn set_network(&mut self, network: Rc<RefCell<dyn NetworkSender>>) {
        self.network = Some(network);
    }

    /// Forwards to the underlying network (§4.D). Panics if no network
    /// has been bound — a bus with no transport is a setup bug, not a
    /// runtime condition to recover from.
    pub fn send(&self, message: Message) {
        match &self.network {
            Some(network) => network.borrow_mut().send(message),
            None => panic!("MessageBus::send called before a network was bound"),
        }
    }

    /// One handler per process id; re-registration replaces the
    /// previous handler.
    pub fn register_handler(&mut self, process_id: ProcessId, handler: Rc<RefCell<dyn MessageHandler>>) {
        self.handlers.insert(process_id, handler);
    }

    pub fn unregister_handler(&mut self, process_id: &ProcessId) {
        self.handlers.remove(process_id);
    }

    /// Invoked by the network layer when a message is ready for
    /// delivery. Dispatches to `message.destination`'s handler, or
    /// drops it.
    pub fn on_message(&self, message: Message) {
        match self.handlers.get(&message.destination) {
            Some(handler) => handler.borrow_mut().on_message_received(message),
            None => {
                tracing::debug!(
                    destination = %message.destination,
                    "message dropped: no handler registered for destination"
                );
            }
        }
    }

    /// No inherent work; present so `Cluster::tick` can treat every
    /// component uniformly (§4.D).
    pub fn tick(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use tickloom_types::{CorrelationId, MessageType, PeerType};

    struct Recorder {
        received: Vec<Message>,
    }

    impl MessageHandler for Recorder {
        fn on_message_received(&mut self, message: Message) {
            self.received.push(message);
        }
    }

    fn sample(destination: &str) -> Message {
        Message::new(
            ProcessId::from("src"),
            ProcessId::from(destination),
            PeerType::Server,
            MessageType::new("test"),
            bytes::Bytes::new(),
            CorrelationId::from("c1"),
        )
    }

    #[test]
    fn dispatches_to_registered_handler() {
        let mut bus = MessageBus::new();
        let recorder = Rc::new(RefCell::new(Recorder {
            received: Vec::new(),
        }));
        bus.register_handler(ProcessId::from("dst"), recorder.clone());
        bus.on_message(sample("dst"));
        assert_eq!(recorder.borrow().received.len(), 1);
    }

    #[test]
    fn drops_message_for_unregistered_destination() {
        let bus = MessageBus::new();
        // Should not panic.
        bus.on_message(sample("nobody"));
    }

    #[test]
    fn reregistration_replaces_handler() {
        let mut bus = MessageBus::new();
        let first = Rc::new(RefCell::new(Recorder {
            received: Vec::new(),
        }));
        let second = Rc::new(RefCell::new(Recorder {
            received: Vec::new(),
        }));
        bus.register_handler(ProcessId::from("dst"), first.clone());
        bus.register_handler(ProcessId::from("dst"), second.clone());
        bus.on_message(sample("dst"));
        assert!(first.borrow().received.is_empty());
        assert_eq!(second.borrow().received.len(), 1);
    }
}
