use std::fmt::{self, Display};
use std::sync::Arc;

use bytes::Bytes;

use crate::process_id::ProcessId;

/// Role a process plays in a message exchange.
///
/// `UNKNOWN` covers internal test peers and any process that hasn't
/// declared itself; the field exists purely for routing/diagnostics,
/// never for trust decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeerType {
    Unknown,
    Client,
    Server,
}

/// A correlation id binds a response to the waiting-list entry created
/// by its originating request. Reuse while the id is live in a
/// waiting list is a programmer error (`RuntimeError::DuplicateCorrelationId`
/// in `tickloom-runtime`), not a recoverable condition.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CorrelationId(Arc<str>);

impl CorrelationId {
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CorrelationId({})", self.0)
    }
}

impl From<&str> for CorrelationId {
    fn from(value: &str) -> Self {
        Self(Arc::from(value))
    }
}

impl From<String> for CorrelationId {
    fn from(value: String) -> Self {
        Self(Arc::from(value.as_str()))
    }
}

/// A message-type tag.
///
/// Deliberately not a closed Rust `enum`: §3 calls for "a small named
/// enum extensible at runtime", which in a framework whose concrete
/// replication protocol lives entirely outside the core (§1 Scope)
/// means applications must be able to mint new tags without touching
/// this crate. A `MessageType` is a cheap, `Copy`, string-interned tag;
/// equality and hashing are by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageType(&'static str);

impl MessageType {
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub const fn name(&self) -> &'static str {
        self.0
    }

    /// Reserved for internal ping/heartbeat traffic the scheduler or
    /// transport layer may need irrespective of application protocol.
    pub const PING: MessageType = MessageType::new("tickloom.ping");
}

impl Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An immutable request/response record routed between processes.
///
/// Messages are value-owned by whichever component currently holds
/// them (network queue, bus, process handler); sending, delivering,
/// and completing a future all transfer ownership by move rather than
/// by reference, matching §3's ownership model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub source: ProcessId,
    pub destination: ProcessId,
    pub peer_type: PeerType,
    pub message_type: MessageType,
    pub payload: Bytes,
    pub correlation_id: CorrelationId,
}

impl Message {
    pub fn new(
        source: ProcessId,
        destination: ProcessId,
        peer_type: PeerType,
        message_type: MessageType,
        payload: Bytes,
        correlation_id: CorrelationId,
    ) -> Self {
        Self {
            source,
            destination,
            peer_type,
            message_type,
            payload,
            correlation_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_type_equal_by_name() {
        const A: MessageType = MessageType::new("prepare");
        const B: MessageType = MessageType::new("prepare");
        const C: MessageType = MessageType::new("commit");
        assert_eq!(A, B);
        assert_ne!(A, C);
    }

    #[test]
    fn correlation_id_display() {
        let cid = CorrelationId::from("req-1");
        assert_eq!(cid.to_string(), "req-1");
    }
}
