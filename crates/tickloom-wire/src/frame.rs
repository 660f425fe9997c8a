use bytes::{Bytes, BytesMut, Buf, BufMut};

use crate::error::{WireError, WireResult};

/// 4-byte stream id || 1-byte frame type || 4-byte big-endian payload
/// length || payload. See §3/§6.
pub const HEADER_SIZE: usize = 9;

/// 10 MiB. Frames larger than this are a fatal stream error.
pub const MAX_PAYLOAD: usize = 10 * 1024 * 1024;

/// A single wire frame: the length-prefixed unit carrying one
/// application message payload (GLOSSARY).
///
/// `Frame` carries no application semantics of its own — `frame_type`
/// and `payload` are opaque to this crate; interpreting them is the
/// job of whatever sits above the wire (the message envelope codec in
/// `tickloom-process`/`tickloom-net`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub stream_id: u32,
    pub frame_type: u8,
    pub payload: Bytes,
}

impl Frame {
    pub fn new(stream_id: u32, frame_type: u8, payload: Bytes) -> WireResult<Self> {
        if payload.len() > MAX_PAYLOAD {
            return Err(WireError::PayloadTooLarge {
                len: payload.len() as u32,
                max: MAX_PAYLOAD as u32,
            });
        }
        Ok(Self {
            stream_id,
            frame_type,
            payload,
        })
    }

    /// Total wire size of this frame, header included.
    pub fn encoded_len(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }

    /// Serializes `self` as 9 header bytes followed by `payload.len()`
    /// bytes, all big-endian, appending to `buf`.
    pub fn encode(&self, buf: &mut BytesMut) {
        buf.reserve(self.encoded_len());
        buf.put_u32(self.stream_id);
        buf.put_u8(self.frame_type);
        buf.put_u32(self.payload.len() as u32);
        buf.put_slice(&self.payload);
    }
}

/// Decoded frame header, before its payload has necessarily arrived.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FrameHeader {
    pub stream_id: u32,
    pub frame_type: u8,
    pub payload_len: u32,
}

impl FrameHeader {
    /// Parses exactly `HEADER_SIZE` bytes. `payload_len` is validated
    /// against `MAX_PAYLOAD` here so the reassembler can fail fast on
    /// the read that produced the bad header, without allocating a
    /// payload buffer first.
    pub(crate) fn parse(bytes: &[u8]) -> WireResult<Self> {
        debug_assert_eq!(bytes.len(), HEADER_SIZE);
        let mut cursor = bytes;
        let stream_id = cursor.get_u32();
        let frame_type = cursor.get_u8();
        let payload_len = cursor.get_u32();

        if payload_len as usize > MAX_PAYLOAD {
            return Err(WireError::PayloadTooLarge {
                len: payload_len,
                max: MAX_PAYLOAD as u32,
            });
        }

        Ok(Self {
            stream_id,
            frame_type,
            payload_len,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_then_parse_header_roundtrips() {
        let frame = Frame::new(7, 0x02, Bytes::from_static(b"hello")).unwrap();
        let mut buf = BytesMut::new();
        frame.encode(&mut buf);

        assert_eq!(buf.len(), HEADER_SIZE + 5);
        let header = FrameHeader::parse(&buf[..HEADER_SIZE]).unwrap();
        assert_eq!(header.stream_id, 7);
        assert_eq!(header.frame_type, 0x02);
        assert_eq!(header.payload_len, 5);
        assert_eq!(&buf[HEADER_SIZE..], b"hello");
    }

    #[test]
    fn rejects_oversized_payload_at_construction() {
        let payload = Bytes::from(vec![0u8; MAX_PAYLOAD + 1]);
        let err = Frame::new(1, 0, payload).unwrap_err();
        assert!(matches!(err, WireError::PayloadTooLarge { .. }));
    }

    #[test]
    fn header_parse_rejects_oversized_length() {
        let mut buf = BytesMut::new();
        buf.put_u32(1);
        buf.put_u8(0);
        buf.put_u32((MAX_PAYLOAD + 1) as u32);
        let err = FrameHeader::parse(&buf).unwrap_err();
        assert!(matches!(err, WireError::PayloadTooLarge { .. }));
    }

    use test_case::test_case;

    #[test_case(0 => true; "empty payload")]
    #[test_case(MAX_PAYLOAD => true; "exactly at the limit")]
    #[test_case(MAX_PAYLOAD + 1 => false; "one byte over the limit")]
    fn frame_new_accepts_up_to_max_payload(len: usize) -> bool {
        Frame::new(0, 0, Bytes::from(vec![0u8; len])).is_ok()
    }
}
