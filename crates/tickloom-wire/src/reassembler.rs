use std::collections::VecDeque;

use bytes::{Bytes, BytesMut};

use crate::error::{WireError, WireResult};
use crate::frame::{Frame, FrameHeader, HEADER_SIZE};

/// Advisory status returned from [`FrameReader::feed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedStatus {
    /// Bytes were consumed but no frame completed.
    Progress,
    /// At least one frame completed and is waiting in [`FrameReader::poll`].
    FrameReady,
}

#[derive(Debug)]
enum State {
    ReadingHeader(BytesMut),
    ReadingPayload {
        stream_id: u32,
        frame_type: u8,
        payload_len: u32,
        buf: BytesMut,
    },
}

impl State {
    fn fresh_header() -> Self {
        State::ReadingHeader(BytesMut::with_capacity(HEADER_SIZE))
    }
}

/// Turns a best-effort, append-only byte stream into a FIFO queue of
/// complete [`Frame`]s (§4.A).
///
/// One `FrameReader` is bound to one direction of one connection. It
/// never blocks and never looks at a socket directly — callers read
/// bytes however they like (a real non-blocking socket through a fixed
/// scratch buffer, a test harness feeding arbitrary fragment splits)
/// and hand them to [`feed`](Self::feed).
///
/// Once a fatal [`WireError`] is raised it is latched: every
/// subsequent call to `feed` returns the same error, since there is no
/// way to resynchronize a length-prefixed stream after a corrupt
/// header or a truncated payload.
#[derive(Debug)]
pub struct FrameReader {
    state: State,
    ready: VecDeque<Frame>,
    fatal: Option<WireError>,
}

impl Default for FrameReader {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameReader {
    pub fn new() -> Self {
        Self {
            state: State::fresh_header(),
            ready: VecDeque::new(),
            fatal: None,
        }
    }

    /// Appends newly read bytes and advances the state machine as far
    /// as they allow, completing zero or more frames into the ready
    /// queue.
    ///
    /// A read of zero bytes with no frame completed is reported as
    /// `Progress` — it is never an error on its own; callers detect a
    /// closed connection via their own read result and call
    /// [`on_eof`](Self::on_eof).
    pub fn feed(&mut self, mut input: &[u8]) -> WireResult<FeedStatus> {
        if let Some(err) = &self.fatal {
            return Err(err.clone());
        }

        let mut produced = false;
        while !input.is_empty() {
            match &mut self.state {
                State::ReadingHeader(buf) => {
                    let need = HEADER_SIZE - buf.len();
                    let take = need.min(input.len());
                    buf.extend_from_slice(&input[..take]);
                    input = &input[take..];

                    if buf.len() == HEADER_SIZE {
                        let header = match FrameHeader::parse(buf) {
                            Ok(h) => h,
                            Err(e) => {
                                self.fatal = Some(e.clone());
                                return Err(e);
                            }
                        };
                        if header.payload_len == 0 {
                            self.ready.push_back(Frame {
                                stream_id: header.stream_id,
                                frame_type: header.frame_type,
                                payload: Bytes::new(),
                            });
                            produced = true;
                            self.state = State::fresh_header();
                        } else {
                            self.state = State::ReadingPayload {
                                stream_id: header.stream_id,
                                frame_type: header.frame_type,
                                payload_len: header.payload_len,
                                buf: BytesMut::with_capacity(header.payload_len as usize),
                            };
                        }
                    }
                }
                State::ReadingPayload {
                    stream_id,
                    frame_type,
                    payload_len,
                    buf,
                } => {
                    let need = *payload_len as usize - buf.len();
                    let take = need.min(input.len());
                    buf.extend_from_slice(&input[..take]);
                    input = &input[take..];

                    if buf.len() == *payload_len as usize {
                        self.ready.push_back(Frame {
                            stream_id: *stream_id,
                            frame_type: *frame_type,
                            payload: std::mem::take(buf).freeze(),
                        });
                        produced = true;
                        self.state = State::fresh_header();
                    }
                }
            }
        }

        Ok(if produced {
            FeedStatus::FrameReady
        } else {
            FeedStatus::Progress
        })
    }

    /// Returns the next completed frame, if any, in the order it was
    /// assembled.
    pub fn poll(&mut self) -> Option<Frame> {
        self.ready.pop_front()
    }

    /// Signals that the underlying stream has ended. Fatal if a frame
    /// was only partially assembled; a clean boundary (idle at the
    /// start of a fresh header) is not an error.
    pub fn on_eof(&mut self) -> WireResult<()> {
        if let Some(err) = &self.fatal {
            return Err(err.clone());
        }
        let (bytes_read, bytes_expected) = match &self.state {
            State::ReadingHeader(buf) if buf.is_empty() => return Ok(()),
            State::ReadingHeader(buf) => (buf.len(), HEADER_SIZE),
            State::ReadingPayload {
                payload_len, buf, ..
            } => (buf.len(), *payload_len as usize),
        };
        let err = WireError::TruncatedFrame {
            bytes_read,
            bytes_expected,
        };
        self.fatal = Some(err.clone());
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::MAX_PAYLOAD;
    use bytes::BufMut;

    fn encoded(stream_id: u32, frame_type: u8, payload: &[u8]) -> BytesMut {
        let frame = Frame::new(stream_id, frame_type, Bytes::copy_from_slice(payload)).unwrap();
        let mut buf = BytesMut::new();
        frame.encode(&mut buf);
        buf
    }

    /// S1 — encode three frames, feed one byte at a time, expect
    /// exactly those three frames in order and a fourth `poll` of
    /// `None`.
    #[test]
    fn s1_byte_at_a_time_reassembly() {
        let mut all = BytesMut::new();
        all.extend_from_slice(&encoded(1, 0x01, b"ab"));
        all.extend_from_slice(&encoded(2, 0x02, b"cde"));
        all.extend_from_slice(&encoded(3, 0x03, b""));
        assert_eq!(all.len(), 9 + 2 + 9 + 3 + 9);

        let mut reader = FrameReader::new();
        for byte in &all {
            reader.feed(&[*byte]).unwrap();
        }

        let f1 = reader.poll().unwrap();
        assert_eq!((f1.stream_id, f1.frame_type, &f1.payload[..]), (1, 0x01, &b"ab"[..]));
        let f2 = reader.poll().unwrap();
        assert_eq!((f2.stream_id, f2.frame_type, &f2.payload[..]), (2, 0x02, &b"cde"[..]));
        let f3 = reader.poll().unwrap();
        assert_eq!((f3.stream_id, f3.frame_type, &f3.payload[..]), (3, 0x03, &b""[..]));
        assert!(reader.poll().is_none());
    }

    /// S2 — a header declaring an oversize payload is a fatal error on
    /// the read that completes it.
    #[test]
    fn s2_oversize_frame_rejected() {
        let mut header = BytesMut::new();
        header.put_u32(1);
        header.put_u8(0);
        header.put_u32((MAX_PAYLOAD + 1) as u32);

        let mut reader = FrameReader::new();
        let err = reader.feed(&header).unwrap_err();
        assert!(matches!(err, WireError::PayloadTooLarge { .. }));
        // latched: subsequent feeds keep failing the same way
        assert!(reader.feed(b"anything").is_err());
    }

    #[test]
    fn large_payload_in_small_chunks() {
        let payload = vec![0xABu8; 5 * 1024 * 1024];
        let encoded_frame = encoded(9, 0x09, &payload);

        let mut reader = FrameReader::new();
        for chunk in encoded_frame.chunks(1024) {
            reader.feed(chunk).unwrap();
        }

        let frame = reader.poll().unwrap();
        assert_eq!(frame.payload.len(), payload.len());
        assert_eq!(&frame.payload[..], &payload[..]);
        assert!(reader.poll().is_none());
    }

    #[test]
    fn eof_mid_frame_is_fatal() {
        let mut reader = FrameReader::new();
        reader.feed(&[0, 0, 0, 1]).unwrap();
        let err = reader.on_eof().unwrap_err();
        assert!(matches!(err, WireError::TruncatedFrame { .. }));
    }

    #[test]
    fn eof_at_clean_boundary_is_not_fatal() {
        let mut reader = FrameReader::new();
        let frame_bytes = encoded(1, 0, b"ok");
        reader.feed(&frame_bytes).unwrap();
        reader.poll().unwrap();
        assert!(reader.on_eof().is_ok());
    }

    proptest::proptest! {
        /// Property 4 (§8): decoding any fragmentation of K concatenated
        /// frames yields exactly those K frames, in order.
        #[test]
        fn concatenation_roundtrip_any_split(
            payloads in proptest::collection::vec(proptest::collection::vec(proptest::arbitrary::any::<u8>(), 0..200), 1..8),
            split_points in proptest::collection::vec(1usize..64, 1..20),
        ) {
            let mut all = BytesMut::new();
            let mut expected = Vec::new();
            for (i, payload) in payloads.iter().enumerate() {
                let frame = Frame::new(i as u32, (i % 256) as u8, Bytes::copy_from_slice(payload)).unwrap();
                frame.encode(&mut all);
                expected.push(frame);
            }

            let mut reader = FrameReader::new();
            let mut offset = 0;
            let mut split_idx = 0;
            while offset < all.len() {
                let chunk_len = split_points[split_idx % split_points.len()].max(1);
                split_idx += 1;
                let end = (offset + chunk_len).min(all.len());
                reader.feed(&all[offset..end]).unwrap();
                offset = end;
            }

            let mut actual = Vec::new();
            while let Some(frame) = reader.poll() {
                actual.push(frame);
            }
            prop_assert_eq!(actual, expected);
        }
    }
}
