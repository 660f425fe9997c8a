use std::io::{self, Read, Write};

use bytes::BytesMut;
use mio::net::TcpStream;
use mio::{Interest, Token};
use socket2::SockRef;

use tickloom_types::ProcessId;
use tickloom_wire::{Frame, FrameReader};

use crate::codec;
use crate::error::NetResult;

/// Applies the socket-level options every new connection — inbound or
/// outbound — must carry (§4.C "Connection lifecycle"): `TCP_NODELAY`
/// so small protocol messages aren't held back by Nagle's algorithm,
/// and `SO_KEEPALIVE` so a peer that vanishes without a clean close is
/// eventually detected instead of leaving a half-open socket forever.
/// Failures here are logged, not fatal — a connection that can't take
/// these options can still carry traffic correctly, just less
/// efficiently.
fn configure_socket(stream: &TcpStream) {
    if let Err(e) = stream.set_nodelay(true) {
        tracing::warn!(error = %e, "failed to set TCP_NODELAY on new connection");
    }
    if let Err(e) = SockRef::from(stream).set_keepalive(true) {
        tracing::warn!(error = %e, "failed to set SO_KEEPALIVE on new connection");
    }
}

/// One real TCP connection's read/write state, plus the peer identity
/// learned from its first frame.
///
/// Mirrors the shape of a typical mio connection: fixed-size scratch
/// read buffer, a `BytesMut` write queue drained as the socket allows,
/// and `interest()` reporting WRITABLE only while that queue is
/// nonempty so the reactor doesn't spin on a socket with nothing to
/// write.
pub(crate) struct Connection {
    pub token: Token,
    pub stream: TcpStream,
    reader: FrameReader,
    write_buf: BytesMut,
    pub peer: Option<ProcessId>,
    handshake_sent: bool,
}

impl Connection {
    pub fn new(token: Token, stream: TcpStream) -> Self {
        configure_socket(&stream);
        Self {
            token,
            stream,
            reader: FrameReader::new(),
            write_buf: BytesMut::new(),
            peer: None,
            handshake_sent: false,
        }
    }

    pub fn queue_handshake(&mut self, self_id: &ProcessId) {
        if self.handshake_sent {
            return;
        }
        codec::encode_handshake(self_id).encode(&mut self.write_buf);
        self.handshake_sent = true;
    }

    pub fn queue_frame(&mut self, frame: &Frame) {
        frame.encode(&mut self.write_buf);
    }

    /// Reads whatever is available without blocking and returns up to
    /// `max_frames` decoded frames plus whether the peer is still
    /// open. Capping frames per call (MAX_FRAMES_PER_READ at the
    /// reactor level) keeps one very chatty connection from starving
    /// every other socket the reactor services in a single poll pass.
    pub fn read_frames(&mut self, max_frames: usize) -> NetResult<(Vec<Frame>, bool)> {
        let mut temp = [0u8; 4096];
        let mut open = true;

        loop {
            match self.stream.read(&mut temp) {
                Ok(0) => {
                    open = false;
                    break;
                }
                Ok(n) => {
                    self.reader.feed(&temp[..n])?;
                }
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) => return Err(e.into()),
            }
        }

        if !open {
            self.reader.on_eof()?;
        }

        let mut frames = Vec::new();
        while frames.len() < max_frames {
            match self.reader.poll() {
                Some(frame) => frames.push(frame),
                None => break,
            }
        }
        Ok((frames, open))
    }

    /// Drains the write buffer into the socket. Returns `Ok(true)` once
    /// fully flushed, `Ok(false)` if the socket would still block.
    pub fn flush(&mut self) -> io::Result<bool> {
        while !self.write_buf.is_empty() {
            match self.stream.write(&self.write_buf) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::WriteZero,
                        "failed to write to socket",
                    ));
                }
                Ok(n) => {
                    let _ = self.write_buf.split_to(n);
                }
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(false),
                Err(e) => return Err(e),
            }
        }
        Ok(true)
    }

    pub fn interest(&self) -> Interest {
        if self.write_buf.is_empty() {
            Interest::READABLE
        } else {
            Interest::READABLE | Interest::WRITABLE
        }
    }

    pub fn has_pending_frames_queued(&self) -> bool {
        !self.write_buf.is_empty()
    }
}
