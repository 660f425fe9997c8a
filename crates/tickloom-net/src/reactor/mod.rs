mod connection;

use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use mio::net::{TcpListener, TcpStream};
use mio::{Events, Interest, Poll, Token};

use tickloom_types::{Message, ProcessId};
use tickloom_wire::Frame;

use crate::codec::{self, FRAME_TYPE_HANDSHAKE, FRAME_TYPE_MESSAGE};
use crate::error::{NetError, NetResult};
use connection::Connection;

const LISTENER_TOKEN: Token = Token(0);

/// Per-connection fairness cap: at most this many frames are decoded
/// off one socket per `poll` pass before the reactor moves on to the
/// next ready connection, so one chatty peer can't starve the rest
/// (§4.C).
const MAX_FRAMES_PER_READ: usize = 64;

/// The real non-blocking transport (§4.C): one `mio::Poll`, a listener,
/// and a set of `Connection`s keyed by `mio::Token`.
///
/// A connection's peer identity is not known until its first frame —
/// the handshake — arrives, so outbound connections are indexed by
/// `Token` immediately but only become reachable by `ProcessId` once
/// bound. Inbound connections are the mirror image: accepted and
/// registered before identity is known.
pub struct Reactor {
    self_id: ProcessId,
    poll: Poll,
    events: Events,
    listener: Option<TcpListener>,
    next_token: usize,
    connections: HashMap<Token, Connection>,
    addresses: HashMap<ProcessId, SocketAddr>,
    peer_tokens: HashMap<ProcessId, Token>,
}

impl Reactor {
    pub fn new(self_id: ProcessId) -> io::Result<Self> {
        Ok(Self {
            self_id,
            poll: Poll::new()?,
            events: Events::with_capacity(1024),
            listener: None,
            next_token: 1,
            connections: HashMap::new(),
            addresses: HashMap::new(),
            peer_tokens: HashMap::new(),
        })
    }

    pub fn bind(&mut self, addr: SocketAddr) -> io::Result<()> {
        let mut listener = TcpListener::bind(addr)?;
        self.poll
            .registry()
            .register(&mut listener, LISTENER_TOKEN, Interest::READABLE)?;
        self.listener = Some(listener);
        Ok(())
    }

    /// Tells the reactor which address to dial for `process` the first
    /// time a message needs to go there. Mirrors `ClusterTopology`'s
    /// external address book (§6) without depending on it directly.
    pub fn register_address(&mut self, process: ProcessId, addr: SocketAddr) {
        self.addresses.insert(process, addr);
    }

    fn alloc_token(&mut self) -> Token {
        let token = Token(self.next_token);
        self.next_token += 1;
        token
    }

    /// Looks up (or lazily opens) the outbound connection to
    /// `destination` and queues `message` on it. Actual bytes leave the
    /// socket on the next `poll` pass.
    pub fn send(&mut self, destination: &ProcessId, message: Message) -> NetResult<()> {
        let frame = codec::encode_message(&message)?;
        let token = match self.peer_tokens.get(destination).copied() {
            Some(token) => token,
            None => self.connect(destination)?,
        };
        if let Some(conn) = self.connections.get_mut(&token) {
            conn.queue_frame(&frame);
            reregister(&self.poll, token, conn)?;
        }
        Ok(())
    }

    fn connect(&mut self, destination: &ProcessId) -> NetResult<Token> {
        let addr = *self
            .addresses
            .get(destination)
            .ok_or_else(|| NetError::UnknownPeer(destination.as_str().to_string()))?;
        let stream = TcpStream::connect(addr)?;
        let token = self.alloc_token();
        let mut conn = Connection::new(token, stream);
        conn.queue_handshake(&self.self_id);
        conn.peer = Some(destination.clone());
        self.poll
            .registry()
            .register(&mut conn.stream, token, conn.interest())?;
        self.peer_tokens.insert(destination.clone(), token);
        self.connections.insert(token, conn);
        Ok(token)
    }

    /// Blocks for up to `timeout` waiting for I/O readiness, then
    /// services every ready socket: accepts new inbound connections,
    /// reads and decodes up to `MAX_FRAMES_PER_READ` frames per
    /// connection, binds peer identity from handshake frames, and
    /// flushes pending writes. Returns every [`Message`] decoded this
    /// pass, in the order its frame was read.
    ///
    /// Connections that hit EOF or an I/O error are torn down before
    /// this call returns (§4.C "cleanup-on-IOException") — there is no
    /// separate error channel the caller needs to poll.
    pub fn poll(&mut self, timeout: Option<Duration>) -> NetResult<Vec<Message>> {
        self.poll.poll(&mut self.events, timeout)?;

        let ready_tokens: Vec<Token> = self.events.iter().map(|event| event.token()).collect();
        let mut delivered = Vec::new();
        let mut dead = Vec::new();

        for token in ready_tokens {
            if token == LISTENER_TOKEN {
                self.accept_all();
                continue;
            }
            self.service_connection(token, &mut delivered, &mut dead);
        }

        for token in dead {
            self.teardown(token);
        }

        Ok(delivered)
    }

    fn service_connection(&mut self, token: Token, delivered: &mut Vec<Message>, dead: &mut Vec<Token>) {
        let Some(conn) = self.connections.get_mut(&token) else {
            return;
        };

        match conn.read_frames(MAX_FRAMES_PER_READ) {
            Ok((frames, open)) => {
                for frame in frames {
                    self.handle_frame(token, frame, delivered);
                }
                if !open {
                    dead.push(token);
                }
            }
            Err(e) => {
                tracing::debug!(?token, error = %e, "connection torn down on read");
                dead.push(token);
                return;
            }
        }

        let Some(conn) = self.connections.get_mut(&token) else {
            return;
        };
        match conn.flush() {
            Ok(_) => {
                let _ = reregister(&self.poll, token, conn);
            }
            Err(e) => {
                tracing::debug!(?token, error = %e, "connection torn down on write");
                dead.push(token);
            }
        }
    }

    fn handle_frame(&mut self, token: Token, frame: Frame, delivered: &mut Vec<Message>) {
        match frame.frame_type {
            FRAME_TYPE_HANDSHAKE => {
                if let Ok(peer) = codec::decode_handshake(&frame) {
                    self.peer_tokens.insert(peer.clone(), token);
                    if let Some(conn) = self.connections.get_mut(&token) {
                        conn.peer = Some(peer);
                    }
                }
            }
            FRAME_TYPE_MESSAGE => match codec::decode_message(&frame) {
                Ok(message) => delivered.push(message),
                Err(e) => tracing::debug!(error = %e, "dropped undecodable frame"),
            },
            other => tracing::debug!(frame_type = other, "dropped unknown frame type"),
        }
    }

    fn accept_all(&mut self) {
        loop {
            let accepted = match &self.listener {
                Some(listener) => listener.accept(),
                None => return,
            };
            match accepted {
                Ok((stream, addr)) => {
                    let token = self.alloc_token();
                    let mut conn = Connection::new(token, stream);
                    if let Err(e) = self
                        .poll
                        .registry()
                        .register(&mut conn.stream, token, conn.interest())
                    {
                        tracing::warn!(error = %e, "failed to register accepted connection");
                        continue;
                    }
                    tracing::debug!(%addr, ?token, "accepted connection");
                    self.connections.insert(token, conn);
                }
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) => {
                    tracing::warn!(error = %e, "accept failed");
                    break;
                }
            }
        }
    }

    fn teardown(&mut self, token: Token) {
        if let Some(mut conn) = self.connections.remove(&token) {
            let _ = self.poll.registry().deregister(&mut conn.stream);
            if let Some(peer) = conn.peer {
                self.peer_tokens.remove(&peer);
            }
        }
    }
}

fn reregister(poll: &Poll, token: Token, conn: &mut Connection) -> io::Result<()> {
    poll.registry().reregister(&mut conn.stream, token, conn.interest())
}

impl tickloom_runtime::NetworkSender for Reactor {
    fn send(&mut self, message: Message) {
        let destination = message.destination.clone();
        if let Err(e) = Reactor::send(self, &destination, message) {
            tracing::warn!(%destination, error = %e, "failed to send message");
        }
    }
}
