use thiserror::Error;

pub type NetResult<T> = Result<T, NetError>;

/// §7 `TransportError`, plus the handful of setup-time misuses the
/// real reactor can report synchronously.
#[derive(Debug, Error)]
pub enum NetError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("wire protocol error: {0}")]
    Wire(#[from] tickloom_wire::WireError),

    #[error("no address registered for process {0}")]
    UnknownPeer(String),

    #[error("message codec error: {0}")]
    Codec(String),
}
