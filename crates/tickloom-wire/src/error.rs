use thiserror::Error;

/// Result alias for the wire codec.
pub type WireResult<T> = Result<T, WireError>;

/// Fatal stream errors (§7 `ProtocolError`).
///
/// Both variants are fatal to the connection: there is no way to
/// resynchronize a length-prefixed stream once the declared length is
/// out of range, or once the stream ends mid-frame.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WireError {
    #[error("payload length {len} out of range (max {max})")]
    PayloadTooLarge { len: u32, max: u32 },

    #[error("stream ended with a frame partially assembled ({bytes_read} of {bytes_expected} bytes)")]
    TruncatedFrame { bytes_read: usize, bytes_expected: usize },
}
