//! # tickloom-wire: frame codec and stream reassembler
//!
//! A fixed, length-prefixed wire format ([`Frame`]) and an incremental
//! reassembler ([`FrameReader`]) that turns a best-effort byte stream
//! into a FIFO queue of complete frames — used both by the real
//! reactor transport (`tickloom-net`) and directly in tests.
//!
//! There is a single canonical frame representation; this crate does
//! not offer alternate or legacy variants.

mod error;
mod frame;
mod reassembler;

pub use error::{WireError, WireResult};
pub use frame::{Frame, HEADER_SIZE, MAX_PAYLOAD};
pub use reassembler::{FeedStatus, FrameReader};
