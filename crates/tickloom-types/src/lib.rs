//! # tickloom-types: core data model
//!
//! Shared vocabulary used across every TickLoom crate: process
//! identity ([`ProcessId`]), the message envelope ([`Message`],
//! [`PeerType`], [`MessageType`], [`CorrelationId`]), and logical time
//! ([`Tick`], [`LogicalClock`]).
//!
//! This crate has no knowledge of networks, schedulers, or futures —
//! it only defines the values those components pass around. Error
//! kinds that cross crate boundaries live one layer up, in each
//! sibling crate's own error type, unified by `tickloom::Error`.

mod clock;
mod message;
mod process_id;

pub use clock::{LogicalClock, Tick};
pub use message::{CorrelationId, Message, MessageType, PeerType};
pub use process_id::ProcessId;
