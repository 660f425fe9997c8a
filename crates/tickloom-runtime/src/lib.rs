//! # tickloom-runtime: the async runtime triad
//!
//! Three collaborating pieces that together let a single-threaded,
//! tick-driven process issue internal requests and gate a client
//! response on a quorum of replies (§4.D, §4.E):
//!
//! - [`PendingFuture`]: the single-threaded promise primitive.
//! - [`WaitingList`]: the correlation-id-keyed table of in-flight
//!   requests with per-entry expiry.
//! - [`QuorumAggregator`]: the fan-out/gate combinator replicas use to
//!   turn N peer responses into one outcome.
//! - [`MessageBus`]: routes delivered messages to per-process handlers.
//!
//! Nothing here knows about sockets, ticks, or schedulers — those live
//! in `tickloom-net` and `tickloom-cluster`. This crate is pure,
//! synchronous, single-threaded state machinery.

mod bus;
mod error;
mod future;
mod quorum;
mod waiting_list;

pub use bus::{MessageBus, MessageHandler, NetworkSender};
pub use error::{RuntimeError, RuntimeResult};
pub use future::PendingFuture;
pub use quorum::{QuorumAggregator, QuorumCallback, QuorumError};
pub use waiting_list::{WaitingCallback, WaitingList};
