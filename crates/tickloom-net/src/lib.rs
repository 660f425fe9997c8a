//! # tickloom-net: simulated and real transports
//!
//! Two implementations of the same job — moving [`Message`]s between
//! `ProcessId`s — chosen at cluster construction time and never mixed
//! within one run:
//!
//! - [`sim::SimNetwork`]: the deterministic, fault-injectable in-memory
//!   transport every test drives (§4.B).
//! - [`reactor::Reactor`]: the real `mio`-based non-blocking TCP
//!   transport a production binary drives (§4.C).
//!
//! Both sit on the shared frame codec in `tickloom-wire` and both
//! implement `tickloom_runtime::NetworkSender` so a `MessageBus` can be
//! wired to either without caring which.

mod codec;
mod error;
mod reactor;
mod sim;

pub use error::{NetError, NetResult};
pub use reactor::Reactor;
pub use sim::{AutoPartitionConfig, AutoPartitionMode, PathCloggingConfig, SimNetwork};
