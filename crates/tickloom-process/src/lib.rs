//! # tickloom-process: the process base and client
//!
//! Composable state every `Process` needs (§4.F): a handler-dispatch
//! entry point, correlation-id minting, and the quorum-broadcast
//! helper built on `tickloom-runtime`'s `WaitingList`/`QuorumAggregator`.
//!
//! Concrete replicas compose [`ProcessBase`] as a field and implement
//! `tickloom_runtime::MessageHandler` themselves, routing every
//! delivered message through [`ProcessBase::intercept_response`] first
//! so replies to this process's own outstanding requests never reach
//! its protocol-specific handler. [`Client`] is the ready-made
//! one-shot request/response process most tests and simple
//! applications need without writing that glue.

mod base;
mod client;

pub use base::ProcessBase;
pub use client::Client;
