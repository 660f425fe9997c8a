//! # TickLoom
//!
//! A framework for building tick-driven distributed systems and
//! testing them deterministically. TickLoom supplies the plumbing a
//! replicated system needs — a wire codec, a fault-injectable
//! simulated network alongside a real `mio` reactor, a single-threaded
//! async runtime, and the tick scheduler that ties them together — and
//! leaves the replication protocol itself to the application.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          Cluster                                │
//! │  ┌─────────┐   ┌─────────┐   ┌─────────┐   ┌───────────┐     │
//! │  │ Network │ → │   Bus   │ → │ Process │ → │  Storage  │     │
//! │  │(sim/real)│   │(routing)│   │(handler)│   │(external) │     │
//! │  └─────────┘   └─────────┘   └─────────┘   └───────────┘     │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every component runs on one thread and advances only when
//! `Cluster::tick` calls it — there is no executor and no locking
//! (§5). Swapping [`SimNetwork`] for [`Reactor`] is the only thing
//! that distinguishes a deterministic test run from a production
//! binary; nothing else in the stack knows which one it's talking to.
//!
//! # Quick start
//!
//! ```ignore
//! use tickloom::{Cluster, ClusterConfig, Client, ProcessId};
//! use bytes::Bytes;
//!
//! let config = ClusterConfig::builder()
//!     .processes([ProcessId::from("client-1"), ProcessId::from("replica-1")])
//!     .seed(42)
//!     .default_delay(1)
//!     .timeout_ticks(5)
//!     .build()?;
//! let mut cluster = Cluster::new(config);
//! # Ok::<(), tickloom::Error>(())
//! ```

mod error;

pub use error::{Error, Result};

// Wire codec (§4.A)
pub use tickloom_wire::{FeedStatus, Frame, FrameReader, WireError, HEADER_SIZE, MAX_PAYLOAD};

// Data model (§3)
pub use tickloom_types::{
    CorrelationId, LogicalClock, Message, MessageType, PeerType, ProcessId, Tick,
};

// Runtime triad (§4.D, §4.E)
pub use tickloom_runtime::{
    MessageBus, MessageHandler, NetworkSender, PendingFuture, QuorumAggregator, QuorumCallback,
    QuorumError, RuntimeError, WaitingCallback, WaitingList,
};

// Transports (§4.B, §4.C)
pub use tickloom_net::{
    AutoPartitionConfig, AutoPartitionMode, NetError, PathCloggingConfig, Reactor, SimNetwork,
};

// Process base and client (§4.F)
pub use tickloom_process::{Client, ProcessBase};

// Tick scheduler (§4.G) and external interfaces (§6)
pub use tickloom_cluster::{
    Cluster, ClusterBuilder, ClusterConfig, ClusterError, ClusterTopology, InMemoryStorage, Node,
    NodeKind, Process, StaticTopology, Storage, StorageError,
};
