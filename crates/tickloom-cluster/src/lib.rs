//! # tickloom-cluster: the tick scheduler
//!
//! Ties every other crate together into the thing tests and
//! applications actually drive: a [`Cluster`] of [`Node`]s, ticked one
//! step at a time in the fixed order §4.G specifies, with the fault
//! injection API (`tickloom-net::SimNetwork`'s partitions, delay,
//! loss, fault rules) and per-process [`tickloom_types::LogicalClock`]
//! skew exposed directly on it.
//!
//! Construction goes through [`ClusterConfig`]/[`ClusterBuilder`] —
//! programmatic, validated, no file format — matching §6's "test
//! runners and applications configure the Cluster programmatically".

mod cluster;
mod config;
mod error;
mod node;
mod process;
mod storage;
mod topology;

pub use cluster::Cluster;
pub use config::{ClusterBuilder, ClusterConfig};
pub use error::{ClusterError, ClusterResult};
pub use node::{Node, NodeKind};
pub use process::Process;
pub use storage::{InMemoryStorage, Storage, StorageError, StorageResult};
pub use topology::{ClusterTopology, StaticTopology};
