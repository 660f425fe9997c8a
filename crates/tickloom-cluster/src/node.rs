use std::cell::RefCell;
use std::rc::Rc;

use tickloom_types::{LogicalClock, ProcessId, Tick};

use crate::process::Process;
use crate::storage::Storage;

/// Whether a [`Node`] ticks in the client group or the server group of
/// a [`crate::Cluster`]'s traversal (§4.G: "For each Client Node in
/// insertion order ... For each Server Node in insertion order").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Client,
    Server,
}

/// One participant in the cluster: a `ProcessId`, its own
/// externally-settable `LogicalClock`, a handle to its `Process`, and
/// — for server nodes — its `Storage` (§4.G: "Each holds (ProcessId,
/// Network, MessageBus, Process|Client, Storage|none)"; `Network` and
/// `MessageBus` are shared cluster-wide in simulated mode and held by
/// `Cluster` itself rather than per node).
pub struct Node {
    id: ProcessId,
    kind: NodeKind,
    clock: LogicalClock,
    process: Rc<RefCell<dyn Process>>,
    storage: Option<Box<dyn Storage>>,
}

impl Node {
    pub(crate) fn new(
        id: ProcessId,
        kind: NodeKind,
        process: Rc<RefCell<dyn Process>>,
        storage: Option<Box<dyn Storage>>,
    ) -> Self {
        Self {
            id,
            kind,
            clock: LogicalClock::new(),
            process,
            storage,
        }
    }

    pub fn id(&self) -> &ProcessId {
        &self.id
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn clock(&self) -> &LogicalClock {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut LogicalClock {
        &mut self.clock
    }

    pub fn storage(&self) -> Option<&dyn Storage> {
        self.storage.as_deref()
    }

    pub fn storage_mut(&mut self) -> Option<&mut dyn Storage> {
        self.storage.as_deref_mut()
    }

    /// Advances this node's logical clock by one tick. `Cluster::tick`
    /// does this for every known process first, before any component
    /// is ticked (§4.G: "For each known process, advance its logical
    /// clock by 1").
    pub(crate) fn advance_clock(&mut self) {
        self.clock.advance();
    }

    /// Ticks this node's process, then (if present) its storage — the
    /// Process/Storage half of §4.G's per-component order; the shared
    /// network/bus half already ran by the time `Cluster::tick` reaches
    /// this call.
    pub(crate) fn tick_process_and_storage(&mut self) {
        let now: Tick = self.clock.now();
        self.process.borrow_mut().tick(now);
        if let Some(storage) = &mut self.storage {
            storage.tick();
        }
    }
}
