use std::cell::RefCell;
use std::rc::Rc;

use bytes::Bytes;

use tickloom_net::SimNetwork;
use tickloom_runtime::MessageBus;
use tickloom_types::{MessageType, ProcessId, Tick};

use crate::config::ClusterConfig;
use crate::error::{ClusterError, ClusterResult};
use crate::node::{Node, NodeKind};
use crate::process::Process;
use crate::storage::Storage;

/// The deterministic heartbeat (§4.G): owns the shared simulated
/// network and message bus, an ordered list of Client Nodes and an
/// ordered list of Server Nodes, and drives every component one tick
/// at a time in the fixed order §4.G specifies.
///
/// `tick()` follows the same two-phase shape `SimNetwork::tick`
/// documents: the network is ticked and drained in one statement, its
/// borrow released, and only then is each delivered message hand off
/// to the bus — so a handler that reacts to delivery by sending can
/// call back into the same network without a `BorrowMutError`.
pub struct Cluster {
    network: Rc<RefCell<SimNetwork>>,
    bus: Rc<RefCell<MessageBus>>,
    client_nodes: Vec<Node>,
    server_nodes: Vec<Node>,
    timeout_ticks: u64,
    current_tick: Tick,
}

impl Cluster {
    pub fn new(config: ClusterConfig) -> Self {
        let network = Rc::new(RefCell::new(SimNetwork::new(config.seed(), config.default_delay())));
        for id in config.process_ids() {
            network.borrow_mut().register_node(id.clone());
        }

        let mut bus = MessageBus::new();
        bus.set_network(network.clone());

        Self {
            network,
            bus: Rc::new(RefCell::new(bus)),
            client_nodes: Vec::new(),
            server_nodes: Vec::new(),
            timeout_ticks: config.timeout_ticks(),
            current_tick: Tick::ZERO,
        }
    }

    /// The bus every `Process` constructed for this cluster must be
    /// wired to (e.g. `Client::new(id, cluster.bus(), ...)`).
    pub fn bus(&self) -> Rc<RefCell<MessageBus>> {
        self.bus.clone()
    }

    pub fn timeout_ticks(&self) -> u64 {
        self.timeout_ticks
    }

    pub fn current_tick(&self) -> Tick {
        self.current_tick
    }

    /// Registers `process` as a Client Node. `process` must already be
    /// wired to `self.bus()`. Takes a shared handle, not ownership, so
    /// the caller keeps its own typed reference for calling
    /// process-specific methods (`Client::send_request` and friends)
    /// while the cluster still drives its `tick()`.
    pub fn add_client<T: Process + 'static>(&mut self, id: ProcessId, process: Rc<RefCell<T>>) {
        let handler: Rc<RefCell<dyn tickloom_runtime::MessageHandler>> = process.clone();
        let process_dyn: Rc<RefCell<dyn Process>> = process;
        self.bus.borrow_mut().register_handler(id.clone(), handler);
        self.client_nodes.push(Node::new(id, NodeKind::Client, process_dyn, None));
    }

    /// Registers `process` as a Server Node with its own storage.
    /// `process` must already be wired to `self.bus()`. Takes a shared
    /// handle for the same reason as [`Cluster::add_client`].
    pub fn add_server<T: Process + 'static>(
        &mut self,
        id: ProcessId,
        process: Rc<RefCell<T>>,
        storage: Box<dyn Storage>,
    ) {
        let handler: Rc<RefCell<dyn tickloom_runtime::MessageHandler>> = process.clone();
        let process_dyn: Rc<RefCell<dyn Process>> = process;
        self.bus.borrow_mut().register_handler(id.clone(), handler);
        self.server_nodes
            .push(Node::new(id, NodeKind::Server, process_dyn, Some(storage)));
    }

    fn node_mut(&mut self, id: &ProcessId) -> Option<&mut Node> {
        self.client_nodes
            .iter_mut()
            .chain(self.server_nodes.iter_mut())
            .find(|node| node.id() == id)
    }

    fn all_process_ids(&self) -> Vec<ProcessId> {
        self.client_nodes
            .iter()
            .chain(self.server_nodes.iter())
            .map(|node| node.id().clone())
            .collect()
    }

    /// One scheduler step (§4.G tick() algorithm):
    /// 1. advance every known process's logical clock by 1;
    /// 2. tick the shared network and drain due messages;
    /// 3. dispatch each through the bus;
    /// 4. tick the bus itself (no-op, kept for component uniformity);
    /// 5. tick Client Nodes in insertion order, then Server Nodes in
    ///    insertion order (process, then storage, per node).
    pub fn tick(&mut self) {
        for node in self.client_nodes.iter_mut().chain(self.server_nodes.iter_mut()) {
            node.advance_clock();
        }

        let delivered = self.network.borrow_mut().tick();
        for message in delivered {
            self.bus.borrow().on_message(message);
        }

        self.bus.borrow_mut().tick();

        for node in &mut self.client_nodes {
            node.tick_process_and_storage();
        }
        for node in &mut self.server_nodes {
            node.tick_process_and_storage();
        }

        self.current_tick = self.current_tick + 1;
    }

    /// Calls `tick()` until `predicate(self)` is true, or fails once
    /// `max_ticks` calls have run without it becoming true (§4.G
    /// `tickUntil`).
    pub fn tick_until(&mut self, predicate: impl Fn(&Cluster) -> bool, max_ticks: u64) -> ClusterResult<()> {
        for _ in 0..max_ticks {
            if predicate(self) {
                return Ok(());
            }
            self.tick();
        }
        if predicate(self) {
            return Ok(());
        }
        Err(ClusterError::TickBudgetExceeded(max_ticks))
    }

    // ------------------------------------------------------------------
    // Fault injection (§4.G), delegated to the shared `SimNetwork`.
    // ------------------------------------------------------------------

    /// Partitions every process in `group_a` from every process in
    /// `group_b`, both directions (S4's `{A,B} vs {C,D,E}` split).
    pub fn partition_nodes(&mut self, group_a: &[ProcessId], group_b: &[ProcessId]) {
        tracing::debug!(?group_a, ?group_b, "partitioning node groups");
        let mut network = self.network.borrow_mut();
        for a in group_a {
            for b in group_b {
                network.partition_two_way(a.clone(), b.clone());
            }
        }
    }

    pub fn heal_all_partitions(&mut self) {
        tracing::debug!("healing all partitions");
        self.network.borrow_mut().heal_all_partitions();
    }

    pub fn set_delay(&mut self, source: ProcessId, destination: ProcessId, delay: u64) {
        self.network.borrow_mut().set_delay(source, destination, delay);
    }

    pub fn set_packet_loss(&mut self, source: ProcessId, destination: ProcessId, probability: f64) {
        self.network.borrow_mut().set_packet_loss(source, destination, probability);
    }

    pub fn drop_messages_of_type(&mut self, source: ProcessId, destination: ProcessId, message_type: MessageType) {
        self.network.borrow_mut().drop_messages_of_type(source, destination, message_type);
    }

    pub fn drop_nth_message_of_type(
        &mut self,
        source: ProcessId,
        destination: ProcessId,
        message_type: MessageType,
        n: u64,
    ) {
        self.network
            .borrow_mut()
            .drop_nth_message_of_type(source, destination, message_type, n);
    }

    /// Overwrites `process`'s logical clock outright (test-induced
    /// skew).
    pub fn set_time_for_process(&mut self, process: &ProcessId, tick: Tick) -> ClusterResult<()> {
        let node = self
            .node_mut(process)
            .ok_or_else(|| ClusterError::UnknownProcess(process.as_str().to_string()))?;
        node.clock_mut().set(tick);
        Ok(())
    }

    /// Advances `process`'s logical clock by `delta` beyond whatever
    /// `tick()` would otherwise apply (test-induced skew).
    pub fn advance_time_for_process(&mut self, process: &ProcessId, delta: u64) -> ClusterResult<()> {
        let node = self
            .node_mut(process)
            .ok_or_else(|| ClusterError::UnknownProcess(process.as_str().to_string()))?;
        node.clock_mut().advance_by(delta);
        Ok(())
    }

    /// Partitions `process` from every other known process, both
    /// directions.
    pub fn isolate_process(&mut self, process: &ProcessId) {
        tracing::debug!(%process, "isolating process from the rest of the cluster");
        let others: Vec<ProcessId> = self
            .all_process_ids()
            .into_iter()
            .filter(|id| id != process)
            .collect();
        let mut network = self.network.borrow_mut();
        for other in others {
            network.partition_two_way(process.clone(), other);
        }
    }

    /// Heals every partition between `process` and every other known
    /// process.
    pub fn reconnect_process(&mut self, process: &ProcessId) {
        tracing::debug!(%process, "reconnecting process to the rest of the cluster");
        let others: Vec<ProcessId> = self
            .all_process_ids()
            .into_iter()
            .filter(|id| id != process)
            .collect();
        let mut network = self.network.borrow_mut();
        for other in others {
            network.heal_partition(process.clone(), other);
        }
    }

    /// Synchronous test-introspection peek at `process`'s committed
    /// storage for `key`, bypassing the future machinery (§4.G
    /// `getStorageValue`).
    pub fn get_storage_value(&mut self, process: &ProcessId, key: &Bytes) -> Option<Bytes> {
        self.node_mut(process)
            .and_then(|node| node.storage())
            .and_then(|storage| storage.debug_get(key))
    }
}
