use std::net::SocketAddr;

use tickloom_types::ProcessId;

/// The external address book a production `Cluster` consults to know
/// where to dial a peer (§6 "Cluster topology (external)"). Populated
/// from configuration outside the core; the core only ever reads it.
pub trait ClusterTopology {
    fn get_inet_address(&self, process: &ProcessId) -> Option<SocketAddr>;
}

/// An in-memory [`ClusterTopology`] for tests and simulation-mode
/// clusters that never open a real socket.
#[derive(Default)]
pub struct StaticTopology {
    addresses: std::collections::HashMap<ProcessId, SocketAddr>,
}

impl StaticTopology {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, process: ProcessId, addr: SocketAddr) {
        self.addresses.insert(process, addr);
    }
}

impl ClusterTopology for StaticTopology {
    fn get_inet_address(&self, process: &ProcessId) -> Option<SocketAddr> {
        self.addresses.get(process).copied()
    }
}
