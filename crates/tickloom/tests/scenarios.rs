//! End-to-end scenario tests spanning `Cluster`, `Process`, and the
//! simulated network together — the things no single sub-crate's unit
//! tests can exercise on their own.

use std::cell::RefCell;
use std::rc::Rc;

use bytes::Bytes;

use tickloom::{
    Cluster, ClusterConfig, Message, MessageHandler, MessageType, PeerType, PendingFuture,
    Process, ProcessBase, ProcessId, QuorumError, Tick,
};

/// A replica that answers every unclaimed `"replicate"` request with a
/// `"replicate-ack"` reply and can itself fan a quorum broadcast out to
/// its peers — the minimal shape a leader-driven replication protocol
/// built on this framework would take.
struct Replica {
    base: ProcessBase,
}

impl Replica {
    fn new(id: ProcessId, bus: Rc<RefCell<tickloom::MessageBus>>, peers: Vec<ProcessId>, timeout_ticks: u64) -> Self {
        Self {
            base: ProcessBase::new(id, PeerType::Server, peers, bus, timeout_ticks),
        }
    }

    fn id(&self) -> &ProcessId {
        self.base.id()
    }

    fn broadcast_replicate(&mut self, quorum: usize) -> PendingFuture<Vec<bool>, QuorumError> {
        self.base.broadcast_to_all_replicas(
            MessageType::new("replicate"),
            |_peer| Bytes::new(),
            quorum,
            |acked: &bool| *acked,
            |_message| Some(true),
        )
    }
}

impl MessageHandler for Replica {
    fn on_message_received(&mut self, message: Message) {
        if let Some(unclaimed) = self.base.intercept_response(message) {
            if unclaimed.message_type == MessageType::new("replicate") {
                self.base.send(
                    unclaimed.source,
                    MessageType::new("replicate-ack"),
                    Bytes::new(),
                    unclaimed.correlation_id,
                );
            }
        }
    }
}

impl Process for Replica {
    fn id(&self) -> &ProcessId {
        self.base.id()
    }

    fn tick(&mut self, now: Tick) {
        self.base.tick(now);
    }
}

fn five_replica_ids() -> Vec<ProcessId> {
    ["n1", "n2", "n3", "n4", "n5"].into_iter().map(ProcessId::from).collect()
}

fn build_cluster(seed: u64, timeout_ticks: u64) -> (Cluster, Vec<Rc<RefCell<Replica>>>) {
    let ids = five_replica_ids();
    let config = ClusterConfig::builder()
        .processes(ids.clone())
        .seed(seed)
        .default_delay(1)
        .timeout_ticks(timeout_ticks)
        .build()
        .unwrap();
    let mut cluster = Cluster::new(config);

    let replicas: Vec<Rc<RefCell<Replica>>> = ids
        .iter()
        .map(|id| {
            Rc::new(RefCell::new(Replica::new(
                id.clone(),
                cluster.bus(),
                ids.clone(),
                timeout_ticks,
            )))
        })
        .collect();

    for (id, replica) in ids.into_iter().zip(replicas.iter()) {
        cluster.add_server(id, replica.clone(), Box::new(tickloom::InMemoryStorage::new()));
    }

    (cluster, replicas)
}

/// S4 — a partition that leaves a coordinator able to reach only one of
/// its four peers makes a `quorum = 3` broadcast permanently impossible:
/// the future fails with `QuorumError::Impossible` rather than hanging.
#[test]
fn s4_quorum_becomes_impossible_under_a_partition() {
    let (mut cluster, replicas) = build_cluster(7, 3);
    let n1 = replicas[0].clone();
    let ids = five_replica_ids();

    // {n1, n2} can still talk to each other; neither can reach n3, n4, n5.
    cluster.partition_nodes(&ids[0..2], &ids[2..5]);

    let future = n1.borrow_mut().broadcast_replicate(3);

    cluster
        .tick_until(|_| !future.is_pending(), 20)
        .expect("broadcast must resolve one way or another within the tick budget");

    match future.get_exception().expect("broadcast cannot succeed with only one reachable peer") {
        QuorumError::Impossible { quorum, .. } => assert_eq!(quorum, 3),
    }
}

/// Same broadcast, no partition: all four peers answer and a `quorum =
/// 3` requirement is satisfied well inside the timeout.
#[test]
fn quorum_succeeds_once_enough_peers_are_reachable() {
    let (mut cluster, replicas) = build_cluster(7, 3);
    let n1 = replicas[0].clone();

    let future = n1.borrow_mut().broadcast_replicate(3);
    cluster
        .tick_until(|_| !future.is_pending(), 10)
        .expect("broadcast must resolve within the tick budget");

    let winners = future.get_result().expect("quorum of 3 out of 4 reachable peers should succeed");
    assert_eq!(winners.len(), 3);
}

/// S3 — two independently constructed clusters, built from the same
/// seed and driven through the same sequence of calls, produce
/// identical outcomes: same resolution tick, same quorum result. This
/// is the determinism property the whole simulated stack exists for.
#[test]
fn s3_same_seed_same_operations_yield_identical_outcomes() {
    fn run() -> (Tick, Result<usize, QuorumError>) {
        let (mut cluster, replicas) = build_cluster(99, 3);
        let n1 = replicas[0].clone();
        cluster.set_packet_loss(ProcessId::from("n1"), ProcessId::from("n3"), 0.5);

        let future = n1.borrow_mut().broadcast_replicate(3);
        cluster.tick_until(|_| !future.is_pending(), 10).unwrap();

        let outcome = future.get_result().map(|winners| winners.len()).map_err(|_| future.get_exception().unwrap());
        (cluster.current_tick(), outcome)
    }

    let first = run();
    let second = run();
    assert_eq!(first, second);
}
