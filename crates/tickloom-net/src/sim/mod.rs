mod link;

use std::collections::{BTreeMap, HashMap, HashSet};

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use tickloom_types::{Message, MessageType, ProcessId, Tick};

pub use link::{AutoPartitionConfig, AutoPartitionMode, PathCloggingConfig};
use link::{FaultRule, LinkState};

type LinkKey = (ProcessId, ProcessId);

/// Deterministic, fault-injectable in-memory transport between
/// `ProcessId`s in the same address space (§4.B). This is the
/// framework's primary testability driver.
///
/// `SimNetwork::tick` deliberately does *not* dispatch to the
/// `MessageBus` itself — it advances the clock, runs the fault
/// schedules, drains every message whose delivery tick has arrived,
/// and returns them in delivery order. Dispatch is one statement away
/// in `tickloom-cluster::Cluster::tick`, kept as a separate step so a
/// handler that reacts to a delivered message by sending a new one
/// (the common replica broadcast pattern) can call back into this same
/// network without re-entering a borrow already held by the in-flight
/// `tick` call — see `DESIGN.md` for the full rationale.
pub struct SimNetwork {
    current_tick: Tick,
    default_delay: u64,
    next_sequence: u64,
    rng: SmallRng,
    known: HashSet<ProcessId>,
    links: HashMap<LinkKey, LinkState>,
    partitioned: HashSet<LinkKey>,
    queue: BTreeMap<(Tick, u64), Message>,
    auto_partition: AutoPartitionConfig,
    auto_partition_stable_since: Tick,
    path_clogging: PathCloggingConfig,
}

impl SimNetwork {
    /// `seed` fixes every probabilistic decision this network will
    /// ever make: two `SimNetwork`s built with the same seed and driven
    /// through the same sequence of `send`/`tick` calls produce
    /// byte-identical delivery histories (§4.B Determinism, §8 item 1).
    pub fn new(seed: u64, default_delay: u64) -> Self {
        Self {
            current_tick: Tick::ZERO,
            default_delay: default_delay.max(1),
            next_sequence: 0,
            rng: SmallRng::seed_from_u64(seed),
            known: HashSet::new(),
            links: HashMap::new(),
            partitioned: HashSet::new(),
            queue: BTreeMap::new(),
            auto_partition: AutoPartitionConfig::default(),
            auto_partition_stable_since: Tick::ZERO,
            path_clogging: PathCloggingConfig::default(),
        }
    }

    pub fn current_tick(&self) -> Tick {
        self.current_tick
    }

    pub fn register_node(&mut self, process: ProcessId) {
        self.known.insert(process);
    }

    pub fn set_auto_partition(&mut self, config: AutoPartitionConfig) {
        self.auto_partition = config;
    }

    pub fn set_path_clogging(&mut self, config: PathCloggingConfig) {
        self.path_clogging = config;
    }

    fn link_mut(&mut self, key: &LinkKey) -> &mut LinkState {
        self.links.entry(key.clone()).or_default()
    }

    // ------------------------------------------------------------------
    // Fault API (§4.B)
    // ------------------------------------------------------------------

    pub fn partition_two_way(&mut self, a: ProcessId, b: ProcessId) {
        self.partitioned.insert((a.clone(), b.clone()));
        self.partitioned.insert((b, a));
    }

    pub fn partition_one_way(&mut self, source: ProcessId, destination: ProcessId) {
        self.partitioned.insert((source, destination));
    }

    pub fn heal_partition(&mut self, a: ProcessId, b: ProcessId) {
        self.partitioned.remove(&(a.clone(), b.clone()));
        self.partitioned.remove(&(b, a));
    }

    pub fn heal_all_partitions(&mut self) {
        self.partitioned.clear();
    }

    pub fn is_partitioned(&self, source: &ProcessId, destination: &ProcessId) -> bool {
        self.partitioned
            .contains(&(source.clone(), destination.clone()))
    }

    pub fn set_delay(&mut self, source: ProcessId, destination: ProcessId, delay: u64) {
        self.link_mut(&(source, destination)).delay = Some(delay);
    }

    pub fn set_packet_loss(&mut self, source: ProcessId, destination: ProcessId, probability: f64) {
        self.link_mut(&(source, destination)).loss_probability = probability;
    }

    pub fn drop_messages_of_type(
        &mut self,
        source: ProcessId,
        destination: ProcessId,
        message_type: MessageType,
    ) {
        self.link_mut(&(source, destination)).fault = FaultRule::DropType(message_type);
    }

    pub fn drop_nth_message_of_type(
        &mut self,
        source: ProcessId,
        destination: ProcessId,
        message_type: MessageType,
        n: u64,
    ) {
        self.link_mut(&(source, destination)).fault = FaultRule::DropNthOfType {
            message_type,
            n,
            seen: 0,
        };
    }

    // ------------------------------------------------------------------
    // Send / tick
    // ------------------------------------------------------------------

    /// Checks `message` against, in order: the partition set; the
    /// link's fault rule; an independent Bernoulli draw against the
    /// effective loss rate; the link's clog status. Survivors are
    /// enqueued with `deliveryTick = currentTick + effectiveDelay`
    /// (§4.B). A zero-tick effective delay is never produced — delay
    /// is clamped to a minimum of 1 so the "no same-tick delivery"
    /// invariant in §4.G holds even when a caller asks for
    /// `set_delay(..., 0)` (§9 Open Questions).
    pub fn send(&mut self, message: Message) {
        self.known.insert(message.source.clone());
        self.known.insert(message.destination.clone());

        let key: LinkKey = (message.source.clone(), message.destination.clone());

        if self.partitioned.contains(&key) {
            tracing::debug!(source = %message.source, destination = %message.destination, "dropped: partitioned link");
            return;
        }

        let link = self.link_mut(&key);
        if Self::fault_consumes(&mut link.fault, message.message_type) {
            tracing::debug!(source = %message.source, destination = %message.destination, message_type = %message.message_type, "dropped: fault rule");
            return;
        }

        let loss_probability = link.loss_probability;
        if loss_probability > 0.0 && self.rng.gen::<f64>() < loss_probability {
            tracing::debug!(source = %message.source, destination = %message.destination, "dropped: loss draw");
            return;
        }

        let link = self.link_mut(&key);
        let effective_delay = link.delay.unwrap_or(self.default_delay).max(1);
        let mut delivery_tick = self.current_tick + effective_delay;
        if let Some(clogged_until) = link.clogged_until {
            if clogged_until > delivery_tick {
                delivery_tick = clogged_until;
            }
        }

        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.queue.insert((delivery_tick, sequence), message);
    }

    fn fault_consumes(fault: &mut FaultRule, message_type: MessageType) -> bool {
        match fault {
            FaultRule::None => false,
            FaultRule::DropType(t) => *t == message_type,
            FaultRule::DropNthOfType {
                message_type: t,
                n,
                seen,
            } => {
                if *t != message_type {
                    return false;
                }
                *seen += 1;
                *seen == *n
            }
        }
    }

    /// Advances `currentTick` by one, runs the optional auto-partition
    /// and path-clogging schedules, then drains every queued message
    /// whose delivery tick has arrived, in `(deliveryTick,
    /// sequenceNumber)` order (§4.B).
    ///
    /// Returns the drained messages for the caller to dispatch to the
    /// `MessageBus` — see the module doc comment for why dispatch is
    /// not performed inline.
    pub fn tick(&mut self) -> Vec<Message> {
        self.current_tick = self.current_tick + 1;
        self.run_auto_partition();
        self.run_path_clogging();

        let due: Vec<(Tick, u64)> = self
            .queue
            .range(..=(self.current_tick, u64::MAX))
            .map(|(k, _)| *k)
            .collect();

        due.into_iter()
            .filter_map(|key| self.queue.remove(&key))
            .collect()
    }

    fn run_auto_partition(&mut self) {
        if self.auto_partition.mode == AutoPartitionMode::Off {
            return;
        }
        let elapsed = self
            .current_tick
            .0
            .saturating_sub(self.auto_partition_stable_since.0);
        if elapsed < self.auto_partition.min_stable_ticks {
            return;
        }

        if self.partitioned.is_empty() {
            if self.rng.gen::<f64>() < self.auto_partition.partition_prob {
                self.flip_new_partition();
                self.auto_partition_stable_since = self.current_tick;
            }
        } else if self.rng.gen::<f64>() < self.auto_partition.unpartition_prob {
            self.heal_all_partitions();
            self.auto_partition_stable_since = self.current_tick;
        }
    }

    fn flip_new_partition(&mut self) {
        let mut nodes: Vec<ProcessId> = self.known.iter().cloned().collect();
        if nodes.len() < 2 {
            return;
        }
        nodes.sort();
        let (group_a, group_b) = match self.auto_partition.mode {
            AutoPartitionMode::HalfHalf => {
                let mid = nodes.len() / 2;
                (nodes[..mid].to_vec(), nodes[mid..].to_vec())
            }
            AutoPartitionMode::Random => {
                let mut shuffled = nodes.clone();
                shuffle(&mut shuffled, &mut self.rng);
                let mid = 1 + (self.rng.gen::<usize>() % shuffled.len().saturating_sub(1).max(1));
                (shuffled[..mid].to_vec(), shuffled[mid..].to_vec())
            }
            AutoPartitionMode::Off => return,
        };

        for a in &group_a {
            for b in &group_b {
                if self.auto_partition.symmetric {
                    self.partition_two_way(a.clone(), b.clone());
                } else {
                    self.partition_one_way(a.clone(), b.clone());
                }
            }
        }
    }

    fn run_path_clogging(&mut self) {
        if self.path_clogging.prob <= 0.0 {
            return;
        }
        if self.rng.gen::<f64>() >= self.path_clogging.prob {
            return;
        }

        let mut pairs: Vec<LinkKey> = self
            .known
            .iter()
            .flat_map(|a| self.known.iter().map(move |b| (a.clone(), b.clone())))
            .filter(|(a, b)| a != b)
            .collect();
        if pairs.is_empty() {
            return;
        }
        pairs.sort();
        shuffle(&mut pairs, &mut self.rng);
        let take = 1 + (self.rng.gen::<usize>() % pairs.len());

        for key in pairs.into_iter().take(take) {
            let delay = exponential_sample(self.path_clogging.mean_ticks, &mut self.rng);
            let clog_until = self.current_tick + delay;
            self.link_mut(&key).clogged_until = Some(clog_until);
        }
    }
}

impl tickloom_runtime::NetworkSender for SimNetwork {
    fn send(&mut self, message: Message) {
        SimNetwork::send(self, message);
    }
}

fn shuffle<T>(items: &mut [T], rng: &mut SmallRng) {
    for i in (1..items.len()).rev() {
        let j = rng.gen::<usize>() % (i + 1);
        items.swap(i, j);
    }
}

fn exponential_sample(mean_ticks: f64, rng: &mut SmallRng) -> u64 {
    let u: f64 = rng.gen_range(f64::EPSILON..1.0);
    let sample = -mean_ticks * (1.0 - u).ln();
    sample.round().max(1.0) as u64
}
