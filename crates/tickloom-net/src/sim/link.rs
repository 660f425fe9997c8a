use tickloom_types::{MessageType, Tick};

/// A scheduled fault rule for one link (§3 `NetworkLink`).
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum FaultRule {
    None,
    /// Drop every message of this type.
    DropType(MessageType),
    /// Drop only the `n`th message of this type seen on the link
    /// (1-indexed); `seen` tracks how many of that type have been
    /// observed so far.
    DropNthOfType { message_type: MessageType, n: u64, seen: u64 },
}

/// Per-link mutable state: delay override, loss probability, the
/// active fault rule, and clog expiry (§3 `NetworkLink`).
#[derive(Debug, Clone)]
pub(crate) struct LinkState {
    pub delay: Option<u64>,
    pub loss_probability: f64,
    pub fault: FaultRule,
    pub clogged_until: Option<Tick>,
}

impl Default for LinkState {
    fn default() -> Self {
        Self {
            delay: None,
            loss_probability: 0.0,
            fault: FaultRule::None,
            clogged_until: None,
        }
    }
}

/// Auto-partitioning mode (§4.B "Auto-partitioning (optional)").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoPartitionMode {
    Off,
    HalfHalf,
    Random,
}

/// Configuration for probabilistic auto-partitioning.
#[derive(Debug, Clone)]
pub struct AutoPartitionConfig {
    pub mode: AutoPartitionMode,
    pub partition_prob: f64,
    pub unpartition_prob: f64,
    /// If true, a flip applies a two-way cut; otherwise one-way.
    pub symmetric: bool,
    /// Minimum ticks between flips.
    pub min_stable_ticks: u64,
}

impl Default for AutoPartitionConfig {
    fn default() -> Self {
        Self {
            mode: AutoPartitionMode::Off,
            partition_prob: 0.0,
            unpartition_prob: 0.0,
            symmetric: true,
            min_stable_ticks: 0,
        }
    }
}

/// Configuration for probabilistic path clogging (§4.B "Path clogging").
#[derive(Debug, Clone)]
pub struct PathCloggingConfig {
    pub prob: f64,
    pub mean_ticks: f64,
}

impl Default for PathCloggingConfig {
    fn default() -> Self {
        Self {
            prob: 0.0,
            mean_ticks: 1.0,
        }
    }
}
