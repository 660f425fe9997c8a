use std::collections::HashSet;

use tickloom_types::ProcessId;

use crate::error::{ClusterError, ClusterResult};

/// Validated, programmatic cluster configuration (§6: "test runners
/// and applications configure the Cluster programmatically" — YAML/
/// file-based loading is explicitly out of scope). Built exclusively
/// through [`ClusterBuilder`] so a `Cluster` can never be constructed
/// from an unvalidated process list.
#[derive(Debug, Clone)]
pub struct ClusterConfig {
    pub(crate) process_ids: Vec<ProcessId>,
    pub(crate) seed: u64,
    pub(crate) default_delay: u64,
    pub(crate) timeout_ticks: u64,
}

impl ClusterConfig {
    pub fn builder() -> ClusterBuilder {
        ClusterBuilder::default()
    }

    pub fn process_ids(&self) -> &[ProcessId] {
        &self.process_ids
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn default_delay(&self) -> u64 {
        self.default_delay
    }

    pub fn timeout_ticks(&self) -> u64 {
        self.timeout_ticks
    }
}

/// Validate-then-build configuration builder, in the style of the
/// teacher's `ServerConfig`-family builders: every setter is
/// infallible and cheap, and the only place misconfiguration can
/// surface is [`ClusterBuilder::build`].
#[derive(Debug, Default)]
pub struct ClusterBuilder {
    process_ids: Vec<ProcessId>,
    seed: u64,
    default_delay: u64,
    timeout_ticks: u64,
}

impl ClusterBuilder {
    pub fn processes(mut self, process_ids: impl IntoIterator<Item = ProcessId>) -> Self {
        self.process_ids = process_ids.into_iter().collect();
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn default_delay(mut self, default_delay: u64) -> Self {
        self.default_delay = default_delay;
        self
    }

    pub fn timeout_ticks(mut self, timeout_ticks: u64) -> Self {
        self.timeout_ticks = timeout_ticks;
        self
    }

    pub fn build(self) -> ClusterResult<ClusterConfig> {
        if self.process_ids.is_empty() {
            return Err(ClusterError::EmptyProcessList);
        }
        let mut seen = HashSet::new();
        for id in &self.process_ids {
            if !seen.insert(id.clone()) {
                return Err(ClusterError::DuplicateProcessId(id.as_str().to_string()));
            }
        }
        Ok(ClusterConfig {
            process_ids: self.process_ids,
            seed: self.seed,
            default_delay: self.default_delay.max(1),
            timeout_ticks: self.timeout_ticks,
        })
    }
}
