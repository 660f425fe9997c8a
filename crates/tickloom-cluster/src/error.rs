use thiserror::Error;

pub type ClusterResult<T> = Result<T, ClusterError>;

/// Errors surfaced by cluster construction and the tick scheduler
/// itself (§7's "escalated as exceptions caught at the scheduler
/// boundary" kinds; transient per-request failures stay inside
/// `tickloom-runtime::RuntimeError` and never reach here).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClusterError {
    #[error("cluster must have at least one process")]
    EmptyProcessList,

    #[error("duplicate process id: {0}")]
    DuplicateProcessId(String),

    #[error("tick_until exceeded max_ticks ({0}) before predicate became true")]
    TickBudgetExceeded(u64),

    #[error("no node registered for process id: {0}")]
    UnknownProcess(String),
}
