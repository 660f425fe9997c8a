use thiserror::Error;

pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// `StateError`/`Timeout`/`FutureFailed` from §7, scoped to this crate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    /// `complete`/`fail` called on a future that already has a terminal
    /// outcome.
    #[error("future already resolved")]
    AlreadyResolved,

    /// `get_result`/`get_exception` called while the future is not in
    /// the matching terminal state.
    #[error("future is not {0}")]
    WrongState(&'static str),

    /// A waiting-list entry expired before a response or explicit
    /// failure arrived.
    #[error("timeout")]
    Timeout,

    /// `WaitingList::add` called with a correlation id that is already
    /// live.
    #[error("duplicate correlation id: {0}")]
    DuplicateCorrelationId(String),

    /// An `andThen` callback failed; the downstream future fails with
    /// the error the callback produced rather than the upstream
    /// outcome.
    #[error("andThen callback failed: {0}")]
    CallbackFailed(String),
}
