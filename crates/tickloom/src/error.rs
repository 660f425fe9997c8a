use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Unifies every per-crate error type behind one `#[from]`-convertible
/// enum, the way `kimberlite-server::ServerError` wraps
/// `WireError`/`KimberliteError` (§7). Callers who don't want to match
/// on the originating crate's error type can use `?` against this one
/// instead; components that care about a specific kind still work
/// directly with `tickloom_wire::WireError`, `tickloom_net::NetError`,
/// etc.
#[derive(Debug, Error)]
pub enum Error {
    #[error("wire protocol error: {0}")]
    Wire(#[from] tickloom_wire::WireError),

    #[error("network error: {0}")]
    Net(#[from] tickloom_net::NetError),

    #[error("runtime error: {0}")]
    Runtime(#[from] tickloom_runtime::RuntimeError),

    #[error("cluster error: {0}")]
    Cluster(#[from] tickloom_cluster::ClusterError),

    #[error("storage error: {0}")]
    Storage(#[from] tickloom_cluster::StorageError),
}
