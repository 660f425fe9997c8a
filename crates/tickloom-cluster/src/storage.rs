use std::collections::BTreeMap;

use bytes::Bytes;
use thiserror::Error;

use tickloom_runtime::PendingFuture;

/// Failures a [`Storage`] implementation can resolve a future with
/// (§7 `StateError`-adjacent, scoped to the storage boundary).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("storage closed")]
    Closed,
}

pub type StorageResult<T> = Result<T, StorageError>;

/// The external, tick-driven key-value interface every node's storage
/// backs onto (§6 "Storage (external)"). The core never inspects
/// persisted layout; it only calls these operations and waits on the
/// returned futures.
///
/// Implementations decide their own notion of "pending" — a real
/// backend might only resolve a `put` future a few `tick()`s after it
/// was issued to model fsync latency. [`InMemoryStorage`] resolves
/// everything on the same tick it was called, which is enough for
/// deterministic-simulation testing without modeling disk latency
/// itself (the simulated network is where the framework's fault
/// injection lives, per §4.B).
pub trait Storage {
    fn put(&mut self, key: Bytes, value: Bytes) -> PendingFuture<bool, StorageError>;
    fn get(&mut self, key: Bytes) -> PendingFuture<Option<Bytes>, StorageError>;
    fn read_range(&mut self, lo: Bytes, hi: Bytes) -> PendingFuture<BTreeMap<Bytes, Bytes>, StorageError>;
    fn lower_key(&mut self, upper_bound_exclusive: Bytes) -> PendingFuture<Option<Bytes>, StorageError>;
    fn sync(&mut self) -> PendingFuture<(), StorageError>;

    /// No inherent work for [`InMemoryStorage`]; present so
    /// `Cluster::tick` can treat every node component uniformly
    /// (§4.D/§4.G), the same role `MessageBus::tick` plays.
    fn tick(&mut self);

    fn close(&mut self);

    /// Test-introspection escape hatch behind `Cluster::get_storage_value`
    /// (§4.G): a synchronous peek at committed state, bypassing the
    /// future machinery, for assertions in scenario tests (S4).
    fn debug_get(&self, key: &Bytes) -> Option<Bytes>;
}

/// The simulation-mode [`Storage`] backend: an ordered in-memory map
/// with no latency or failure injection of its own.
#[derive(Default)]
pub struct InMemoryStorage {
    data: BTreeMap<Bytes, Bytes>,
    closed: bool,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for InMemoryStorage {
    fn put(&mut self, key: Bytes, value: Bytes) -> PendingFuture<bool, StorageError> {
        let future = PendingFuture::new();
        if self.closed {
            let _ = future.fail(StorageError::Closed);
            return future;
        }
        self.data.insert(key, value);
        let _ = future.complete(true);
        future
    }

    fn get(&mut self, key: Bytes) -> PendingFuture<Option<Bytes>, StorageError> {
        let future = PendingFuture::new();
        if self.closed {
            let _ = future.fail(StorageError::Closed);
            return future;
        }
        let _ = future.complete(self.data.get(&key).cloned());
        future
    }

    fn read_range(&mut self, lo: Bytes, hi: Bytes) -> PendingFuture<BTreeMap<Bytes, Bytes>, StorageError> {
        let future = PendingFuture::new();
        if self.closed {
            let _ = future.fail(StorageError::Closed);
            return future;
        }
        let range = self
            .data
            .range(lo..hi)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let _ = future.complete(range);
        future
    }

    fn lower_key(&mut self, upper_bound_exclusive: Bytes) -> PendingFuture<Option<Bytes>, StorageError> {
        let future = PendingFuture::new();
        if self.closed {
            let _ = future.fail(StorageError::Closed);
            return future;
        }
        let lower = self
            .data
            .range(..upper_bound_exclusive)
            .next_back()
            .map(|(k, _)| k.clone());
        let _ = future.complete(lower);
        future
    }

    fn sync(&mut self) -> PendingFuture<(), StorageError> {
        let future = PendingFuture::new();
        if self.closed {
            let _ = future.fail(StorageError::Closed);
        } else {
            let _ = future.complete(());
        }
        future
    }

    fn tick(&mut self) {}

    fn close(&mut self) {
        self.closed = true;
    }

    fn debug_get(&self, key: &Bytes) -> Option<Bytes> {
        self.data.get(key).cloned()
    }
}
