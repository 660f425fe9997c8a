use std::collections::HashMap;

use tickloom_types::{CorrelationId, Message, ProcessId, Tick};

use crate::error::{RuntimeError, RuntimeResult};

/// The callback a [`WaitingList`] entry invokes.
///
/// A plain one-shot request/response exchange implements this by
/// completing a [`crate::PendingFuture`] directly and reporting
/// `is_complete() == true` on the first response. A quorum broadcast
/// registers the *same* callback (wrapping a
/// [`crate::QuorumAggregator`]) against every correlation id it
/// produced, and reports `is_complete()` only once the aggregator has
/// reached a terminal outcome — until then the waiting list keeps the
/// entry alive so later responses/timeouts from other peers still
/// reach it.
pub trait WaitingCallback {
    fn on_response(&mut self, response: Message, from: ProcessId);
    fn on_error(&mut self, error: RuntimeError);
    fn is_complete(&self) -> bool;
}

struct Entry {
    callback: Box<dyn WaitingCallback>,
    created_at: Tick,
}

/// Per-process map of in-flight correlation ids to their
/// `(callback, expiry)` pairs (§3, §4.E, GLOSSARY).
///
/// Owned exclusively by the `Process` that created it (§5: "A
/// process's waiting list is private to that process").
pub struct WaitingList {
    timeout_ticks: u64,
    entries: HashMap<CorrelationId, Entry>,
}

impl WaitingList {
    pub fn new(timeout_ticks: u64) -> Self {
        Self {
            timeout_ticks,
            entries: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, correlation_id: &CorrelationId) -> bool {
        self.entries.contains_key(correlation_id)
    }

    /// Rejects a correlation id that is still live.
    pub fn add(
        &mut self,
        correlation_id: CorrelationId,
        callback: Box<dyn WaitingCallback>,
        created_at: Tick,
    ) -> RuntimeResult<()> {
        if self.entries.contains_key(&correlation_id) {
            return Err(RuntimeError::DuplicateCorrelationId(
                correlation_id.to_string(),
            ));
        }
        self.entries.insert(
            correlation_id,
            Entry {
                callback,
                created_at,
            },
        );
        Ok(())
    }

    /// Delivers `response` to the entry keyed by its correlation id, if
    /// one is live. Whether the entry is then removed is entirely up
    /// to the callback's `is_complete()` — the waiting list itself has
    /// no opinion on when a quorum is done fanning out.
    pub fn handle_response(&mut self, correlation_id: &CorrelationId, response: Message, from: ProcessId) {
        let Some(entry) = self.entries.get_mut(correlation_id) else {
            tracing::trace!(%correlation_id, "response for unknown or already-retired correlation id dropped");
            return;
        };
        entry.callback.on_response(response, from);
        if entry.callback.is_complete() {
            self.entries.remove(correlation_id);
        }
    }

    /// Scans for entries whose `created_at + timeout_ticks <
    /// current_tick` and fires `on_error(Timeout)` for each, removing
    /// them unconditionally — a timed-out entry is retired regardless
    /// of what `is_complete()` would have said.
    pub fn tick(&mut self, current_tick: Tick) {
        let expired: Vec<CorrelationId> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.created_at.0 + self.timeout_ticks < current_tick.0)
            .map(|(id, _)| id.clone())
            .collect();

        for id in expired {
            if let Some(mut entry) = self.entries.remove(&id) {
                entry.callback.on_error(RuntimeError::Timeout);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct OneShot {
        responded: Rc<RefCell<Option<Message>>>,
        errored: Rc<RefCell<Option<RuntimeError>>>,
    }

    impl WaitingCallback for OneShot {
        fn on_response(&mut self, response: Message, _from: ProcessId) {
            *self.responded.borrow_mut() = Some(response);
        }
        fn on_error(&mut self, error: RuntimeError) {
            *self.errored.borrow_mut() = Some(error);
        }
        fn is_complete(&self) -> bool {
            true
        }
    }

    fn sample_message(correlation_id: &str) -> Message {
        Message::new(
            ProcessId::from("a"),
            ProcessId::from("b"),
            tickloom_types::PeerType::Server,
            tickloom_types::MessageType::new("test"),
            bytes::Bytes::new(),
            CorrelationId::from(correlation_id),
        )
    }

    #[test]
    fn rejects_duplicate_correlation_id() {
        let mut list = WaitingList::new(5);
        let cb = Box::new(OneShot {
            responded: Rc::new(RefCell::new(None)),
            errored: Rc::new(RefCell::new(None)),
        });
        list.add(CorrelationId::from("c1"), cb, Tick(0)).unwrap();

        let cb2 = Box::new(OneShot {
            responded: Rc::new(RefCell::new(None)),
            errored: Rc::new(RefCell::new(None)),
        });
        assert!(matches!(
            list.add(CorrelationId::from("c1"), cb2, Tick(0)),
            Err(RuntimeError::DuplicateCorrelationId(_))
        ));
    }

    #[test]
    fn response_removes_entry_when_complete() {
        let mut list = WaitingList::new(5);
        let responded = Rc::new(RefCell::new(None));
        let cb = Box::new(OneShot {
            responded: Rc::clone(&responded),
            errored: Rc::new(RefCell::new(None)),
        });
        list.add(CorrelationId::from("c1"), cb, Tick(0)).unwrap();
        list.handle_response(
            &CorrelationId::from("c1"),
            sample_message("c1"),
            ProcessId::from("peer"),
        );
        assert!(responded.borrow().is_some());
        assert_eq!(list.len(), 0);
    }

    /// S5 — a waiting entry added at tick 0 with timeoutTicks=5 never
    /// gets a response; at tick 6 it times out and the list drains.
    #[test]
    fn s5_waiting_list_timeout() {
        let mut list = WaitingList::new(5);
        let errored = Rc::new(RefCell::new(None));
        let cb = Box::new(OneShot {
            responded: Rc::new(RefCell::new(None)),
            errored: Rc::clone(&errored),
        });
        list.add(CorrelationId::from("c1"), cb, Tick(0)).unwrap();

        list.tick(Tick(5));
        assert_eq!(list.len(), 1, "not yet due at tick 5");

        list.tick(Tick(6));
        assert_eq!(list.len(), 0);
        assert_eq!(*errored.borrow(), Some(RuntimeError::Timeout));
    }
}
