use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tickloom_types::{Message, ProcessId};

use crate::error::RuntimeError;
use crate::future::PendingFuture;
use crate::waiting_list::WaitingCallback;

/// Why a [`QuorumAggregator`] terminated without reaching quorum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuorumError {
    /// Fewer than `q` peers can possibly still satisfy the predicate —
    /// the remaining unanswered peers, even if every one of them
    /// satisfied it, would not reach `q`.
    Impossible { satisfying: usize, quorum: usize },
}

/// Fans out a broadcast to `expected_responders` peers and gates a
/// single outcome on `q` matching replies (§4.E).
///
/// The aggregator is registered against every correlation id produced
/// by `Process::broadcast_to_all_replicas` (one per peer); each
/// `on_response`/`on_error` call corresponds to exactly one peer's
/// answer (or its waiting-list timeout). It terminates the first time
/// either outcome becomes certain and is idempotent afterward —
/// responses arriving post-termination are silently ignored, matching
/// §4.E.
pub struct QuorumAggregator<R> {
    quorum: usize,
    expected_responders: usize,
    predicate: Box<dyn Fn(&R) -> bool>,
    received: HashMap<ProcessId, R>,
    satisfying_order: Vec<ProcessId>,
    failures: usize,
    future: PendingFuture<Vec<R>, QuorumError>,
    terminal: bool,
}

impl<R: Clone> QuorumAggregator<R> {
    /// `quorum` is `q`; `expected_responders` is the number of peers
    /// this aggregator will eventually hear from (one `on_response` or
    /// `on_error` per peer, no more).
    pub fn new(
        quorum: usize,
        expected_responders: usize,
        predicate: impl Fn(&R) -> bool + 'static,
    ) -> Self {
        Self {
            quorum,
            expected_responders,
            predicate: Box::new(predicate),
            received: HashMap::new(),
            satisfying_order: Vec::new(),
            failures: 0,
            future: PendingFuture::new(),
            terminal: false,
        }
    }

    /// The future that resolves with the first `q` satisfying
    /// responses (in arrival order) on success, or a [`QuorumError`]
    /// once success becomes impossible.
    pub fn future(&self) -> PendingFuture<Vec<R>, QuorumError> {
        self.future.clone()
    }

    fn satisfying_count(&self) -> usize {
        self.satisfying_order.len()
    }

    fn answered(&self) -> usize {
        self.received.len() + self.failures
    }

    fn recheck_impossibility(&mut self) {
        if self.terminal {
            return;
        }
        let remaining = self.expected_responders.saturating_sub(self.answered());
        let max_possible = self.satisfying_count() + remaining;
        if max_possible < self.quorum {
            self.terminal = true;
            let _ = self.future.fail(QuorumError::Impossible {
                satisfying: self.satisfying_count(),
                quorum: self.quorum,
            });
        }
    }

    /// Records a response from `from`. Ignored once terminal.
    pub fn on_response(&mut self, response: R, from: ProcessId) {
        if self.terminal || self.received.contains_key(&from) {
            return;
        }
        let satisfies = (self.predicate)(&response);
        self.received.insert(from.clone(), response);
        if satisfies {
            self.satisfying_order.push(from);
        }

        if self.satisfying_count() >= self.quorum {
            self.terminal = true;
            let winners = self.satisfying_order[..self.quorum]
                .iter()
                .map(|id| self.received[id].clone())
                .collect();
            let _ = self.future.complete(winners);
            return;
        }
        self.recheck_impossibility();
    }

    /// Records that `from`'s request ended in an explicit error
    /// (typically a waiting-list timeout). Ignored once terminal.
    pub fn on_error(&mut self, _from: ProcessId) {
        if self.terminal {
            return;
        }
        self.failures += 1;
        self.recheck_impossibility();
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal
    }
}

/// Adapts a shared [`QuorumAggregator`] to the [`WaitingCallback`]
/// interface so the *same* aggregator can be registered in a
/// [`crate::WaitingList`] under every correlation id a broadcast
/// produced (§4.F `broadcast_to_all_replicas`).
///
/// Decoding the raw [`Message`] payload into the aggregator's response
/// type `R` is outside the core's scope (§1, §6 "message payload
/// codec (external)"); callers supply that as `decode`.
pub struct QuorumCallback<R> {
    aggregator: Rc<RefCell<QuorumAggregator<R>>>,
    decode: Rc<dyn Fn(&Message) -> Option<R>>,
    /// The single peer this particular waiting-list entry was
    /// registered for — each correlation id in a broadcast corresponds
    /// to exactly one peer, so a timeout on this entry is unambiguously
    /// that peer's failure to answer.
    peer: ProcessId,
}

impl<R: Clone> QuorumCallback<R> {
    pub fn new(
        aggregator: Rc<RefCell<QuorumAggregator<R>>>,
        decode: Rc<dyn Fn(&Message) -> Option<R>>,
        peer: ProcessId,
    ) -> Self {
        Self {
            aggregator,
            decode,
            peer,
        }
    }
}

impl<R: Clone> WaitingCallback for QuorumCallback<R> {
    fn on_response(&mut self, response: Message, from: ProcessId) {
        match (self.decode)(&response) {
            Some(decoded) => self.aggregator.borrow_mut().on_response(decoded, from),
            None => self.aggregator.borrow_mut().on_error(from),
        }
    }

    fn on_error(&mut self, _error: RuntimeError) {
        self.aggregator.borrow_mut().on_error(self.peer.clone());
    }

    fn is_complete(&self) -> bool {
        self.aggregator.borrow().is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(name: &str) -> ProcessId {
        ProcessId::from(name)
    }

    #[test]
    fn succeeds_on_first_q_satisfying_responses_in_order() {
        let mut agg = QuorumAggregator::new(2, 3, |v: &bool| *v);
        agg.on_response(true, pid("a"));
        assert!(!agg.is_terminal());
        agg.on_response(true, pid("b"));
        assert!(agg.is_terminal());
        assert_eq!(agg.future().get_result().unwrap(), vec![true, true]);
    }

    #[test]
    fn fails_when_quorum_becomes_impossible() {
        // 5 peers, need 3 satisfying; two already failed to satisfy and
        // one explicit error leaves only 2 possible satisfiers left.
        let mut agg = QuorumAggregator::new(3, 5, |v: &bool| *v);
        agg.on_response(false, pid("a"));
        agg.on_response(false, pid("b"));
        agg.on_error(pid("c"));
        assert!(!agg.is_terminal());
        agg.on_error(pid("d"));
        assert!(agg.is_terminal());
        assert!(matches!(
            agg.future().get_exception().unwrap(),
            QuorumError::Impossible { .. }
        ));
    }

    #[test]
    fn idempotent_after_termination() {
        let mut agg = QuorumAggregator::new(1, 3, |v: &bool| *v);
        agg.on_response(true, pid("a"));
        assert!(agg.is_terminal());
        // further responses, even from a "new" peer, are ignored
        agg.on_response(true, pid("b"));
        assert_eq!(agg.future().get_result().unwrap(), vec![true]);
    }

    #[test]
    fn duplicate_responder_counted_once() {
        let mut agg = QuorumAggregator::new(2, 3, |v: &bool| *v);
        agg.on_response(true, pid("a"));
        agg.on_response(true, pid("a"));
        assert!(!agg.is_terminal());
        agg.on_response(true, pid("b"));
        assert!(agg.is_terminal());
    }

    use test_case::test_case;

    #[test_case(3, 5, 0, 0 => false; "no answers yet, still possible")]
    #[test_case(3, 5, 0, 2 => false; "two failures, three peers still outstanding")]
    #[test_case(3, 5, 0, 3 => true; "three failures leaves only two possible satisfiers")]
    #[test_case(3, 5, 1, 2 => false; "one satisfied, two failed, two outstanding still reach quorum")]
    #[test_case(3, 5, 1, 3 => true; "one satisfied, three failed, one outstanding can't reach three")]
    fn impossibility_boundary(quorum: usize, expected_responders: usize, satisfied: usize, failed: usize) -> bool {
        let mut agg = QuorumAggregator::new(quorum, expected_responders, |v: &bool| *v);
        for i in 0..satisfied {
            agg.on_response(true, pid(&format!("ok-{i}")));
        }
        for i in 0..failed {
            agg.on_error(pid(&format!("fail-{i}")));
        }
        agg.is_terminal() && agg.future().get_exception().is_ok()
    }
}
