use std::cell::RefCell;
use std::rc::Rc;

use crate::error::{RuntimeError, RuntimeResult};

type Handler<T, E> = Box<dyn FnMut(Option<T>, Option<E>)>;

enum Outcome<T, E> {
    Pending,
    Completed(T),
    Failed(E),
}

struct Inner<T, E> {
    outcome: Outcome<T, E>,
    handlers: Vec<Handler<T, E>>,
}

/// A single-threaded promise (§4.E).
///
/// `PendingFuture` is the framework's only async primitive: there is
/// no executor, no `Waker`, no `Send` bound. It is a tri-state value
/// (`PENDING` / `COMPLETED(T)` / `FAILED(E)`) with at most one terminal
/// transition ever, and an ordered list of handlers that fire
/// synchronously, in registration order, on whatever call stack drives
/// `complete`/`fail` — which in practice is always inside some
/// component's `tick()`.
///
/// Cloning a `PendingFuture` clones the handle (`Rc` refcount bump),
/// not the state: all clones observe the same terminal transition.
pub struct PendingFuture<T, E> {
    inner: Rc<RefCell<Inner<T, E>>>,
}

impl<T, E> Clone for PendingFuture<T, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T, E> Default for PendingFuture<T, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone, E: Clone> PendingFuture<T, E> {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                outcome: Outcome::Pending,
                handlers: Vec::new(),
            })),
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.inner.borrow().outcome, Outcome::Pending)
    }

    /// Registers a handler. If the future is already terminal the
    /// handler fires synchronously before this call returns; otherwise
    /// it is appended and will fire once, in order, when `complete` or
    /// `fail` runs.
    ///
    /// Returns `self` (cheaply cloned) so calls can be chained
    /// fluently.
    pub fn handle(&self, mut cb: impl FnMut(Option<T>, Option<E>) + 'static) -> Self {
        let already_terminal = {
            let mut inner = self.inner.borrow_mut();
            match &inner.outcome {
                Outcome::Pending => {
                    inner.handlers.push(Box::new(cb));
                    None
                }
                Outcome::Completed(v) => Some((Some(v.clone()), None)),
                Outcome::Failed(e) => Some((None, Some(e.clone()))),
            }
        };
        if let Some((v, e)) = already_terminal {
            cb(v, e);
        }
        self.clone()
    }

    /// Registers a handler that produces a downstream future. The
    /// downstream completes with the same outcome as `self` once `cb`
    /// has run, unless `cb` itself fails (returns `Err`), in which case
    /// the downstream fails with that error instead (§4.E, §9).
    pub fn and_then(
        &self,
        mut cb: impl FnMut(Option<T>, Option<E>) -> Result<(), E> + 'static,
    ) -> Self {
        let downstream = Self::new();
        let downstream_for_handler = downstream.clone();
        self.handle(move |v, e| match cb(v.clone(), e.clone()) {
            Ok(()) => {
                if let Some(v) = v {
                    let _ = downstream_for_handler.complete(v);
                } else if let Some(e) = e {
                    let _ = downstream_for_handler.fail(e);
                }
            }
            Err(err) => {
                let _ = downstream_for_handler.fail(err);
            }
        });
        downstream
    }

    /// Exactly-once terminal transition to `COMPLETED(value)`.
    ///
    /// Handlers registered so far are drained out of the future and
    /// invoked iteratively from this stack frame — never recursively —
    /// so a handler that re-enters `handle` during its own invocation
    /// sees the future as already terminal and fires immediately (§4.E).
    pub fn complete(&self, value: T) -> RuntimeResult<()> {
        let handlers = {
            let mut inner = self.inner.borrow_mut();
            if !matches!(inner.outcome, Outcome::Pending) {
                return Err(RuntimeError::AlreadyResolved);
            }
            inner.outcome = Outcome::Completed(value.clone());
            std::mem::take(&mut inner.handlers)
        };
        for mut handler in handlers {
            handler(Some(value.clone()), None);
        }
        Ok(())
    }

    /// Exactly-once terminal transition to `FAILED(error)`.
    pub fn fail(&self, error: E) -> RuntimeResult<()> {
        let handlers = {
            let mut inner = self.inner.borrow_mut();
            if !matches!(inner.outcome, Outcome::Pending) {
                return Err(RuntimeError::AlreadyResolved);
            }
            inner.outcome = Outcome::Failed(error.clone());
            std::mem::take(&mut inner.handlers)
        };
        for mut handler in handlers {
            handler(None, Some(error.clone()));
        }
        Ok(())
    }

    pub fn get_result(&self) -> RuntimeResult<T> {
        match &self.inner.borrow().outcome {
            Outcome::Completed(v) => Ok(v.clone()),
            _ => Err(RuntimeError::WrongState("completed")),
        }
    }

    pub fn get_exception(&self) -> RuntimeResult<E> {
        match &self.inner.borrow().outcome {
            Outcome::Failed(e) => Ok(e.clone()),
            _ => Err(RuntimeError::WrongState("failed")),
        }
    }
}
