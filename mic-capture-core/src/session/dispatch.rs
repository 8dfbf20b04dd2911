use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::Mutex;

type Action = Box<dyn FnOnce() + Send + 'static>;

/// FIFO of deferred actions, fed from any thread and drained on the host's
/// main thread once per tick.
///
/// Cloning yields another handle to the same queue.
#[derive(Clone, Default)]
pub struct DispatchQueue {
    pending: Arc<Mutex<VecDeque<Action>>>,
}

impl DispatchQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `action` to run on the next [`drain`](Self::drain).
    pub fn dispatch<F>(&self, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.pending.lock().push_back(Box::new(action));
    }

    /// Run every action queued so far, in order, on the calling thread.
    ///
    /// The lock is released before the actions run, so an action may dispatch
    /// further work; that work runs on the following drain. A panicking
    /// action is logged and the remaining ones still run. Returns the number
    /// of actions run.
    pub fn drain(&self) -> usize {
        let actions = std::mem::take(&mut *self.pending.lock());
        let count = actions.len();
        for action in actions {
            if panic::catch_unwind(AssertUnwindSafe(action)).is_err() {
                log::error!("Dispatched action panicked");
            }
        }
        count
    }

    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }
}

impl std::fmt::Debug for DispatchQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchQueue").field("pending", &self.len()).finish()
    }
}
