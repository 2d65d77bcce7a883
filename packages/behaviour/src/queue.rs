//! Deferred apply requests
//!
//! DOM updates usually complete asynchronously (an AJAX response, a lazy
//! render). Each completion wants the registry to re-apply to the new nodes,
//! and two completions touching the same subtree must not interleave. The
//! [`ApplyQueue`] serializes these requests: they run one at a time, in the
//! order they were scheduled.

use std::cell::RefCell;
use std::collections::VecDeque;

/// One queued apply pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplyRequest<N> {
    pub roots: Vec<N>,
    pub include_self: bool,
}

/// FIFO of pending apply requests.
#[derive(Debug)]
pub struct ApplyQueue<N> {
    pending: RefCell<VecDeque<ApplyRequest<N>>>,
}

impl<N> Default for ApplyQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N> ApplyQueue<N> {
    pub fn new() -> Self {
        Self {
            pending: RefCell::new(VecDeque::new()),
        }
    }

    pub fn push(&self, request: ApplyRequest<N>) {
        self.pending.borrow_mut().push_back(request);
    }

    /// Take the oldest request. The internal borrow ends before the caller
    /// runs it, so running a request may push new ones.
    pub fn pop(&self) -> Option<ApplyRequest<N>> {
        self.pending.borrow_mut().pop_front()
    }

    pub fn len(&self) -> usize {
        self.pending.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.borrow().is_empty()
    }
}
