//! Ordered, identity-keyed observer lists.
//!
//! Both the clock and the event log fan notifications out to listeners in
//! registration order. Listeners are compared by `Arc` pointer, so
//! registering the same listener twice or removing one that was never
//! registered leaves the set unchanged.

use std::sync::Arc;

/// An ordered set of shared listeners.
pub(crate) struct ListenerSet<L: ?Sized> {
    listeners: Vec<Arc<L>>,
}

impl<L: ?Sized> ListenerSet<L> {
    pub(crate) const fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    /// Add a listener. Returns `false` if it was already registered.
    pub(crate) fn add(&mut self, listener: Arc<L>) -> bool {
        if self.contains(&listener) {
            return false;
        }
        self.listeners.push(listener);
        true
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub(crate) fn remove(&mut self, listener: &Arc<L>) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|l| !same(l, listener));
        self.listeners.len() != before
    }

    pub(crate) fn contains(&self, listener: &Arc<L>) -> bool {
        self.listeners.iter().any(|l| same(l, listener))
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Arc<L>> {
        self.listeners.iter()
    }

    pub(crate) fn len(&self) -> usize {
        self.listeners.len()
    }
}

impl<L: ?Sized> core::fmt::Debug for ListenerSet<L> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ListenerSet")
            .field("len", &self.listeners.len())
            .finish()
    }
}

fn same<L: ?Sized>(a: &Arc<L>, b: &Arc<L>) -> bool {
    // Compare data addresses only; vtable pointers may differ across
    // codegen units for the same object.
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}
