//! Synchronous listener lists.
//!
//! Used both for the climate's change notification and for the glacier's
//! "ice thickness changed" / "steady state changed" events. Listeners run in
//! registration order on the caller's thread.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Handle returned by [`Observers::subscribe`]; pass it back to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// An ordered list of shared listeners.
///
/// `L` is usually a `dyn Fn(..)` type. Subscription works through `&self`
/// so that a listener list can live inside an `Rc`-shared object.
pub struct Observers<L: ?Sized> {
    next_id: Cell<u64>,
    listeners: RefCell<Vec<(ListenerId, Rc<L>)>>,
}

impl<L: ?Sized> Observers<L> {
    pub fn new() -> Self {
        Self {
            next_id: Cell::new(0),
            listeners: RefCell::new(Vec::new()),
        }
    }

    pub fn subscribe(&self, listener: Rc<L>) -> ListenerId {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.listeners.borrow_mut().push((id, listener));
        id
    }

    /// Returns false if `id` was not subscribed.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(lid, _)| *lid != id);
        listeners.len() != before
    }

    pub fn len(&self) -> usize {
        self.listeners.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.borrow().is_empty()
    }

    /// Copy of the current listeners in registration order.
    ///
    /// Callers iterate the copy, so listeners may (un)subscribe while a
    /// notification is in flight.
    pub fn snapshot(&self) -> Vec<Rc<L>> {
        self.listeners
            .borrow()
            .iter()
            .map(|(_, l)| Rc::clone(l))
            .collect()
    }
}

impl<L: ?Sized> Default for Observers<L> {
    fn default() -> Self {
        Self::new()
    }
}
