//! Multi-subscriber callback slots
//!
//! Each timer carries three slots (update, tick, finished). A slot is an
//! ordered list of zero-argument callbacks; subscribing returns a
//! [`CallbackId`] that later removes exactly that subscription.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// Shared zero-argument callback
pub type Callback = Rc<dyn Fn()>;

thread_local! {
    static NEXT_CALLBACK_ID: Cell<u64> = const { Cell::new(1) };
}

/// Handle identifying one subscription.
///
/// Ids are unique per thread, so an id never matches a subscription other
/// than the one it was returned for, even after its slot was cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallbackId(u64);

impl CallbackId {
    fn next() -> Self {
        NEXT_CALLBACK_ID.with(|next| {
            let id = next.get();
            next.set(id + 1);
            CallbackId(id)
        })
    }
}

/// Which slot of a timer a callback lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackSlot {
    /// Every advance while running, before tick resolution
    Update,
    /// Each time a tick boundary is crossed
    Tick,
    /// Once, when a non-looping timer exhausts its ticks
    Finished,
}

/// Ordered list of callbacks; invocation order is subscription order.
#[derive(Clone, Default)]
pub struct CallbackList {
    entries: Vec<(CallbackId, Callback)>,
}

impl CallbackList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a callback, returning its subscription handle
    pub fn subscribe(&mut self, callback: impl Fn() + 'static) -> CallbackId {
        self.subscribe_shared(Rc::new(callback))
    }

    /// Append an already shared callback
    pub fn subscribe_shared(&mut self, callback: Callback) -> CallbackId {
        let id = CallbackId::next();
        self.entries.push((id, callback));
        id
    }

    /// Remove one subscription. Returns false if it was not present.
    pub fn unsubscribe(&mut self, id: CallbackId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    pub fn contains(&self, id: CallbackId) -> bool {
        self.entries.iter().any(|(entry_id, _)| *entry_id == id)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy of the current subscriptions, so callbacks can run while the
    /// list itself is being modified.
    pub fn snapshot(&self) -> Vec<(CallbackId, Callback)> {
        self.entries.clone()
    }

    /// Move every subscription out, leaving the list empty
    pub fn take(&mut self) -> CallbackList {
        std::mem::take(self)
    }
}

impl fmt::Debug for CallbackList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|(id, _)| id))
            .finish()
    }
}
