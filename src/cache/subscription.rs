use std::sync::{Arc, Weak};

use super::{Inner, Listener};

/// Keeps a cache listener registered until dropped.
#[must_use = "dropping a Subscription unregisters its listener"]
pub struct Subscription<V> {
    cache: Weak<Inner<V>>,
    key: String,
    id: u64,
    // Entries only hold a weak handle, this is the strong one.
    _listener: Arc<Listener<V>>,
}

impl<V> Subscription<V> {
    pub(super) fn new(cache: Weak<Inner<V>>, key: String, id: u64, listener: Arc<Listener<V>>) -> Self {
        Self {
            cache,
            key,
            id,
            _listener: listener,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn unsubscribe(self) {}
}

impl<V> Drop for Subscription<V> {
    fn drop(&mut self) {
        if let Some(cache) = self.cache.upgrade() {
            cache.remove_listener(&self.key, self.id);
        }
    }
}
