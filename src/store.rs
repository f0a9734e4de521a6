// src/store.rs

//! Concurrent key → state map with one mutex per key.
//!
//! The map (a [`DashMap`]) only hands out `Arc` handles; the read-check-write
//! sequence of a quota decision runs under the per-key mutex, so requests for
//! different keys never wait on each other and no shard lock is held while a
//! key's mutex is contended.
//!
//! Sweeping uses `try_lock`: a key that is being decided right now is simply
//! kept until the next sweep. State removed by a sweep is flagged as evicted
//! under its own lock, and an acquirer that lands on evicted state looks the
//! key up again, so an admission is never written into a detached slot.

// dependencies
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug)]
struct Slot<S> {
    state: S,
    evicted: bool,
}

type SlotHandle<S> = Arc<Mutex<Slot<S>>>;

#[derive(Debug)]
pub(crate) struct KeyedStore<S> {
    slots: DashMap<String, SlotHandle<S>>,
}

impl<S> Default for KeyedStore<S> {
    fn default() -> Self {
        Self {
            slots: DashMap::new(),
        }
    }
}

impl<S> KeyedStore<S> {
    /// Run `f` on the state of `key` while holding that key's lock,
    /// creating the state with `init` on first observation.
    pub(crate) fn with_state<R>(
        &self,
        key: &str,
        init: impl Fn() -> S,
        f: impl FnOnce(&mut S) -> R,
    ) -> R {
        let mut guard = loop {
            let slot = match self.slots.get(key) {
                Some(existing) => Arc::clone(existing.value()),
                None => Arc::clone(
                    self.slots
                        .entry(key.to_string())
                        .or_insert_with(|| {
                            Arc::new(Mutex::new(Slot {
                                state: init(),
                                evicted: false,
                            }))
                        })
                        .value(),
                ),
            };

            let guard = slot.lock_arc();
            if !guard.evicted {
                break guard;
            }
        };

        f(&mut guard.state)
    }

    /// Remove every idle entry for which `is_stale` holds, returning how many went.
    pub(crate) fn sweep(&self, mut is_stale: impl FnMut(&S) -> bool) -> usize {
        let mut removed = 0;
        self.slots.retain(|_, slot| match slot.try_lock() {
            Some(mut guard) if is_stale(&guard.state) => {
                guard.evicted = true;
                removed += 1;
                false
            }
            _ => true,
        });
        removed
    }

    /// Drop the state of `key`; the next request starts from scratch.
    pub(crate) fn remove(&self, key: &str) -> bool {
        match self.slots.remove(key) {
            Some((_, slot)) => {
                slot.lock().evicted = true;
                true
            }
            None => false,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    #[cfg(test)]
    pub(crate) fn contains_key(&self, key: &str) -> bool {
        self.slots.contains_key(key)
    }
}
