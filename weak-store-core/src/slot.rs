//  Copyright 2025 Weak Store Authors
//
//  Licensed under the Apache License, Version 2.0 (the "License");
//  you may not use this file except in compliance with the License.
//  You may obtain a copy of the License at
//
//  http://www.apache.org/licenses/LICENSE-2.0
//
//  Unless required by applicable law or agreed to in writing, software
//  distributed under the License is distributed on an "AS IS" BASIS,
//  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//  See the License for the specific language governing permissions and
//  limitations under the License.

//! The stored record (spec.md §3 EntrySlot) and its lifecycle.
//!
//! One `Slot<K, V>` type serves both containers: a `MultiKeyWeakStore` entry
//! has `keys.len() >= 2` positions in general (n >= 1), a `WeakTable` entry
//! always has exactly one. Only the hash/equality used to find a slot in
//! the index differs between the two containers (see `multi.rs`/`table.rs`).

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use weak_store_common::weak_key::{Notifier, WeakKey, WeakKeyHandle};

pub(crate) const LIVE: u8 = 0;
pub(crate) const DYING: u8 = 1;

pub(crate) struct Slot<K, V> {
    pub(crate) keys: Vec<WeakKeyHandle<K>>,
    pub(crate) cached_hash: u64,
    value: Mutex<Option<V>>,
    state: AtomicU8,
    disposed: AtomicBool,
    notifier: Arc<Notifier>,
}

impl<K, V> Slot<K, V> {
    /// Builds a resident slot and registers one shared notifier under every
    /// key. `make_dispose` receives a `Weak` back-reference to the slot
    /// being built (via `Arc::new_cyclic`) so the notifier's callback can
    /// find its way back into the index without the slot needing to know
    /// about the index itself.
    pub(crate) fn new_cyclic<F>(
        cached_hash: u64,
        keys: &[WeakKey<K>],
        value: V,
        make_dispose: impl FnOnce(Weak<Slot<K, V>>) -> F,
    ) -> Arc<Self>
    where
        F: Fn() + Send + Sync + 'static,
    {
        Arc::new_cyclic(|weak_slot| {
            let notifier = Notifier::new(make_dispose(weak_slot.clone()));
            for key in keys {
                key.register(&notifier);
            }
            Slot {
                keys: keys.iter().map(|k| k.downgrade()).collect(),
                cached_hash,
                value: Mutex::new(Some(value)),
                state: AtomicU8::new(LIVE),
                disposed: AtomicBool::new(false),
                notifier,
            }
        })
    }

    pub(crate) fn is_live(&self) -> bool {
        self.state.load(Ordering::Acquire) == LIVE
    }

    /// Every key still resolves to a live value. A slot failing this check
    /// is a zombie: still indexed, but invisible to lookups (spec.md I3/§4.1).
    pub(crate) fn all_keys_alive(&self) -> bool {
        self.keys.iter().all(|k| k.upgrade().is_some())
    }

    /// Step 1 of spec.md §4.3's dispose protocol: the at-most-once latch.
    /// Returns `true` if this call won the race and must carry out the
    /// remaining steps.
    pub(crate) fn begin_dispose(&self) -> bool {
        let won = self
            .disposed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if won {
            self.state.store(DYING, Ordering::Release);
        }
        won
    }

    /// Step 3: take the value exactly once. `None` if already taken.
    pub(crate) fn take_value(&self) -> Option<V> {
        self.value.lock().take()
    }

    /// Clones the resident value without disturbing it. `None` for a slot
    /// already mid-dispose (its value has been taken).
    pub(crate) fn peek_value(&self) -> Option<V>
    where
        V: Clone,
    {
        self.value.lock().clone()
    }

    /// Step 4: drop the shared registrations from every key that is still
    /// alive, and suppress the notifier so a later key death is a no-op.
    pub(crate) fn release_bindings(&self) {
        for key in &self.keys {
            if let Some(key) = key.upgrade() {
                key.unregister(&self.notifier);
            }
        }
        self.notifier.suppress();
    }

    /// Swaps in a new value, returning the old one. Used by `Set`'s replace
    /// path, which invokes the release hook itself rather than going
    /// through `dispose` (the slot stays Live).
    pub(crate) fn swap_value(&self, value: V) -> Option<V> {
        self.value.lock().replace(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispose_latch_is_one_shot() {
        let key = WeakKey::new(1u32);
        let slot = Slot::new_cyclic(0, std::slice::from_ref(&key), "v", |_weak| || {});
        assert!(slot.begin_dispose());
        assert!(!slot.begin_dispose());
    }

    #[test]
    fn zombie_detection_after_key_death() {
        let key = WeakKey::new(1u32);
        let slot = Slot::new_cyclic(0, std::slice::from_ref(&key), "v", |_weak| || {});
        assert!(slot.all_keys_alive());
        drop(key);
        assert!(!slot.all_keys_alive());
    }

    #[test]
    fn take_value_is_one_shot() {
        let key = WeakKey::new(1u32);
        let slot = Slot::new_cyclic(0, std::slice::from_ref(&key), "v", |_weak| || {});
        assert_eq!(slot.take_value(), Some("v"));
        assert_eq!(slot.take_value(), None);
    }
}
