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

//! The reachability primitive required by spec.md §6, synthesized on top of
//! `std::sync::Arc` the way spec.md §5/§9 prescribe for hosts without a
//! tracing GC: a reference-counted key handle whose *value*'s `Drop` fires
//! exactly when the last strong reference goes away, independent of any
//! outstanding weak references.

use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

/// A heap object whose reclamation is the signal that a dependent entry
/// should be disposed. One `Notifier` is shared by every key of an entry:
/// whichever key dies first fires it, which is equivalent to requiring all
/// keys to stay alive for the notifier to survive (spec.md §4.2, I7).
pub struct Notifier {
    fired: AtomicBool,
    callback: Box<dyn Fn() + Send + Sync>,
}

impl Notifier {
    pub fn new(callback: impl Fn() + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            fired: AtomicBool::new(false),
            callback: Box::new(callback),
        })
    }

    /// Runs the callback at most once, even if called concurrently from
    /// multiple keys' `Drop` or racing with an explicit dispose.
    pub fn fire(&self) {
        if self.fired.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).is_ok() {
            (self.callback)();
        }
    }

    /// Marks the notifier as already fired without running the callback,
    /// so a key dying after an explicit Remove/Set does not trigger a
    /// redundant dispose (spec.md §4.3 step 4: "suppress any further
    /// finalization callback on the notifier if still pending").
    pub fn suppress(&self) {
        self.fired.store(true, Ordering::Release);
    }
}

struct KeyCell<K> {
    value: K,
    dependents: Mutex<Vec<Weak<Notifier>>>,
}

impl<K> Drop for KeyCell<K> {
    fn drop(&mut self) {
        let dependents = std::mem::take(&mut *self.dependents.lock());
        for dependent in dependents {
            if let Some(notifier) = dependent.upgrade() {
                notifier.fire();
            }
        }
    }
}

/// A weak-reference-counted key handle.
///
/// Cloning is a cheap `Arc` clone; all clones of a `WeakKey` share one
/// identity and one liveness. The wrapped value is dropped, and every
/// registered [`Notifier`] fired, the instant the last `WeakKey` clone (or
/// the last thing holding one) is dropped.
pub struct WeakKey<K>(Arc<KeyCell<K>>);

impl<K> WeakKey<K> {
    pub fn new(value: K) -> Self {
        Self(Arc::new(KeyCell {
            value,
            dependents: Mutex::new(Vec::new()),
        }))
    }

    /// Stable identity of this key's allocation, for pointer-identity
    /// equality (used by `MultiKeyWeakStore`).
    pub fn identity(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }

    pub fn downgrade(&self) -> WeakKeyHandle<K> {
        WeakKeyHandle(Arc::downgrade(&self.0))
    }

    /// Registers `notifier` to fire when this key dies, pruning any
    /// already-dead registrations from earlier, disposed entries in the
    /// same pass: a bounded, local analog of a sweep, never a global one.
    pub fn register(&self, notifier: &Arc<Notifier>) {
        let mut dependents = self.0.dependents.lock();
        dependents.retain(|w| w.upgrade().is_some());
        dependents.push(Arc::downgrade(notifier));
    }

    /// Undoes [`Self::register`] for an entry disposed while this key is
    /// still alive (spec.md §4.3 step 4).
    pub fn unregister(&self, notifier: &Arc<Notifier>) {
        let mut dependents = self.0.dependents.lock();
        dependents.retain(|w| match w.upgrade() {
            Some(n) => !Arc::ptr_eq(&n, notifier),
            None => false,
        });
    }
}

impl<K> Clone for WeakKey<K> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<K> Deref for WeakKey<K> {
    type Target = K;

    fn deref(&self) -> &K {
        &self.0.value
    }
}

impl<K: std::fmt::Debug> std::fmt::Debug for WeakKey<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("WeakKey").field(&self.0.value).finish()
    }
}

/// A non-owning reference to a [`WeakKey`], held by a resident entry. Does
/// not keep the key's value alive (spec.md I6: "storing a key does not
/// extend its lifetime").
pub struct WeakKeyHandle<K>(Weak<KeyCell<K>>);

impl<K> WeakKeyHandle<K> {
    /// Resolves the handle if the key is still reachable, returning a
    /// strong [`WeakKey`] the caller can use to read the value or to
    /// register/unregister notifiers.
    pub fn upgrade(&self) -> Option<WeakKey<K>> {
        self.0.upgrade().map(WeakKey)
    }

    /// The same stable identity [`WeakKey::identity`] reports, readable even
    /// after the key has died: the backing allocation is only freed once
    /// every `WeakKeyHandle` referencing it is gone too, so the pointer
    /// value stays meaningful for positional identity comparisons on a
    /// zombie slot.
    pub fn identity(&self) -> usize {
        self.0.as_ptr() as *const () as usize
    }
}

impl<K> Clone for WeakKeyHandle<K> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

/// Positional identity hash for a sequence of keys, order-sensitive, per
/// spec.md §9's redesign note (supersedes the source's order-insensitive
/// XOR combinator).
pub fn positional_identity_hash<K>(keys: &[WeakKey<K>]) -> u64 {
    let mut hasher = ahash::AHasher::default();
    for key in keys {
        key.identity().hash(&mut hasher);
    }
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn fires_on_last_drop() {
        let fired = Arc::new(AtomicUsize::new(0));
        let notifier = {
            let fired = fired.clone();
            Notifier::new(move || {
                fired.fetch_add(1, Ordering::SeqCst);
            })
        };

        let key = WeakKey::new(42);
        key.register(&notifier);
        let clone = key.clone();

        drop(key);
        assert_eq!(fired.load(Ordering::SeqCst), 0, "one clone still alive");

        drop(clone);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn fires_at_most_once() {
        let fired = Arc::new(AtomicUsize::new(0));
        let notifier = {
            let fired = fired.clone();
            Notifier::new(move || {
                fired.fetch_add(1, Ordering::SeqCst);
            })
        };

        notifier.fire();
        notifier.fire();
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn suppress_prevents_later_fire() {
        let fired = Arc::new(AtomicUsize::new(0));
        let notifier = {
            let fired = fired.clone();
            Notifier::new(move || {
                fired.fetch_add(1, Ordering::SeqCst);
            })
        };

        notifier.suppress();
        notifier.fire();
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn handle_does_not_keep_key_alive() {
        let key = WeakKey::new("hello".to_string());
        let handle = key.downgrade();
        assert!(handle.upgrade().is_some());
        drop(key);
        assert!(handle.upgrade().is_none());
    }

    #[test]
    fn unregister_stops_future_fire() {
        let fired = Arc::new(AtomicUsize::new(0));
        let notifier = {
            let fired = fired.clone();
            Notifier::new(move || {
                fired.fetch_add(1, Ordering::SeqCst);
            })
        };

        let key = WeakKey::new(1);
        key.register(&notifier);
        key.unregister(&notifier);
        drop(key);
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn positional_hash_is_order_sensitive() {
        let a = WeakKey::new(1);
        let b = WeakKey::new(2);
        let h1 = positional_identity_hash(&[a.clone(), b.clone()]);
        let h2 = positional_identity_hash(&[b, a]);
        assert_ne!(h1, h2);
    }
}
