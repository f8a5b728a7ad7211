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

//! `MultiKeyWeakStore<K, V>` (spec.md §4): a value keyed by an ordered tuple
//! of two or more [`WeakKey`]s, released the instant any one of them dies.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use hashbrown::hash_table::Entry;
use tracing::trace;
use weak_store_common::weak_key::positional_identity_hash;
use weak_store_common::{Error as CommonError, Metrics, MetricsSnapshot, WeakKey};

use crate::error::GetOrCreateError;
use crate::index::ShardedIndex;
use crate::listener::{self, DefaultReleaseListener, ReleaseListener};
use crate::reclaim;
use crate::slot::Slot;

struct Inner<K, V, L> {
    index: ShardedIndex<Slot<K, V>>,
    listener: L,
    metrics: Metrics,
}

/// A thread-safe, multi-key weak associative store.
///
/// Cheap to clone: every clone shares the same index (mirrors the teacher's
/// `Cache` handle, itself an `Arc` around its shards).
pub struct MultiKeyWeakStore<K, V, L = DefaultReleaseListener>(Arc<Inner<K, V, L>>);

impl<K, V, L> Clone for MultiKeyWeakStore<K, V, L> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

fn keys_match<K, V>(slot: &Slot<K, V>, probe: &[WeakKey<K>]) -> bool {
    slot.keys.len() == probe.len()
        && slot
            .keys
            .iter()
            .zip(probe)
            .all(|(resident, probe)| resident.identity() == probe.identity())
}

impl<K, V, L: ReleaseListener<V>> MultiKeyWeakStore<K, V, L> {
    pub(crate) fn new(index: ShardedIndex<Slot<K, V>>, listener: L) -> Self {
        Self(Arc::new(Inner {
            index,
            listener,
            metrics: Metrics::default(),
        }))
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.0.metrics.snapshot()
    }

    /// Builds the notifier callback for a freshly created slot: a 'static,
    /// `Send + Sync` closure holding only a clone of the inner `Arc` and the
    /// slot's own weak back-reference, per spec.md I7 ("must not itself keep
    /// any of the keys alive").
    fn dispose_closure(&self, hash: u64) -> impl Fn(std::sync::Weak<Slot<K, V>>) -> Box<dyn Fn() + Send + Sync>
    where
        K: Send + Sync + 'static,
        V: Send + 'static,
        L: 'static,
    {
        let inner = self.0.clone();
        move |weak_slot: std::sync::Weak<Slot<K, V>>| {
            let inner = inner.clone();
            Box::new(move || {
                if let Some(slot) = weak_slot.upgrade() {
                    debug_assert_eq!(slot.cached_hash, hash);
                    reclaim::unlink_and_dispose(&inner.index, &slot, &inner.listener, &inner.metrics);
                }
            }) as Box<dyn Fn() + Send + Sync>
        }
    }
}

impl<K, V, L> MultiKeyWeakStore<K, V, L>
where
    K: Send + Sync + 'static,
    V: Clone + Send + 'static,
    L: ReleaseListener<V>,
{
    /// Looks up the value for an exact, ordered key tuple. `None` if no
    /// entry is indexed under these keys, or if the indexed entry is a
    /// zombie (spec.md I3: any key dead makes the whole entry invisible).
    pub fn get(&self, keys: &[WeakKey<K>]) -> Option<V> {
        if keys.is_empty() {
            return None;
        }
        let hash = positional_identity_hash(keys);
        let shard = self.0.index.lock_shard(hash);
        let found = shard.find(hash, |candidate| keys_match(candidate, keys))?;
        if !found.is_live() || !found.all_keys_alive() {
            return None;
        }
        let value = found.peek_value();
        drop(shard);
        if value.is_some() {
            self.0.metrics.hit.fetch_add(1, Ordering::Relaxed);
        }
        value
    }

    /// Returns the existing value for `keys` if live, otherwise invokes
    /// `factory` and inserts its result. At most one `factory` call happens
    /// per key tuple at a time: `factory` runs with the destination
    /// shard's lock held, so two racing callers for the same keys serialize
    /// rather than both constructing a value (spec.md §8 scenario:
    /// "concurrent GetOrCreate ... factory invoked exactly once").
    pub fn get_or_try_create<F, E>(&self, keys: &[WeakKey<K>], factory: F) -> Result<V, GetOrCreateError<E>>
    where
        F: FnOnce() -> Result<V, E>,
    {
        if keys.is_empty() {
            return Err(GetOrCreateError::Store(CommonError::EmptyKeys));
        }
        let hash = positional_identity_hash(keys);
        let mut shard = self.0.index.lock_shard(hash);

        let entry = shard.entry(hash, |candidate| keys_match(candidate, keys), |candidate| candidate.cached_hash);
        let vacant = match entry {
            Entry::Occupied(occupied) => {
                let slot = occupied.get().clone();
                if slot.is_live() && slot.all_keys_alive() {
                    self.0.metrics.hit.fetch_add(1, Ordering::Relaxed);
                    return Ok(slot.peek_value().expect("live slot holds a value"));
                }
                trace!("evicting zombie multi-key entry found during get_or_try_create");
                let (stale, vacant) = occupied.remove();
                reclaim::dispose(&stale, &self.0.listener, &self.0.metrics);
                vacant
            }
            Entry::Vacant(vacant) => vacant,
        };

        self.0.metrics.miss.fetch_add(1, Ordering::Relaxed);
        let value = weak_store_common::reentrancy::guard_factory(factory).map_err(GetOrCreateError::Factory)?;
        let make_dispose = self.dispose_closure(hash);
        let slot = Slot::new_cyclic(hash, keys, value.clone(), make_dispose);
        vacant.insert(slot);
        self.0.metrics.insert.fetch_add(1, Ordering::Relaxed);
        Ok(value)
    }

    /// Installs `value` under `keys`, replacing any existing entry. If an
    /// existing, live entry's value has the same identity as `value`
    /// (spec-level `IdentityEq`), no release hook runs for it: this is a
    /// no-op `Set`. Otherwise the old value is released through `L` before
    /// the new one is installed.
    pub fn set(&self, keys: &[WeakKey<K>], value: V) -> Result<(), CommonError>
    where
        V: weak_store_common::IdentityEq,
    {
        if keys.is_empty() {
            return Err(CommonError::EmptyKeys);
        }
        let hash = positional_identity_hash(keys);
        let mut shard = self.0.index.lock_shard(hash);

        let entry = shard.entry(hash, |candidate| keys_match(candidate, keys), |candidate| candidate.cached_hash);
        match entry {
            Entry::Occupied(occupied) if occupied.get().is_live() && occupied.get().all_keys_alive() => {
                let slot = occupied.get().clone();
                drop(shard);
                let previous = if let Some(current) = slot.peek_value() {
                    if current.same_identity(&value) {
                        None
                    } else {
                        slot.swap_value(value)
                    }
                } else {
                    slot.swap_value(value)
                };
                if let Some(previous) = previous {
                    self::listener::release(&self.0.listener, previous);
                    self.0.metrics.release.fetch_add(1, Ordering::Relaxed);
                }
                self.0.metrics.replace.fetch_add(1, Ordering::Relaxed);
            }
            Entry::Occupied(occupied) => {
                let (stale, vacant) = occupied.remove();
                reclaim::dispose(&stale, &self.0.listener, &self.0.metrics);
                let make_dispose = self.dispose_closure(hash);
                let slot = Slot::new_cyclic(hash, keys, value, make_dispose);
                vacant.insert(slot);
                self.0.metrics.insert.fetch_add(1, Ordering::Relaxed);
            }
            Entry::Vacant(vacant) => {
                let make_dispose = self.dispose_closure(hash);
                let slot = Slot::new_cyclic(hash, keys, value, make_dispose);
                vacant.insert(slot);
                self.0.metrics.insert.fetch_add(1, Ordering::Relaxed);
            }
        }
        Ok(())
    }

    /// Removes and returns the value for `keys`, if a live entry exists.
    /// Releasing the returned value (if any) is the caller's responsibility:
    /// `remove` does not itself invoke the release hook, matching
    /// spec.md's distinction between an explicit `Remove` (caller regains
    /// ownership) and reclamation-driven disposal (store owns the release).
    pub fn remove(&self, keys: &[WeakKey<K>]) -> Result<Option<V>, CommonError> {
        if keys.is_empty() {
            return Err(CommonError::EmptyKeys);
        }
        let hash = positional_identity_hash(keys);
        let mut shard = self.0.index.lock_shard(hash);
        let removed = match shard.find_entry(hash, |candidate| keys_match(candidate, keys)) {
            Ok(entry) => Some(entry.remove().0),
            Err(_) => None,
        };
        drop(shard);
        let Some(slot) = removed else {
            return Ok(None);
        };
        let was_live = slot.is_live() && slot.all_keys_alive();
        let value = if slot.begin_dispose() {
            let value = slot.take_value();
            slot.release_bindings();
            value
        } else {
            None
        };
        self.0.metrics.remove.fetch_add(1, Ordering::Relaxed);
        Ok(if was_live { value } else { None })
    }
}
