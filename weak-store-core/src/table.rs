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

//! `WeakTable<K, V, C>` (spec.md §6): a single-key weak table with
//! pluggable, non-identity key comparison, e.g. two distinct `String`
//! allocations that are case-insensitively equal address the same entry.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use hashbrown::hash_table::Entry;
use tracing::trace;
use weak_store_common::{Comparator, DefaultComparator, Error as CommonError, Metrics, MetricsSnapshot, WeakKey};

use crate::error::GetOrCreateError;
use crate::index::ShardedIndex;
use crate::listener::{self, DefaultReleaseListener, ReleaseListener};
use crate::reclaim;
use crate::slot::Slot;

struct Inner<K, V, C, L> {
    index: ShardedIndex<Slot<K, V>>,
    comparator: C,
    listener: L,
    metrics: Metrics,
}

/// A thread-safe weak table: one key, one value, released when the key
/// dies. Cheap to clone, like [`crate::multi::MultiKeyWeakStore`].
pub struct WeakTable<K, V, C = DefaultComparator, L = DefaultReleaseListener>(Arc<Inner<K, V, C, L>>);

impl<K, V, C, L> Clone for WeakTable<K, V, C, L> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

fn key_matches<K, V, C: Comparator<K>>(comparator: &C, slot: &Slot<K, V>, probe: &K) -> bool {
    match slot.keys.first().and_then(|handle| handle.upgrade()) {
        Some(resident) => comparator.eq(&resident, probe),
        None => false,
    }
}

impl<K, V, C: Comparator<K>, L: ReleaseListener<V>> WeakTable<K, V, C, L> {
    pub(crate) fn new(index: ShardedIndex<Slot<K, V>>, comparator: C, listener: L) -> Self {
        Self(Arc::new(Inner {
            index,
            comparator,
            listener,
            metrics: Metrics::default(),
        }))
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.0.metrics.snapshot()
    }

    fn dispose_closure(&self, hash: u64) -> impl Fn(std::sync::Weak<Slot<K, V>>) -> Box<dyn Fn() + Send + Sync>
    where
        K: Send + Sync + 'static,
        V: Send + 'static,
        C: 'static,
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

impl<K, V, C, L> WeakTable<K, V, C, L>
where
    K: Send + Sync + 'static,
    V: Clone + Send + 'static,
    C: Comparator<K>,
    L: ReleaseListener<V>,
{
    /// Looks up the value for a key equal to `key` under this table's
    /// comparator. `None` if absent or the matching entry's key has died.
    pub fn get(&self, key: &K) -> Option<V> {
        let hash = self.0.comparator.hash(key);
        let shard = self.0.index.lock_shard(hash);
        let found = shard.find(hash, |candidate| key_matches(&self.0.comparator, candidate, key))?;
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

    /// Returns the live value for `key`, creating it with `factory` and a
    /// fresh [`WeakKey`] if absent. The table takes ownership of binding
    /// `key`'s weak identity; callers keep their own `WeakKey<K>` (typically
    /// the same one, cloned) to control the key's lifetime.
    pub fn get_or_try_create<F, E>(&self, key: &WeakKey<K>, factory: F) -> Result<V, GetOrCreateError<E>>
    where
        F: FnOnce() -> Result<V, E>,
    {
        let hash = self.0.comparator.hash(key);
        let mut shard = self.0.index.lock_shard(hash);

        let entry = shard.entry(
            hash,
            |candidate| key_matches(&self.0.comparator, candidate, key),
            |candidate| candidate.cached_hash,
        );
        let vacant = match entry {
            Entry::Occupied(occupied) => {
                let slot = occupied.get().clone();
                if slot.is_live() && slot.all_keys_alive() {
                    self.0.metrics.hit.fetch_add(1, Ordering::Relaxed);
                    return Ok(slot.peek_value().expect("live slot holds a value"));
                }
                trace!("evicting zombie weak-table entry found during get_or_try_create");
                let (stale, vacant) = occupied.remove();
                reclaim::dispose(&stale, &self.0.listener, &self.0.metrics);
                vacant
            }
            Entry::Vacant(vacant) => vacant,
        };

        self.0.metrics.miss.fetch_add(1, Ordering::Relaxed);
        let value = weak_store_common::reentrancy::guard_factory(factory).map_err(GetOrCreateError::Factory)?;
        let make_dispose = self.dispose_closure(hash);
        let slot = Slot::new_cyclic(hash, std::slice::from_ref(key), value.clone(), make_dispose);
        vacant.insert(slot);
        self.0.metrics.insert.fetch_add(1, Ordering::Relaxed);
        Ok(value)
    }

    /// Inserts `value` under a fresh `WeakKey` equal to `key` only if no
    /// live entry equal to `key` already exists (spec.md §6 `TryAdd`).
    pub fn try_add(&self, key: &WeakKey<K>, value: V) -> Result<(), CommonError> {
        let hash = self.0.comparator.hash(key);
        let mut shard = self.0.index.lock_shard(hash);
        let entry = shard.entry(
            hash,
            |candidate| key_matches(&self.0.comparator, candidate, key),
            |candidate| candidate.cached_hash,
        );
        let vacant = match entry {
            Entry::Occupied(occupied) if occupied.get().is_live() && occupied.get().all_keys_alive() => {
                return Err(CommonError::DuplicateKey);
            }
            Entry::Occupied(occupied) => {
                let (stale, vacant) = occupied.remove();
                reclaim::dispose(&stale, &self.0.listener, &self.0.metrics);
                vacant
            }
            Entry::Vacant(vacant) => vacant,
        };
        let make_dispose = self.dispose_closure(hash);
        let slot = Slot::new_cyclic(hash, std::slice::from_ref(key), value, make_dispose);
        vacant.insert(slot);
        self.0.metrics.insert.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Installs `value` for a key equal to `key`, replacing any existing
    /// entry. Skips the release hook if the existing value has the same
    /// identity as `value` (spec.md §6 `Set`, same `IdentityEq` rule as
    /// [`crate::multi::MultiKeyWeakStore::set`]).
    pub fn set(&self, key: &WeakKey<K>, value: V) -> Result<(), CommonError>
    where
        V: weak_store_common::IdentityEq,
    {
        let hash = self.0.comparator.hash(key);
        let mut shard = self.0.index.lock_shard(hash);
        let entry = shard.entry(
            hash,
            |candidate| key_matches(&self.0.comparator, candidate, key),
            |candidate| candidate.cached_hash,
        );
        match entry {
            Entry::Occupied(occupied) if occupied.get().is_live() && occupied.get().all_keys_alive() => {
                let slot = occupied.get().clone();
                drop(shard);
                let previous = match slot.peek_value() {
                    Some(current) if current.same_identity(&value) => None,
                    _ => slot.swap_value(value),
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
                let slot = Slot::new_cyclic(hash, std::slice::from_ref(key), value, make_dispose);
                vacant.insert(slot);
                self.0.metrics.insert.fetch_add(1, Ordering::Relaxed);
            }
            Entry::Vacant(vacant) => {
                let make_dispose = self.dispose_closure(hash);
                let slot = Slot::new_cyclic(hash, std::slice::from_ref(key), value, make_dispose);
                vacant.insert(slot);
                self.0.metrics.insert.fetch_add(1, Ordering::Relaxed);
            }
        }
        Ok(())
    }

    /// Removes and returns the value equal to `key`, if live.
    pub fn remove(&self, key: &K) -> Option<V> {
        let hash = self.0.comparator.hash(key);
        let mut shard = self.0.index.lock_shard(hash);
        let removed = match shard.find_entry(hash, |candidate| key_matches(&self.0.comparator, candidate, key)) {
            Ok(entry) => Some(entry.remove().0),
            Err(_) => None,
        };
        drop(shard);
        let slot = removed?;
        let was_live = slot.is_live() && slot.all_keys_alive();
        let value = if slot.begin_dispose() {
            let value = slot.take_value();
            slot.release_bindings();
            value
        } else {
            None
        };
        self.0.metrics.remove.fetch_add(1, Ordering::Relaxed);
        if was_live {
            value
        } else {
            None
        }
    }

    /// Drops every live entry, releasing each value through the listener.
    /// Zombies already pending reclamation via their own notifier are left
    /// alone; they will dispose themselves when that notifier runs.
    pub fn clear(&self) {
        for slot in self.0.index.drain_all() {
            reclaim::dispose(&slot, &self.0.listener, &self.0.metrics);
        }
    }

    /// A best-effort, weakly consistent snapshot of the table's live
    /// entries (spec.md §6 Iteration semantics): one shard lock at a time,
    /// never the whole table at once.
    pub fn iter(&self) -> Vec<(K, V)>
    where
        K: Clone,
    {
        let mut out = Vec::new();
        self.0.index.for_each(|slot| {
            if slot.is_live() {
                if let (Some(key), Some(value)) = (slot.keys.first().and_then(|h| h.upgrade()), slot.peek_value()) {
                    out.push(((*key).clone(), value));
                }
            }
        });
        out
    }

    /// Snapshot of the live keys only (spec.md §6 `Keys`).
    pub fn keys(&self) -> Vec<K>
    where
        K: Clone,
    {
        self.iter().into_iter().map(|(k, _)| k).collect()
    }

    /// Snapshot of the live values only (spec.md §6 `Values`).
    pub fn values(&self) -> Vec<V>
    where
        K: Clone,
    {
        self.iter().into_iter().map(|(_, v)| v).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::WeakTableBuilder;

    fn table<V: Clone + Send + Sync + 'static>() -> WeakTable<String, V> {
        WeakTableBuilder::new().with_shards(4).build()
    }

    #[test]
    fn get_miss_when_absent() {
        let table = table::<u32>();
        assert_eq!(table.get(&"missing".to_string()), None);
    }

    #[test]
    fn get_or_try_create_inserts_and_hits() {
        let table = table::<u32>();
        let key = WeakKey::new("alpha".to_string());
        assert_eq!(table.get_or_try_create(&key, || Ok::<_, ()>(1)).unwrap(), 1);
        assert_eq!(table.get(&"alpha".to_string()), Some(1));
    }

    #[test]
    fn key_death_releases_value() {
        let table = table::<u32>();
        let key = WeakKey::new("beta".to_string());
        table.get_or_try_create(&key, || Ok::<_, ()>(2)).unwrap();
        drop(key);
        assert_eq!(table.get(&"beta".to_string()), None);
        assert_eq!(table.metrics().reclaim, 1);
    }

    #[test]
    fn try_add_rejects_duplicate() {
        let table = table::<u32>();
        let key = WeakKey::new("gamma".to_string());
        table.try_add(&key, 3).unwrap();
        let key2 = WeakKey::new("gamma".to_string());
        assert_eq!(table.try_add(&key2, 4), Err(CommonError::DuplicateKey));
    }

    #[test]
    fn clear_releases_every_live_entry() {
        let table = table::<u32>();
        for i in 0..5u32 {
            let key = WeakKey::new(format!("k{i}"));
            table.try_add(&key, i).unwrap();
            std::mem::forget(key);
        }
        table.clear();
        assert_eq!(table.metrics().reclaim, 5);
    }

    #[test]
    fn keys_and_values_reflect_live_entries_only() {
        let table = table::<u32>();
        let alive = WeakKey::new("alive".to_string());
        table.try_add(&alive, 1).unwrap();
        {
            let dying = WeakKey::new("dying".to_string());
            table.try_add(&dying, 2).unwrap();
        }

        assert_eq!(table.keys(), vec!["alive".to_string()]);
        assert_eq!(table.values(), vec![1]);
    }
}
