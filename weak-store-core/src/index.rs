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

//! A sharded concurrent slot index (spec.md §3 EntryKey / §4.1 Lookup).
//!
//! Grounded on `GenericCache`'s `shards: Vec<Mutex<CacheShard<..>>>` split
//! (foyer-memory's `generic.rs`): each shard owns an independent
//! `hashbrown::HashTable`, selected by the top bits of the slot's hash, so
//! unrelated keys never contend on the same lock. `HashTable`'s raw
//! hash/eq-closure entry API (rather than `std::collections::HashMap`) is
//! what lets a lookup probe the table with a transient key tuple or a
//! borrowed `&K` without ever allocating a slot for the probe itself.

use std::sync::Arc;

use hashbrown::hash_table::HashTable;
use parking_lot::{Mutex, MutexGuard};

/// Sharded storage for `Arc<T>` entries, keyed by an externally supplied
/// `u64` hash. `T` itself is opaque to the index; `MultiKeyWeakStore` and
/// `WeakTable` each bring their own hash/equality closures per call.
pub(crate) struct ShardedIndex<T> {
    shards: Vec<Mutex<HashTable<Arc<T>>>>,
    mask: usize,
}

impl<T> ShardedIndex<T> {
    /// Builds an index with `shards.next_power_of_two()` shards (never
    /// fewer than one), so shard selection is a mask instead of a modulo.
    pub(crate) fn with_shards(shards: usize) -> Self {
        let shards = shards.max(1).next_power_of_two();
        Self {
            shards: (0..shards).map(|_| Mutex::new(HashTable::new())).collect(),
            mask: shards - 1,
        }
    }

    fn shard_index(&self, hash: u64) -> usize {
        (hash as usize) & self.mask
    }

    /// Locks and returns the shard responsible for `hash`. Callers drive the
    /// `hashbrown::hash_table` entry API directly against the returned
    /// table. The index itself has no opinion on MWS vs WT lookup
    /// semantics.
    pub(crate) fn lock_shard(&self, hash: u64) -> MutexGuard<'_, HashTable<Arc<T>>> {
        self.shards[self.shard_index(hash)].lock()
    }

    pub(crate) fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Total resident entries, live and zombie alike. `O(shards)`, used only
    /// for diagnostics/tests, never on a hot path.
    pub(crate) fn len(&self) -> usize {
        self.shards.iter().map(|s| s.lock().len()).sum()
    }

    /// Empties every shard and returns everything that was in it. Used by
    /// `WeakTable::clear`: draining under each shard's own lock keeps no
    /// single lock held for the whole table, and handing the drained
    /// entries back lets the caller run dispose logic outside any lock.
    pub(crate) fn drain_all(&self) -> Vec<Arc<T>> {
        let mut out = Vec::new();
        for shard in &self.shards {
            out.extend(shard.lock().drain());
        }
        out
    }

    /// Visits every entry across every shard, one shard lock at a time.
    /// Used by `WeakTable::iter` (spec.md §6 Iteration semantics: a
    /// best-effort, weakly-consistent snapshot, never a single lock held for
    /// the whole walk).
    pub(crate) fn for_each(&self, mut f: impl FnMut(&Arc<T>)) {
        for shard in &self.shards {
            for entry in shard.lock().iter() {
                f(entry);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Item(u64);

    #[test]
    fn shard_count_is_power_of_two() {
        let index: ShardedIndex<Item> = ShardedIndex::with_shards(5);
        assert_eq!(index.shard_count(), 8);
    }

    #[test]
    fn insert_find_remove_round_trip() {
        let index: ShardedIndex<Item> = ShardedIndex::with_shards(4);
        let hash = 7u64;
        {
            let mut shard = index.lock_shard(hash);
            shard.insert_unique(hash, Arc::new(Item(7)), |item| item.0);
        }
        assert_eq!(index.len(), 1);
        {
            let mut shard = index.lock_shard(hash);
            let entry = shard.find_entry(hash, |item| item.0 == 7).expect("present");
            entry.remove();
        }
        assert_eq!(index.len(), 0);
    }

    #[test]
    fn for_each_visits_every_shard() {
        let index: ShardedIndex<Item> = ShardedIndex::with_shards(8);
        for i in 0..20u64 {
            let mut shard = index.lock_shard(i);
            shard.insert_unique(i, Arc::new(Item(i)), |item| item.0);
        }
        let mut seen = Vec::new();
        index.for_each(|item| seen.push(item.0));
        seen.sort_unstable();
        assert_eq!(seen, (0..20).collect::<Vec<_>>());
    }
}
