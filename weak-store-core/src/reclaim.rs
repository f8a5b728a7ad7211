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

//! The dispose protocol (spec.md §4.3), shared by `MultiKeyWeakStore` and
//! `WeakTable`.
//!
//! A slot reaches here from two, unsynchronized directions: a key's `Drop`
//! firing the slot's notifier on whatever thread happened to drop the last
//! strong reference to that key, or a lookup/`Remove`/`Set` that notices the
//! slot in its own shard lock is already a zombie. `Slot::begin_dispose`'s
//! CAS latch is what makes both paths converge on exactly one execution of
//! the value-release and key-unregistration steps (spec.md I4).

use std::sync::atomic::Ordering;
use std::sync::Arc;

use weak_store_common::Metrics;

use crate::index::ShardedIndex;
use crate::listener::{self, ReleaseListener};
use crate::slot::Slot;

/// Runs steps 2-4 of the dispose protocol for a slot the caller has already
/// unlinked from the index (or that was never linked to begin with, e.g. a
/// factory failure). Safe to call redundantly: only the call that wins
/// `begin_dispose`'s CAS does any work.
pub(crate) fn dispose<K, V, L: ReleaseListener<V>>(slot: &Arc<Slot<K, V>>, listener: &L, metrics: &Metrics) {
    if !slot.begin_dispose() {
        return;
    }
    if let Some(value) = slot.take_value() {
        self::listener::release(listener, value);
        metrics.release.fetch_add(1, Ordering::Relaxed);
    }
    slot.release_bindings();
    metrics.reclaim.fetch_add(1, Ordering::Relaxed);
}

/// The notifier-driven path: the slot is (as far as this thread knows)
/// still linked in the index, so it must be unlinked under its shard's lock
/// before the rest of the dispose protocol runs. Also used by a lookup that
/// discovers a zombie slot still sitting in the table. The unlink step is
/// idempotent, since it keys off `Arc::ptr_eq` and a slot already removed
/// (by a racing caller who got there first) simply isn't found.
pub(crate) fn unlink_and_dispose<K, V, L: ReleaseListener<V>>(
    index: &ShardedIndex<Slot<K, V>>,
    slot: &Arc<Slot<K, V>>,
    listener: &L,
    metrics: &Metrics,
) {
    {
        let mut shard = index.lock_shard(slot.cached_hash);
        if let Ok(entry) = shard.find_entry(slot.cached_hash, |candidate| Arc::ptr_eq(candidate, slot)) {
            entry.remove();
        }
    }
    dispose(slot, listener, metrics);
}
