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

//! Builders for [`crate::multi::MultiKeyWeakStore`] and
//! [`crate::table::WeakTable`], mirroring the teacher's `CacheBuilder` /
//! `GenericCacheConfig` split: a handful of tunables with sane defaults,
//! assembled into the container on `build()`.

use std::marker::PhantomData;

use weak_store_common::{Comparator, DefaultComparator, Key, Value};

use crate::index::ShardedIndex;
use crate::listener::{DefaultReleaseListener, ReleaseListener};
use crate::multi::MultiKeyWeakStore;
use crate::table::WeakTable;

const DEFAULT_SHARDS: usize = 16;

/// Builds a [`MultiKeyWeakStore`].
pub struct MultiKeyWeakStoreBuilder<K, V, L = DefaultReleaseListener> {
    shards: usize,
    listener: L,
    _marker: PhantomData<fn() -> (K, V)>,
}

impl<K: Key, V: Value> Default for MultiKeyWeakStoreBuilder<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Key, V: Value> MultiKeyWeakStoreBuilder<K, V> {
    pub fn new() -> Self {
        Self {
            shards: DEFAULT_SHARDS,
            listener: DefaultReleaseListener,
            _marker: PhantomData,
        }
    }
}

impl<K: Key, V: Value, L: ReleaseListener<V>> MultiKeyWeakStoreBuilder<K, V, L> {
    /// Number of concurrent shards backing the index. Rounded up to a power
    /// of two. Defaults to 16.
    pub fn with_shards(mut self, shards: usize) -> Self {
        self.shards = shards;
        self
    }

    pub fn with_listener<L2: ReleaseListener<V>>(
        self,
        listener: L2,
    ) -> MultiKeyWeakStoreBuilder<K, V, L2> {
        MultiKeyWeakStoreBuilder {
            shards: self.shards,
            listener,
            _marker: PhantomData,
        }
    }

    pub fn build(self) -> MultiKeyWeakStore<K, V, L> {
        MultiKeyWeakStore::new(ShardedIndex::with_shards(self.shards), self.listener)
    }
}

/// Builds a [`WeakTable`].
pub struct WeakTableBuilder<K, V, C = DefaultComparator, L = DefaultReleaseListener> {
    shards: usize,
    comparator: C,
    listener: L,
    _marker: PhantomData<fn() -> (K, V)>,
}

impl<K: Key + std::hash::Hash + Eq, V: Value> Default
    for WeakTableBuilder<K, V, DefaultComparator>
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Key + std::hash::Hash + Eq, V: Value> WeakTableBuilder<K, V, DefaultComparator> {
    pub fn new() -> Self {
        Self {
            shards: DEFAULT_SHARDS,
            comparator: DefaultComparator::default(),
            listener: DefaultReleaseListener,
            _marker: PhantomData,
        }
    }
}

impl<K: Key, V: Value, C: Comparator<K>, L: ReleaseListener<V>> WeakTableBuilder<K, V, C, L> {
    pub fn with_shards(mut self, shards: usize) -> Self {
        self.shards = shards;
        self
    }

    /// Swaps in a non-default hash/equality strategy, e.g. case-insensitive
    /// string lookup (spec.md §8 scenario 5).
    pub fn with_comparator<C2: Comparator<K>>(self, comparator: C2) -> WeakTableBuilder<K, V, C2, L> {
        WeakTableBuilder {
            shards: self.shards,
            comparator,
            listener: self.listener,
            _marker: PhantomData,
        }
    }

    pub fn with_listener<L2: ReleaseListener<V>>(
        self,
        listener: L2,
    ) -> WeakTableBuilder<K, V, C, L2> {
        WeakTableBuilder {
            shards: self.shards,
            comparator: self.comparator,
            listener,
            _marker: PhantomData,
        }
    }

    pub fn build(self) -> WeakTable<K, V, C, L> {
        WeakTable::new(
            ShardedIndex::with_shards(self.shards),
            self.comparator,
            self.listener,
        )
    }
}
