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

//! Pluggable hash/equality for [`crate::weak_key::WeakKey`]-keyed tables.
//!
//! `WeakTable` delegates hashing and equality of the resolved key values to
//! a `Comparator`, so two distinct key instances that compare equal under a
//! user-supplied notion of equality (e.g. case-insensitive strings) address
//! the same entry.

use std::hash::{BuildHasher, Hash};

use ahash::RandomState;

/// Hashing and equality for a table's key type, decoupled from `K`'s own
/// `Hash`/`Eq` impls (if any).
pub trait Comparator<K: ?Sized>: Send + Sync + 'static {
    fn hash(&self, key: &K) -> u64;
    fn eq(&self, a: &K, b: &K) -> bool;
}

/// The comparator used when a table is not given a custom one: ordinary
/// `Hash`/`Eq` under a configurable `BuildHasher`.
#[derive(Debug, Clone, Default)]
pub struct DefaultComparator<S = RandomState> {
    hasher: S,
}

impl<S> DefaultComparator<S> {
    pub fn new(hasher: S) -> Self {
        Self { hasher }
    }
}

impl<K, S> Comparator<K> for DefaultComparator<S>
where
    K: Hash + Eq + ?Sized,
    S: BuildHasher + Send + Sync + 'static,
{
    fn hash(&self, key: &K) -> u64 {
        self.hasher.hash_one(key)
    }

    fn eq(&self, a: &K, b: &K) -> bool {
        a == b
    }
}
