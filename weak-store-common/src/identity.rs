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

//! Identity comparison for stored values.
//!
//! `Set(K*, V)` must not invoke the release hook when the caller reinstalls
//! the exact same value it just installed (spec-level requirement: "avoids
//! spurious Release when the caller reinstalls the same object"). Rust has
//! no object identity for arbitrary owned values, so this is opt-in via a
//! small trait rather than assumed.

use std::sync::Arc;

/// Same-identity comparison for a value stored in a weak-keyed entry.
///
/// Implemented for `Arc<T>` by pointer identity, which is the common case
/// (the caller holds the same `Arc` it handed the store earlier). Types
/// without a natural notion of identity can opt into value-equality
/// semantics with the [`ByValue`] wrapper instead of implementing this
/// directly.
pub trait IdentityEq {
    fn same_identity(&self, other: &Self) -> bool;
}

impl<T> IdentityEq for Arc<T> {
    fn same_identity(&self, other: &Self) -> bool {
        Arc::ptr_eq(self, other)
    }
}

/// Wraps a `PartialEq` value so it can be used where [`IdentityEq`] is
/// required, treating "same value" as "same identity".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ByValue<T>(pub T);

impl<T: PartialEq> IdentityEq for ByValue<T> {
    fn same_identity(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}
