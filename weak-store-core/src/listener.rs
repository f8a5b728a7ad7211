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

//! The overridable Release hook (spec.md §4.4, §7 ReleaseException).

use std::panic::{catch_unwind, AssertUnwindSafe};

/// Called exactly once per evicted value (spec.md I4), from whatever thread
/// discovered the eviction: an explicit `Remove`/`Set`, or a key's `Drop`.
pub trait ReleaseListener<V>: Send + Sync + 'static {
    #[allow(unused_variables)]
    fn on_release(&self, value: V) {}
}

/// The default, no-op listener.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultReleaseListener;

impl<V> ReleaseListener<V> for DefaultReleaseListener {}

/// Invokes `listener.on_release(value)`, isolating a panicking listener so
/// it cannot abort a second pending slot's disposal (spec.md §7:
/// ReleaseException "implementations must isolate the exception").
pub(crate) fn release<V, L: ReleaseListener<V>>(listener: &L, value: V) {
    if catch_unwind(AssertUnwindSafe(|| listener.on_release(value))).is_err() {
        tracing::error!("release listener panicked; entry is still reclaimed");
    }
}
