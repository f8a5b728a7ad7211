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

//! Shared building blocks for `weak-store`: the `Key`/`Value` bounds, the
//! `Arc`-backed weak reachability primitive, pluggable key comparison,
//! identity comparison for values, errors and metrics. Nothing here knows
//! about entries, slots or the concurrent index; those live in
//! `weak-store-core`.

pub mod code;
pub mod comparator;
pub mod error;
pub mod identity;
pub mod metrics;
pub mod reentrancy;
pub mod weak_key;

pub use code::{Key, Value};
pub use comparator::{Comparator, DefaultComparator};
pub use error::{Error, Result};
pub use identity::{ByValue, IdentityEq};
pub use metrics::{Metrics, MetricsSnapshot};
pub use weak_key::{Notifier, WeakKey, WeakKeyHandle};
