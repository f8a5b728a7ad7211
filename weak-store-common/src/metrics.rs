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

use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free operation counters for a store instance.
///
/// Mirrors the shape of a typical in-memory cache's metrics struct: plain
/// atomics, relaxed ordering, read with a snapshot method. No external
/// metrics exporter is wired up here (out of scope per spec.md §1); a
/// caller who wants to export these hooks `snapshot()` into whatever
/// reporting stack they already run.
#[derive(Debug, Default)]
pub struct Metrics {
    pub hit: AtomicU64,
    pub miss: AtomicU64,
    pub insert: AtomicU64,
    pub replace: AtomicU64,
    pub remove: AtomicU64,
    /// Entries disposed because a key died (notifier-driven, not an explicit Remove/Set).
    pub reclaim: AtomicU64,
    pub release: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub hit: u64,
    pub miss: u64,
    pub insert: u64,
    pub replace: u64,
    pub remove: u64,
    pub reclaim: u64,
    pub release: u64,
}

impl Metrics {
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            hit: self.hit.load(Ordering::Relaxed),
            miss: self.miss.load(Ordering::Relaxed),
            insert: self.insert.load(Ordering::Relaxed),
            replace: self.replace.load(Ordering::Relaxed),
            remove: self.remove.load(Ordering::Relaxed),
            reclaim: self.reclaim.load(Ordering::Relaxed),
            release: self.release.load(Ordering::Relaxed),
        }
    }
}
