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

//! Debug-only detection of the one reentrancy rule spec.md §5 actually
//! forbids: a `GetOrCreate`/`get_or_try_create` factory calling back into
//! the store that is in the middle of invoking it. The factory runs with a
//! shard lock held (§5: "factory ... runs under that guard"), so a reentrant
//! call on the same shard would deadlock rather than panic, so this catches
//! the mistake with a clear message instead, but only when the
//! `strict_assertions` feature is enabled, matching how the teacher gates
//! its own extra debug-only checks behind a feature rather than paying for
//! them in release builds.

use std::cell::Cell;

thread_local! {
    static IN_FACTORY: Cell<bool> = const { Cell::new(false) };
}

struct ResetOnDrop;

impl Drop for ResetOnDrop {
    fn drop(&mut self) {
        IN_FACTORY.with(|flag| flag.set(false));
    }
}

/// Runs `f`, panicking first if this thread is already inside another
/// `guard_factory` call, i.e. a factory tried to reenter the store.
/// No-op wrapper when `strict_assertions` is off.
#[cfg(feature = "strict_assertions")]
pub fn guard_factory<R>(f: impl FnOnce() -> R) -> R {
    IN_FACTORY.with(|flag| {
        assert!(
            !flag.get(),
            "weak-store: factory called back into the store reentrantly (spec.md §5 forbids this)"
        );
        flag.set(true);
    });
    let _reset = ResetOnDrop;
    f()
}

#[cfg(not(feature = "strict_assertions"))]
pub fn guard_factory<R>(f: impl FnOnce() -> R) -> R {
    f()
}

#[cfg(all(test, feature = "strict_assertions"))]
mod tests {
    use super::*;

    #[test]
    fn nested_call_on_same_thread_panics() {
        let result = std::panic::catch_unwind(|| {
            guard_factory(|| {
                guard_factory(|| 1);
            });
        });
        assert!(result.is_err());
    }

    #[test]
    fn sequential_calls_are_fine() {
        guard_factory(|| 1);
        guard_factory(|| 2);
    }

    #[test]
    fn flag_resets_after_panic() {
        let _ = std::panic::catch_unwind(|| {
            guard_factory(|| {
                panic!("boom");
            });
        });
        guard_factory(|| 1);
    }
}
