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

//! End-to-end scenarios, one test per numbered scenario in spec.md §8.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};

use weak_store_common::comparator::Comparator;
use weak_store_common::WeakKey;
use weak_store_core::{MultiKeyWeakStoreBuilder, WeakTableBuilder};

struct CaseInsensitive;

impl Comparator<String> for CaseInsensitive {
    fn hash(&self, key: &String) -> u64 {
        use std::hash::{Hash, Hasher};
        let mut hasher = ahash::AHasher::default();
        key.to_ascii_lowercase().hash(&mut hasher);
        hasher.finish()
    }

    fn eq(&self, a: &String, b: &String) -> bool {
        a.eq_ignore_ascii_case(b)
    }
}

#[test_log::test]
fn scenario_1_single_key_lifetime() {
    let table = WeakTableBuilder::new().with_shards(4).build();
    let k = WeakKey::new("x".to_string());
    table.try_add(&k, "payload".to_string()).unwrap();
    assert_eq!(table.get(&"x".to_string()), Some("payload".to_string()));

    drop(k);

    assert_eq!(table.get(&"x".to_string()), None);
    assert!(table.iter().is_empty());
    assert_eq!(table.metrics().reclaim, 1);
}

#[test_log::test]
fn scenario_2_multi_key_and_semantics() {
    let store = MultiKeyWeakStoreBuilder::new().with_shards(4).build();
    let k1 = WeakKey::new("k1".to_string());
    let k2 = WeakKey::new("k2".to_string());
    let keys = [k1.clone(), k2.clone()];

    store.get_or_try_create(&keys, || Ok::<_, ()>("y".to_string())).unwrap();
    assert_eq!(store.get(&keys), Some("y".to_string()));

    drop(k1);

    // k2 alone stays reachable throughout (spec.md I6: the store never
    // extends a key's lifetime); only the entry referencing the dead k1 is
    // reclaimed.
    assert_eq!(store.get(&keys), None);
    assert_eq!(store.metrics().reclaim, 1);
    drop(k2);
}

#[test_log::test]
fn scenario_3_replace_does_not_release_same_value() {
    use std::sync::Mutex;

    let released: Arc<Mutex<Vec<u32>>> = Arc::new(Mutex::new(Vec::new()));

    struct Recorder(Arc<Mutex<Vec<u32>>>);
    impl weak_store_core::ReleaseListener<weak_store_common::ByValue<u32>> for Recorder {
        fn on_release(&self, value: weak_store_common::ByValue<u32>) {
            self.0.lock().unwrap().push(value.0);
        }
    }

    let table = WeakTableBuilder::new()
        .with_shards(4)
        .with_listener(Recorder(released.clone()))
        .build();

    let key = WeakKey::new("k".to_string());
    let v = weak_store_common::ByValue(1u32);
    table.set(&key, v).unwrap();
    table.set(&key, v).unwrap();
    assert!(released.lock().unwrap().is_empty(), "same value must not be released");

    let w = weak_store_common::ByValue(2u32);
    table.set(&key, w).unwrap();
    assert_eq!(*released.lock().unwrap(), vec![1]);
    assert_eq!(table.get(&"k".to_string()), Some(w));
}

#[test_log::test]
fn scenario_4_concurrent_get_or_create_runs_factory_once() {
    let table: weak_store_core::WeakTable<String, Arc<AtomicUsize>> =
        WeakTableBuilder::new().with_shards(8).build();
    let key = WeakKey::new("shared".to_string());
    let calls = Arc::new(AtomicUsize::new(0));

    const THREADS: usize = 64;
    let barrier = Arc::new(Barrier::new(THREADS));
    let mut handles = Vec::with_capacity(THREADS);

    for _ in 0..THREADS {
        let table = table.clone();
        let key = key.clone();
        let calls = calls.clone();
        let barrier = barrier.clone();
        handles.push(std::thread::spawn(move || {
            barrier.wait();
            table
                .get_or_try_create(&key, || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, ()>(Arc::new(AtomicUsize::new(99)))
                })
                .unwrap()
        }));
    }

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(calls.load(Ordering::SeqCst), 1, "factory must run exactly once");
    let first = &results[0];
    assert!(results.iter().all(|r| Arc::ptr_eq(r, first)), "all callers see the same value by identity");
}

#[test_log::test]
fn scenario_5_non_identity_lookup() {
    let table = WeakTableBuilder::new()
        .with_shards(4)
        .with_comparator(CaseInsensitive)
        .build();

    let key = WeakKey::new("Hello".to_string());
    table.try_add(&key, 1u32).unwrap();
    assert_eq!(table.get(&"HELLO".to_string()), Some(1));
    assert_eq!(table.get(&"hello".to_string()), Some(1));

    drop(key);
    assert_eq!(table.get(&"HELLO".to_string()), None);
}

#[test_log::test]
fn scenario_6_dispose_is_idempotent_under_race() {
    struct Recorder(Arc<AtomicUsize>);
    impl weak_store_core::ReleaseListener<u32> for Recorder {
        fn on_release(&self, _value: u32) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    let releases = Arc::new(AtomicUsize::new(0));
    let table = WeakTableBuilder::new()
        .with_shards(4)
        .with_listener(Recorder(releases.clone()))
        .build();

    let key = WeakKey::new("racer".to_string());
    table.try_add(&key, 1u32).unwrap();

    // An explicit `clear` and the key's own death race to dispose the same
    // slot; `Slot::begin_dispose`'s CAS latch must let exactly one of them
    // run the release step (spec.md I4).
    let barrier = Arc::new(Barrier::new(2));
    let table_clone = table.clone();
    let barrier_clone = barrier.clone();
    let clearer = std::thread::spawn(move || {
        barrier_clone.wait();
        table_clone.clear();
    });
    barrier.wait();
    drop(key);
    clearer.join().unwrap();

    assert_eq!(releases.load(Ordering::SeqCst), 1, "release must run exactly once under the race");
}
