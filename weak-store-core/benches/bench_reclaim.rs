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

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use weak_store_core::{MultiKeyWeakStoreBuilder, WeakTableBuilder};
use weak_store_common::WeakKey;

fn multi_key_get_hit(c: &mut Criterion) {
    let store = MultiKeyWeakStoreBuilder::new().with_shards(64).build();
    let a = WeakKey::new(1u64);
    let b = WeakKey::new(2u64);
    store
        .get_or_try_create(&[a.clone(), b.clone()], || Ok::<_, std::convert::Infallible>(7u32))
        .unwrap();

    c.bench_function("multi_key_get_hit", |bencher| {
        bencher.iter(|| store.get(&[a.clone(), b.clone()]));
    });
}

fn multi_key_insert_and_reclaim(c: &mut Criterion) {
    let store = MultiKeyWeakStoreBuilder::new().with_shards(64).build();

    c.bench_function("multi_key_insert_and_reclaim", |bencher| {
        bencher.iter_batched(
            || (WeakKey::new(1u64), WeakKey::new(2u64)),
            |(a, b)| {
                store
                    .get_or_try_create(&[a.clone(), b.clone()], || Ok::<_, std::convert::Infallible>(7u32))
                    .unwrap();
                drop(a);
                drop(b);
            },
            BatchSize::SmallInput,
        );
    });
}

fn weak_table_get_hit(c: &mut Criterion) {
    let table = WeakTableBuilder::new().with_shards(64).build();
    let key = WeakKey::new("hot-key".to_string());
    table.get_or_try_create(&key, || Ok::<_, std::convert::Infallible>(7u32)).unwrap();

    c.bench_function("weak_table_get_hit", |bencher| {
        bencher.iter(|| table.get(&"hot-key".to_string()));
    });
}

criterion_group!(benches, multi_key_get_hit, multi_key_insert_and_reclaim, weak_table_get_hit);
criterion_main!(benches);
