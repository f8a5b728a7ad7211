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

//! `weak-store`: a multi-key weak associative store and weak table.
//!
//! ```
//! use weak_store::prelude::*;
//!
//! let store: MultiKeyWeakStore<String, u32> = MultiKeyWeakStoreBuilder::new().build();
//! let a = WeakKey::new("alice".to_string());
//! let b = WeakKey::new("bob".to_string());
//!
//! let value = store
//!     .get_or_try_create(&[a.clone(), b.clone()], || Ok::<_, std::convert::Infallible>(42))
//!     .unwrap();
//! assert_eq!(value, 42);
//! assert_eq!(store.get(&[a.clone(), b.clone()]), Some(42));
//!
//! // Dropping either key reclaims the entry, with no polling involved.
//! drop(a);
//! drop(b);
//! assert_eq!(store.metrics().reclaim, 1);
//! ```
//!
//! This crate is a thin re-export of `weak-store-core`, mirroring how
//! larger cache crates split their reclamation engine from the facade a
//! caller actually depends on.

pub use weak_store_core::*;

pub mod prelude {
    pub use weak_store_core::prelude::*;
}
