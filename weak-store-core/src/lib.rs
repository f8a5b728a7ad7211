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

//! The reclamation engine: the concurrent slot index, the dispose protocol,
//! and the two public containers built on top of it,
//! [`MultiKeyWeakStore`] and [`WeakTable`].

pub mod builder;
pub mod error;
pub(crate) mod index;
pub(crate) mod listener;
pub mod multi;
pub(crate) mod reclaim;
pub(crate) mod slot;
pub mod table;

pub use builder::{MultiKeyWeakStoreBuilder, WeakTableBuilder};
pub use error::GetOrCreateError;
pub use listener::{DefaultReleaseListener, ReleaseListener};
pub use multi::MultiKeyWeakStore;
pub use table::WeakTable;

pub mod prelude {
    pub use crate::builder::{MultiKeyWeakStoreBuilder, WeakTableBuilder};
    pub use crate::error::GetOrCreateError;
    pub use crate::listener::{DefaultReleaseListener, ReleaseListener};
    pub use crate::multi::MultiKeyWeakStore;
    pub use crate::table::WeakTable;
    pub use weak_store_common::{Comparator, DefaultComparator, Error, IdentityEq, Key, Value, WeakKey};
}
