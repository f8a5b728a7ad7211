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

use thiserror::Error;
use weak_store_common::Error as CommonError;

/// The error type for `get_or_try_create`: either one of the store's own
/// contract errors, or whatever error the caller's factory produced.
///
/// Kept distinct from [`weak_store_common::Error`] so a factory's error type
/// never needs a `From` impl into this crate (spec.md §7: "FactoryException
/// ... propagates to the caller of GetOrCreate unchanged").
#[derive(Debug, Error)]
pub enum GetOrCreateError<E> {
    #[error(transparent)]
    Store(#[from] CommonError),
    #[error("factory failed: {0}")]
    Factory(E),
}
