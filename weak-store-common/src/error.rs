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

/// Errors raised synchronously by the store's own contract checks.
///
/// Factory failures are *not* represented here: `get_or_try_create` returns
/// the caller's own error type directly instead of folding it into this
/// enum, so a factory's errors never need a `From` impl into this crate.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// A [`crate::MultiKeyWeakStore`]-like construction was attempted with zero keys.
    #[error("multi-key store operations require at least one key")]
    EmptyKeys,
    /// `WeakTable::try_add` was called for a key that already has a live entry.
    #[error("key already present")]
    DuplicateKey,
}

pub type Result<T> = std::result::Result<T, Error>;
