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

/// Bound for a type that can live behind a [`crate::WeakKey`].
///
/// Blanket-implemented so callers never spell it out themselves, mirroring
/// how cache crates bound their key/value type parameters.
pub trait Key: Send + Sync + 'static {}
impl<T: Send + Sync + 'static> Key for T {}

/// Bound for a value held by a store entry.
pub trait Value: Send + 'static {}
impl<T: Send + 'static> Value for T {}
