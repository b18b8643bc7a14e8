// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use super::{Asset, AssetHandle};
use std::{any::Any, fmt, sync::Arc};

/// A type-erased, shareable reference to a loaded asset.
///
/// Parsers in the loading pipeline produce values of many different types
/// (decoded textures, JSON documents, spritesheets...), and the cache stores
/// them side by side. `AssetValue` is the common currency between those stages.
///
/// Identity matters: two values are "the same asset" only if [`AssetValue::ptr_eq`]
/// holds. The loader guarantees that every caller requesting the same URL
/// receives clones of one single value.
#[derive(Clone)]
pub struct AssetValue {
    inner: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl AssetValue {
    /// Wraps a freshly created asset.
    pub fn new<T: Asset>(asset: T) -> Self {
        Self::from(AssetHandle::new(asset))
    }

    /// Returns `true` if the wrapped asset is of type `T`.
    pub fn is<T: Asset>(&self) -> bool {
        self.inner.is::<T>()
    }

    /// Borrows the wrapped asset as a `T`, if it is one.
    pub fn downcast_ref<T: Asset>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// Returns a typed handle sharing the same allocation, if the asset is a `T`.
    pub fn downcast<T: Asset>(&self) -> Option<AssetHandle<T>> {
        self.inner
            .clone()
            .downcast::<T>()
            .ok()
            .map(AssetHandle::from_arc)
    }

    /// The Rust type name of the wrapped asset, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns `true` if both values point at the same allocation.
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        Arc::ptr_eq(&this.inner, &other.inner)
    }
}

impl<T: Asset> From<AssetHandle<T>> for AssetValue {
    fn from(handle: AssetHandle<T>) -> Self {
        let inner: Arc<dyn Any + Send + Sync> = handle.into_arc();
        Self {
            inner,
            type_name: std::any::type_name::<T>(),
        }
    }
}

impl fmt::Debug for AssetValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetValue")
            .field("type", &self.type_name)
            .finish_non_exhaustive()
    }
}
