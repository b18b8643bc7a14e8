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

//! Provides the foundational traits and primitive types for Kiln's asset system.
//!
//! This module defines the "common language" for all asset-related operations.
//! It contains the core contracts that other crates will implement or use,
//! but it has no knowledge of how assets are resolved, loaded, or stored.
//!
//! The key components are:
//! - The [`Asset`] trait: A marker for all types that can be treated as assets.
//! - [`AssetHandle`] and [`AssetValue`]: typed and type-erased shared references
//!   to loaded assets.
//! - [`ResolvedAsset`]: the concrete source descriptor produced by the resolver
//!   and consumed by the loader.
//! - [`PreferOrder`]: the multi-dimensional rule used to pick one candidate
//!   among several equivalent sources.
//! - [`Texture`] and [`Spritesheet`]: the runtime assets produced by the
//!   built-in parsers.

mod descriptor;
mod handle;
mod prefer;
mod spritesheet;
mod texture;
mod value;

pub use descriptor::*;
pub use handle::*;
pub use prefer::*;
pub use spritesheet::*;
pub use texture::*;
pub use value::*;

/// A marker trait for types that can be managed by the asset system.
///
/// This trait's primary purpose is to categorize a type, making it eligible for
/// use within the engine's asset infrastructure (e.g., in an `AssetHandle<T>`
/// or a type-erased [`AssetValue`]).
///
/// The supertraits enforce critical safety guarantees:
/// - `Send` + `Sync`: The asset type can be safely shared and sent between threads.
///   This is essential for concurrent and background loading.
/// - `'static`: The asset type does not contain any non-static references, ensuring
///   it can be stored in the cache for the lifetime of the application.
///
/// # Examples
///
/// ```
/// use kiln_core::asset::{Asset, AssetValue};
///
/// struct FontFace {
///     family: String,
/// }
///
/// impl Asset for FontFace {}
///
/// let value = AssetValue::new(FontFace { family: "Mono".into() });
/// assert!(value.is::<FontFace>());
/// ```
pub trait Asset: Send + Sync + 'static {}

impl Asset for String {}
impl Asset for Vec<u8> {}
impl Asset for serde_json::Value {}
