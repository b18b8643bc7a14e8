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

//! Input and output shapes shared by every public entry point.
//!
//! Asking for one key yields one value; asking for a list of keys yields a
//! map keyed by those keys, in request order. [`Keys`] captures the shape of
//! the request and [`OneOrMany`] mirrors it in the response.

use crate::asset::ResolvedAsset;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;

/// One key, or an ordered list of keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Keys {
    /// A single key; the response is a bare value.
    One(String),
    /// A list of keys; the response is keyed by them.
    Many(Vec<String>),
}

impl Keys {
    /// The keys as a slice, regardless of shape.
    pub fn as_slice(&self) -> &[String] {
        match self {
            Self::One(key) => std::slice::from_ref(key),
            Self::Many(keys) => keys,
        }
    }

    /// Iterates the keys.
    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.as_slice().iter()
    }

    /// Returns `true` for the list shape.
    pub fn is_many(&self) -> bool {
        matches!(self, Self::Many(_))
    }

    /// Consumes the keys into a list.
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Self::One(key) => vec![key],
            Self::Many(keys) => keys,
        }
    }

    /// Shapes `values` like these keys.
    ///
    /// The single shape takes the entry of its key, or `T::default()` when
    /// `values` has none. The list shape keeps `values` as they are.
    pub fn mirror<T: Default>(&self, mut values: IndexMap<String, T>) -> OneOrMany<T> {
        match self {
            Self::One(key) => OneOrMany::One(values.shift_remove(key).unwrap_or_default()),
            Self::Many(_) => OneOrMany::Many(values),
        }
    }
}

impl From<&str> for Keys {
    fn from(key: &str) -> Self {
        Self::One(key.to_string())
    }
}

impl From<String> for Keys {
    fn from(key: String) -> Self {
        Self::One(key)
    }
}

impl From<&String> for Keys {
    fn from(key: &String) -> Self {
        Self::One(key.clone())
    }
}

impl From<Vec<String>> for Keys {
    fn from(keys: Vec<String>) -> Self {
        Self::Many(keys)
    }
}

impl From<Vec<&str>> for Keys {
    fn from(keys: Vec<&str>) -> Self {
        Self::Many(keys.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for Keys {
    fn from(keys: &[&str]) -> Self {
        Self::Many(keys.iter().map(|key| key.to_string()).collect())
    }
}

impl From<&[String]> for Keys {
    fn from(keys: &[String]) -> Self {
        Self::Many(keys.to_vec())
    }
}

impl<const N: usize> From<[&str; N]> for Keys {
    fn from(keys: [&str; N]) -> Self {
        Self::Many(keys.iter().map(|key| key.to_string()).collect())
    }
}

/// A single value, or values keyed by the requested keys.
#[derive(Debug, Clone, PartialEq)]
pub enum OneOrMany<T> {
    /// Response to a single-key request.
    One(T),
    /// Response to a list request, in request order.
    Many(IndexMap<String, T>),
}

impl<T> OneOrMany<T> {
    /// The single value, if this is a single response.
    pub fn one(self) -> Option<T> {
        match self {
            Self::One(value) => Some(value),
            Self::Many(_) => None,
        }
    }

    /// The keyed values, if this is a list response.
    pub fn many(self) -> Option<IndexMap<String, T>> {
        match self {
            Self::One(_) => None,
            Self::Many(values) => Some(values),
        }
    }

    /// Looks up a key of a list response.
    pub fn get(&self, key: &str) -> Option<&T> {
        match self {
            Self::One(_) => None,
            Self::Many(values) => values.get(key),
        }
    }

    /// Transforms every value, keeping the shape.
    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> OneOrMany<U> {
        match self {
            Self::One(value) => OneOrMany::One(f(value)),
            Self::Many(values) => {
                OneOrMany::Many(values.into_iter().map(|(k, v)| (k, f(v))).collect())
            }
        }
    }

    /// Number of values carried.
    pub fn len(&self) -> usize {
        match self {
            Self::One(_) => 1,
            Self::Many(values) => values.len(),
        }
    }

    /// Returns `true` for an empty list response.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// What the loader should load: one descriptor or a list of them.
///
/// Bare strings are shorthand for descriptors with only `src` set.
#[derive(Debug, Clone, PartialEq)]
pub enum AssetRequest {
    /// One asset; the loader answers with a bare value.
    One(ResolvedAsset),
    /// Several assets; the loader answers keyed by `src`.
    Many(Vec<ResolvedAsset>),
}

impl AssetRequest {
    /// Returns `true` for the list shape.
    pub fn is_many(&self) -> bool {
        matches!(self, Self::Many(_))
    }

    /// Consumes the request into a list of descriptors.
    pub fn into_vec(self) -> Vec<ResolvedAsset> {
        match self {
            Self::One(asset) => vec![asset],
            Self::Many(assets) => assets,
        }
    }
}

impl From<&str> for AssetRequest {
    fn from(src: &str) -> Self {
        Self::One(ResolvedAsset::new(src))
    }
}

impl From<String> for AssetRequest {
    fn from(src: String) -> Self {
        Self::One(ResolvedAsset::new(src))
    }
}

impl From<ResolvedAsset> for AssetRequest {
    fn from(asset: ResolvedAsset) -> Self {
        Self::One(asset)
    }
}

impl From<Arc<ResolvedAsset>> for AssetRequest {
    fn from(asset: Arc<ResolvedAsset>) -> Self {
        Self::One((*asset).clone())
    }
}

impl From<Vec<ResolvedAsset>> for AssetRequest {
    fn from(assets: Vec<ResolvedAsset>) -> Self {
        Self::Many(assets)
    }
}

impl From<Vec<Arc<ResolvedAsset>>> for AssetRequest {
    fn from(assets: Vec<Arc<ResolvedAsset>>) -> Self {
        Self::Many(assets.iter().map(|asset| (**asset).clone()).collect())
    }
}

impl From<Vec<&str>> for AssetRequest {
    fn from(srcs: Vec<&str>) -> Self {
        Self::Many(srcs.into_iter().map(ResolvedAsset::new).collect())
    }
}

impl From<Vec<String>> for AssetRequest {
    fn from(srcs: Vec<String>) -> Self {
        Self::Many(srcs.into_iter().map(ResolvedAsset::new).collect())
    }
}

impl<const N: usize> From<[&str; N]> for AssetRequest {
    fn from(srcs: [&str; N]) -> Self {
        Self::Many(srcs.into_iter().map(ResolvedAsset::new).collect())
    }
}

/// Serde helper accepting either a single item or a list.
#[doc(hidden)]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrList<T> {
    /// A single item.
    One(T),
    /// A list of items.
    List(Vec<T>),
}

impl<T> OneOrList<T> {
    /// Flattens into a list.
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::One(item) => vec![item],
            Self::List(items) => items,
        }
    }
}

pub(crate) fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    OneOrList::<String>::deserialize(deserializer).map(OneOrList::into_vec)
}
