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

//! The plugin contracts of the loading pipeline.
//!
//! A loader parser is one named plugin exposing any subset of three stages:
//!
//! - a [`LoadStage`] turning a URL into a raw value (fetch + decode),
//! - a [`ParseStage`] turning a raw value into a richer one,
//! - an [`UnloadStage`] releasing what a loaded value holds.
//!
//! The [`Loader`] asks each parser for its stages through the `as_*` accessors,
//! so a parser only implements the capabilities it actually has.

use super::Loader;
use async_trait::async_trait;
use kiln_core::asset::{AssetValue, ResolvedAsset};

/// Where a parser sits in the loader's registry.
///
/// Parsers are consulted from `High` to `Low`; within a tier, in registration
/// order. Format specific parsers register `High` so that they shadow the
/// generic ones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ParserPriority {
    /// Generic fallbacks.
    Low,
    /// The default tier.
    #[default]
    Normal,
    /// Format specific parsers.
    High,
}

/// Fetches and decodes a URL into a raw value.
#[async_trait]
pub trait LoadStage: Send + Sync {
    /// Should [`load`](LoadStage::load) handle this URL?
    fn test(&self, url: &str, asset: &ResolvedAsset, loader: &Loader) -> bool;

    /// Produces the raw value for `url`.
    async fn load(
        &self,
        url: &str,
        asset: &ResolvedAsset,
        loader: &Loader,
    ) -> anyhow::Result<AssetValue>;
}

/// Transforms an already loaded value.
///
/// Parse stages may load dependent assets through `loader`, which shares the
/// in-flight map of the load that invoked them.
#[async_trait]
pub trait ParseStage: Send + Sync {
    /// Should [`parse`](ParseStage::parse) transform this value?
    fn test_parse(&self, value: &AssetValue, asset: &ResolvedAsset, loader: &Loader) -> bool;

    /// Transforms `value`. Returning `None` keeps the value as it was.
    async fn parse(
        &self,
        value: AssetValue,
        asset: &ResolvedAsset,
        loader: &Loader,
    ) -> anyhow::Result<Option<AssetValue>>;
}

/// Releases the resources held by a loaded value.
#[async_trait]
pub trait UnloadStage: Send + Sync {
    /// Called once when the value owned by this parser is unloaded.
    async fn unload(
        &self,
        value: &AssetValue,
        asset: &ResolvedAsset,
        loader: &Loader,
    ) -> anyhow::Result<()>;
}

/// A plugin of the [`Loader`].
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use kiln_core::asset::{AssetValue, ResolvedAsset};
/// use kiln_lanes::asset_lane::{LoadStage, Loader, LoaderParser};
///
/// struct Echo;
///
/// #[async_trait]
/// impl LoadStage for Echo {
///     fn test(&self, url: &str, _: &ResolvedAsset, _: &Loader) -> bool {
///         url.starts_with("echo:")
///     }
///
///     async fn load(&self, url: &str, _: &ResolvedAsset, _: &Loader) -> anyhow::Result<AssetValue> {
///         Ok(AssetValue::new(url["echo:".len()..].to_string()))
///     }
/// }
///
/// impl LoaderParser for Echo {
///     fn name(&self) -> &str {
///         "echo"
///     }
///
///     fn as_loader(&self) -> Option<&dyn LoadStage> {
///         Some(self)
///     }
/// }
/// ```
pub trait LoaderParser: Send + Sync + 'static {
    /// A unique name. Descriptors select a parser by this name via `load_parser`.
    fn name(&self) -> &str;

    /// The registry tier of this parser.
    fn priority(&self) -> ParserPriority {
        ParserPriority::Normal
    }

    /// The load stage, if this parser can load.
    fn as_loader(&self) -> Option<&dyn LoadStage> {
        None
    }

    /// The parse stage, if this parser can transform loaded values.
    fn as_transformer(&self) -> Option<&dyn ParseStage> {
        None
    }

    /// The unload stage, if values owned by this parser need releasing.
    fn as_unloader(&self) -> Option<&dyn UnloadStage> {
        None
    }
}
