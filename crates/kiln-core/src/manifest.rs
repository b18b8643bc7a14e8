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

//! Serializable description of asset bundles.
//!
//! A manifest groups logical assets into named bundles which can be resolved,
//! loaded, and unloaded together:
//!
//! ```json
//! { "bundles": [ { "name": "ui", "assets": [ { "name": "button", "srcs": "button.png" } ] } ] }
//! ```

use crate::{
    asset::{AssetSrcs, ResolvedAsset},
    shape,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The root of a manifest document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetsManifest {
    /// Bundles in declaration order.
    #[serde(default)]
    pub bundles: Vec<BundleDefinition>,
}

impl AssetsManifest {
    /// Parses a manifest from JSON bytes.
    pub fn from_json(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }

    /// Looks up a bundle by name.
    pub fn bundle(&self, name: &str) -> Option<&BundleDefinition> {
        self.bundles.iter().find(|bundle| bundle.name == name)
    }
}

/// A named, ordered group of asset declarations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleDefinition {
    /// Bundle id.
    pub name: String,
    /// Member assets.
    #[serde(default)]
    pub assets: Vec<UnresolvedAsset>,
}

/// A logical asset as declared by the developer, before resolution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnresolvedAsset {
    /// Keys the asset is addressed by.
    #[serde(alias = "alias", deserialize_with = "shape::one_or_many")]
    pub name: Vec<String>,

    /// Candidate sources, in declaration order.
    #[serde(alias = "src")]
    pub srcs: AssetSrcs,

    /// Parser data applied to every candidate that does not carry its own.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    /// Explicit format applied to every candidate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    /// Loader parser forced for every candidate.
    #[serde(
        default,
        rename = "loadParser",
        alias = "load_parser",
        skip_serializing_if = "Option::is_none"
    )]
    pub load_parser: Option<String>,
}

impl UnresolvedAsset {
    /// Declares an asset addressed by `keys` with the given sources.
    pub fn new(keys: impl Into<crate::Keys>, srcs: impl Into<AssetSrcs>) -> Self {
        Self {
            name: keys.into().into_vec(),
            srcs: srcs.into(),
            ..Default::default()
        }
    }

    /// Attaches parser data.
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

impl From<ResolvedAsset> for UnresolvedAsset {
    fn from(asset: ResolvedAsset) -> Self {
        Self {
            name: asset.alias.clone(),
            data: asset.data.clone(),
            format: asset.format.clone(),
            load_parser: asset.load_parser.clone(),
            srcs: asset.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::AssetSrc;

    #[test]
    fn parses_manifest_shapes() {
        let manifest = AssetsManifest::from_json(
            br#"{
                "bundles": [
                    {
                        "name": "load-screen",
                        "assets": [
                            { "name": "background", "srcs": "sunset.png" },
                            { "name": ["bar", "progress"], "srcs": ["bar.webp", "bar.png"] },
                            { "alias": "font", "src": { "src": "ui.woff2", "format": "woff2" } }
                        ]
                    },
                    { "name": "empty" }
                ]
            }"#,
        )
        .expect("valid manifest");

        assert_eq!(manifest.bundles.len(), 2);
        let bundle = manifest.bundle("load-screen").expect("bundle exists");
        assert_eq!(bundle.assets[0].name, vec!["background"]);
        assert_eq!(bundle.assets[1].name, vec!["bar", "progress"]);
        assert_eq!(bundle.assets[1].srcs.0.len(), 2);
        assert!(matches!(
            &bundle.assets[2].srcs.0[0],
            AssetSrc::Descriptor(asset) if asset.format.as_deref() == Some("woff2")
        ));
        assert!(manifest.bundle("empty").is_some_and(|b| b.assets.is_empty()));
    }
}
