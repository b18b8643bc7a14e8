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

//! Configuration accepted by [`AssetAgent::init`](super::AssetAgent::init).

use indexmap::IndexMap;
use kiln_core::manifest::AssetsManifest;
use kiln_lanes::asset_lane::BundleIdentifier;
use serde::{Deserialize, Serialize};

/// Texture candidates preferred when a key has several.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TexturePreference {
    /// Densities, most preferred first.
    pub resolution: Vec<f64>,
    /// Formats (file extensions), most preferred first.
    pub format: Vec<String>,
}

impl Default for TexturePreference {
    fn default() -> Self {
        Self {
            resolution: vec![1.0],
            format: ["avif", "webp", "png", "jpg", "jpeg"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

/// Options of [`AssetAgent::init`](super::AssetAgent::init).
///
/// Every field is optional, so the options can be deserialized from partial
/// JSON documents:
///
/// ```json
/// { "base_path": "assets/", "texture_preference": { "resolution": [2, 1] } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetInitOptions {
    /// Prefix of every relative source.
    pub base_path: Option<String>,
    /// Prefix of every `/`-rooted source.
    pub root_path: Option<String>,
    /// Bundles to register.
    pub manifest: Option<AssetsManifest>,
    /// Texture densities and formats to prefer.
    pub texture_preference: Option<TexturePreference>,
    /// How bundle member keys are namespaced.
    pub bundle_identifier: Option<BundleIdentifier>,
    /// Query parameters appended to every resolved source.
    pub default_search_params: Option<IndexMap<String, String>>,
    /// Use the preferred formats as given instead of probing for support.
    pub skip_detections: bool,
    /// How many assets the background loader requests at once.
    pub background_concurrency: usize,
}

impl Default for AssetInitOptions {
    fn default() -> Self {
        Self {
            base_path: None,
            root_path: None,
            manifest: None,
            texture_preference: None,
            bundle_identifier: None,
            default_search_params: None,
            skip_detections: false,
            background_concurrency: 1,
        }
    }
}

impl AssetInitOptions {
    /// Parses options from a JSON document.
    pub fn from_json(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }
}
