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

use crate::{path, shape};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Property holding the pixel density a source was authored for (`@2x` → `2`).
pub const RESOLUTION_PROPERTY: &str = "resolution";

/// A concrete source for a logical asset, as produced by the resolver.
///
/// This is the unit exchanged between the resolver and the loader. Beyond the
/// fixed fields, a descriptor carries free-form `properties` (e.g. `resolution`)
/// which act as extra dimensions for [`PreferOrder`](super::PreferOrder) matching.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolvedAsset {
    /// Absolute or relative locator of the source.
    pub src: String,

    /// Every key that resolves to this same asset.
    #[serde(
        alias = "name",
        deserialize_with = "shape::one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub alias: Vec<String>,

    /// Format tag of the source, usually its file extension.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    /// Name of the loader parser that must handle this source, bypassing `test`.
    #[serde(
        rename = "loadParser",
        alias = "load_parser",
        skip_serializing_if = "Option::is_none"
    )]
    pub load_parser: Option<String>,

    /// Opaque per-asset metadata forwarded verbatim to the parsers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    /// Additional preference dimensions such as `resolution`.
    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

impl ResolvedAsset {
    /// Creates a bare descriptor for `src`.
    pub fn new(src: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            ..Default::default()
        }
    }

    /// Sets the aliases of this descriptor.
    pub fn with_alias<I, S>(mut self, alias: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.alias = alias.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the format tag.
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Sets the opaque parser data.
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Forces the loader parser with the given name.
    pub fn with_load_parser(mut self, name: impl Into<String>) -> Self {
        self.load_parser = Some(name.into());
        self
    }

    /// Sets an additional preference dimension.
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    /// Looks up the value of a preference dimension.
    ///
    /// `format` and `src` map onto the fixed fields; every other name is read
    /// from `properties`.
    pub fn dimension(&self, name: &str) -> Option<Value> {
        match name {
            "format" => self.format.clone().map(Value::String),
            "src" => Some(Value::String(self.src.clone())),
            _ => self.properties.get(name).cloned(),
        }
    }

    /// The authored pixel density, when known.
    pub fn resolution(&self) -> Option<f64> {
        self.properties
            .get(RESOLUTION_PROPERTY)
            .and_then(Value::as_f64)
    }

    /// The extension of `src`, ignoring query string and fragment.
    pub fn extension(&self) -> Option<String> {
        path::url_extension(&self.src)
    }

    /// Reads a boolean flag from `data`, defaulting to `false`.
    pub fn data_flag(&self, name: &str) -> bool {
        self.data
            .as_ref()
            .and_then(|data| data.get(name))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

/// One source declaration handed to the resolver: either a bare URL, or a
/// partially filled descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AssetSrc {
    /// A plain URL, possibly with `{a,b}` variations.
    Url(String),
    /// A descriptor whose explicit fields take precedence over inferred ones.
    Descriptor(ResolvedAsset),
}

impl From<&str> for AssetSrc {
    fn from(url: &str) -> Self {
        Self::Url(url.to_string())
    }
}

impl From<String> for AssetSrc {
    fn from(url: String) -> Self {
        Self::Url(url)
    }
}

impl From<ResolvedAsset> for AssetSrc {
    fn from(asset: ResolvedAsset) -> Self {
        Self::Descriptor(asset)
    }
}

/// An ordered list of candidate sources for one logical asset.
///
/// Deserializes from either a single source or a list of sources.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "shape::OneOrList<AssetSrc>", into = "Vec<AssetSrc>")]
pub struct AssetSrcs(pub Vec<AssetSrc>);

impl AssetSrcs {
    /// Iterates the declared sources.
    pub fn iter(&self) -> std::slice::Iter<'_, AssetSrc> {
        self.0.iter()
    }

    /// Returns `true` if no source has been declared.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// A printable name for diagnostics: the first URL or descriptor src.
    pub fn describe(&self) -> String {
        match self.0.first() {
            Some(AssetSrc::Url(url)) => url.clone(),
            Some(AssetSrc::Descriptor(asset)) => asset.src.clone(),
            None => String::new(),
        }
    }
}

impl From<shape::OneOrList<AssetSrc>> for AssetSrcs {
    fn from(value: shape::OneOrList<AssetSrc>) -> Self {
        Self(value.into_vec())
    }
}

impl From<AssetSrcs> for Vec<AssetSrc> {
    fn from(value: AssetSrcs) -> Self {
        value.0
    }
}

impl IntoIterator for AssetSrcs {
    type Item = AssetSrc;
    type IntoIter = std::vec::IntoIter<AssetSrc>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl From<&str> for AssetSrcs {
    fn from(url: &str) -> Self {
        Self(vec![url.into()])
    }
}

impl From<String> for AssetSrcs {
    fn from(url: String) -> Self {
        Self(vec![url.into()])
    }
}

impl From<ResolvedAsset> for AssetSrcs {
    fn from(asset: ResolvedAsset) -> Self {
        Self(vec![asset.into()])
    }
}

impl From<AssetSrc> for AssetSrcs {
    fn from(src: AssetSrc) -> Self {
        Self(vec![src])
    }
}

impl<T: Into<AssetSrc>> From<Vec<T>> for AssetSrcs {
    fn from(srcs: Vec<T>) -> Self {
        Self(srcs.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<AssetSrc>, const N: usize> From<[T; N]> for AssetSrcs {
    fn from(srcs: [T; N]) -> Self {
        Self(srcs.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn dimension_reads_fixed_fields_and_properties() {
        let asset = ResolvedAsset::new("hero@2x.png")
            .with_format("png")
            .with_property(RESOLUTION_PROPERTY, 2.0);

        assert_eq!(asset.dimension("format"), Some(json!("png")));
        assert_eq!(asset.dimension("resolution"), Some(json!(2.0)));
        assert_eq!(asset.dimension("quality"), None);
        assert_eq!(asset.resolution(), Some(2.0));
        assert_eq!(asset.extension().as_deref(), Some("png"));
    }

    #[test]
    fn descriptor_deserializes_extra_dimensions() {
        let asset: ResolvedAsset = serde_json::from_value(json!({
            "src": "bg.webp",
            "alias": "background",
            "loadParser": "texture",
            "resolution": 0.5,
        }))
        .expect("valid descriptor");

        assert_eq!(asset.alias, vec!["background".to_string()]);
        assert_eq!(asset.load_parser.as_deref(), Some("texture"));
        assert_eq!(asset.resolution(), Some(0.5));
        assert!(asset.format.is_none());
    }

    #[test]
    fn srcs_accept_single_or_list() {
        let one: AssetSrcs = serde_json::from_value(json!("a.png")).expect("single");
        assert_eq!(one.0, vec![AssetSrc::Url("a.png".into())]);

        let many: AssetSrcs =
            serde_json::from_value(json!(["a.png", { "src": "a.webp", "format": "webp" }]))
                .expect("list");
        assert_eq!(many.0.len(), 2);
        assert!(matches!(&many.0[1], AssetSrc::Descriptor(asset) if asset.src == "a.webp"));
    }

    #[test]
    fn data_flag_defaults_to_false() {
        let asset = ResolvedAsset::new("sheet.json").with_data(json!({ "ignoreMultiPack": true }));
        assert!(asset.data_flag("ignoreMultiPack"));
        assert!(!ResolvedAsset::new("x").data_flag("ignoreMultiPack"));
    }
}
