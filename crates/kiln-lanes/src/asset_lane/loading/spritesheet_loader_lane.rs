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

use crate::asset_lane::{Loader, LoaderParser, ParseStage, UnloadStage};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use kiln_core::{
    asset::{AssetHandle, AssetValue, ResolvedAsset, Spritesheet, SpritesheetData, Texture},
    path, AssetRequest,
};
use serde::Deserialize;
use serde_json::{json, Value};

/// Descriptor flag set on the sibling documents of a multi-pack sheet.
pub const IGNORE_MULTI_PACK: &str = "ignoreMultiPack";

/// Turns spritesheet documents into [`Spritesheet`]s.
///
/// A parse-only lane: the JSON lane loads the document, then this lane loads
/// the backing image (relative to the document, with the document's query
/// string) and cuts it into frames. Documents listing
/// `meta.related_multi_packs` also load those siblings as linked sheets.
///
/// The descriptor's `data` may carry:
/// - `imageFilename`: overrides `meta.image`;
/// - `textureOptions`: forwarded as `data` of the image load;
/// - `ignoreMultiPack`: skips the related documents.
#[derive(Debug, Default, Clone, Copy)]
pub struct SpritesheetLoaderLane;

impl SpritesheetLoaderLane {
    /// The name this parser registers under.
    pub const NAME: &'static str = "spritesheetLoader";
}

fn data_field<'a>(asset: &'a ResolvedAsset, name: &str) -> Option<&'a Value> {
    asset.data.as_ref().and_then(|data| data.get(name))
}

fn base_path(src: &str) -> String {
    let mut base = path::dirname(src);
    if !base.ends_with('/') {
        base.push('/');
    }
    base
}

#[async_trait]
impl ParseStage for SpritesheetLoaderLane {
    fn test_parse(&self, value: &AssetValue, asset: &ResolvedAsset, _loader: &Loader) -> bool {
        let is_json_source = asset
            .extension()
            .is_some_and(|extension| extension.eq_ignore_ascii_case("json"))
            || path::data_url_mime(&asset.src) == Some("application/json");

        is_json_source
            && value
                .downcast_ref::<Value>()
                .is_some_and(|document| document.get("frames").is_some_and(Value::is_object))
    }

    async fn parse(
        &self,
        value: AssetValue,
        asset: &ResolvedAsset,
        loader: &Loader,
    ) -> Result<Option<AssetValue>> {
        let document = value
            .downcast_ref::<Value>()
            .ok_or_else(|| anyhow!("Spritesheet source is not a JSON document"))?;
        let data = SpritesheetData::deserialize(document).context("Invalid spritesheet document")?;

        let base = base_path(&asset.src);
        let texture_options = data_field(asset, "textureOptions").cloned();

        let image_name = data_field(asset, "imageFilename")
            .and_then(Value::as_str)
            .unwrap_or(data.meta.image.as_str());
        let image_source = path::copy_search_params(&format!("{base}{image_name}"), &asset.src);

        let mut image_asset = ResolvedAsset::new(image_source.as_str());
        image_asset.data = texture_options.clone();
        let texture: AssetHandle<Texture> = loader
            .load(image_asset)
            .await?
            .one()
            .flatten()
            .and_then(|value| value.downcast::<Texture>())
            .ok_or_else(|| anyhow!("Spritesheet image {image_source} did not load as a texture"))?;

        let resolution = data.scale().unwrap_or(texture.resolution);
        let mut sheet = Spritesheet::from_data(
            asset.src.as_str(),
            image_source.as_str(),
            texture,
            &data,
            resolution,
        );

        if asset.data_flag(IGNORE_MULTI_PACK) || data.meta.related_multi_packs.is_empty() {
            sheet.related_multi_packs.clear();
            return Ok(Some(AssetValue::new(sheet)));
        }

        let mut data_for_siblings = json!({ IGNORE_MULTI_PACK: true });
        if let Some(options) = texture_options {
            data_for_siblings["textureOptions"] = options;
        }
        let siblings: Vec<ResolvedAsset> = data
            .meta
            .related_multi_packs
            .iter()
            .map(|related| {
                ResolvedAsset::new(path::copy_search_params(&format!("{base}{related}"), &asset.src))
                    .with_data(data_for_siblings.clone())
            })
            .collect();

        let mut loaded = loader
            .load(AssetRequest::Many(siblings.clone()))
            .await?
            .many()
            .unwrap_or_default();

        let mut linked = Vec::new();
        let mut related = Vec::new();
        for (sibling, name) in siblings.iter().zip(&data.meta.related_multi_packs) {
            match loaded
                .shift_remove(&sibling.src)
                .flatten()
                .and_then(|value| value.downcast::<Spritesheet>())
            {
                Some(handle) => {
                    linked.push(handle);
                    related.push(name.clone());
                }
                None => log::warn!(
                    "Related pack {} of {} is not a spritesheet",
                    sibling.src,
                    asset.src
                ),
            }
        }

        sheet.related_multi_packs = related;
        Ok(Some(AssetValue::new(sheet.with_linked_sheets(linked))))
    }
}

#[async_trait]
impl UnloadStage for SpritesheetLoaderLane {
    async fn unload(&self, value: &AssetValue, _asset: &ResolvedAsset, loader: &Loader) -> Result<()> {
        let Some(sheet) = value.downcast_ref::<Spritesheet>() else {
            return Ok(());
        };

        let mut sources = vec![ResolvedAsset::new(sheet.image_source.as_str())];
        sources.extend(
            sheet
                .linked_sheets
                .iter()
                .map(|linked| ResolvedAsset::new(linked.source.as_str())),
        );
        loader.unload(AssetRequest::Many(sources)).await;
        Ok(())
    }
}

impl LoaderParser for SpritesheetLoaderLane {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn as_transformer(&self) -> Option<&dyn ParseStage> {
        Some(self)
    }

    fn as_unloader(&self) -> Option<&dyn UnloadStage> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_path_keeps_a_trailing_slash() {
        assert_eq!(base_path("sheets/hero.json"), "sheets/");
        assert_eq!(base_path("hero.json"), "./");
        assert_eq!(base_path("http://cdn/hero.json?v=1"), "http://cdn/");
    }
}
