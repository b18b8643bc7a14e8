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

use super::CacheParser;
use indexmap::IndexMap;
use kiln_core::{
    asset::{AssetValue, Spritesheet},
    path,
};

/// Makes every frame of a cached [`Spritesheet`] addressable by its name.
///
/// Sheets of a multi-pack also expose their linked sheets, each under
/// `<directory of the first key>/<related document name>`, together with
/// the frames of those sheets.
#[derive(Debug, Default, Clone, Copy)]
pub struct SpritesheetCacheParser;

impl SpritesheetCacheParser {
    /// The name this parser registers under.
    pub const NAME: &'static str = "cacheSpritesheet";

    fn collect(
        keys: &[String],
        value: &AssetValue,
        sheet: &Spritesheet,
        ignore_multi_pack: bool,
        out: &mut IndexMap<String, AssetValue>,
    ) {
        for key in keys {
            out.insert(key.clone(), value.clone());
        }
        for (name, frame) in &sheet.frames {
            out.insert(name.clone(), AssetValue::from(frame.clone()));
        }

        if ignore_multi_pack {
            return;
        }
        let Some(first) = keys.first() else {
            return;
        };
        let base = path::dirname(first);
        for (linked, related) in sheet.linked_sheets.iter().zip(&sheet.related_multi_packs) {
            let key = format!("{}/{}", base.trim_end_matches('/'), related);
            Self::collect(&[key], &AssetValue::from(linked.clone()), linked, true, out);
        }
    }
}

impl CacheParser for SpritesheetCacheParser {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn test(&self, value: &AssetValue) -> bool {
        value.is::<Spritesheet>()
    }

    fn cacheable_assets(&self, keys: &[String], value: &AssetValue) -> IndexMap<String, AssetValue> {
        let mut out = IndexMap::new();
        match value.downcast_ref::<Spritesheet>() {
            Some(sheet) => Self::collect(keys, value, sheet, false, &mut out),
            None => {
                for key in keys {
                    out.insert(key.clone(), value.clone());
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::Cache;
    use kiln_core::asset::{AssetHandle, SpriteFrame, SpritesheetData, Texture};
    use serde_json::json;
    use std::sync::Arc;

    fn sheet(source: &str, frames: &[&str], related: &[&str]) -> Spritesheet {
        let frames: serde_json::Map<_, _> = frames
            .iter()
            .map(|name| (name.to_string(), json!({ "frame": { "x": 0, "y": 0, "w": 1, "h": 1 } })))
            .collect();
        let data: SpritesheetData = serde_json::from_value(json!({
            "frames": frames,
            "meta": { "image": "atlas.png", "related_multi_packs": related }
        }))
        .unwrap();
        let texture = AssetHandle::new(Texture::new("atlas.png", 1, 1, 1.0, vec![0; 4]));
        Spritesheet::from_data(source, "atlas.png", texture, &data, 1.0)
    }

    #[test]
    fn frames_become_addressable() {
        let mut cache = Cache::new();
        cache.add_parser(Arc::new(SpritesheetCacheParser));

        let value = AssetValue::new(sheet("sheets/hero.json", &["idle", "run"], &[]));
        cache.set(["sheets/hero.json", "hero"], value.clone());

        assert!(AssetValue::ptr_eq(&cache.get("hero").unwrap(), &value));
        let run = cache.get_as::<SpriteFrame>("run").unwrap();
        assert_eq!(run.name, "run");

        cache.remove("sheets/hero.json");
        assert!(!cache.has("idle"));
        assert!(!cache.has("run"));
        assert!(!cache.has("hero"));
    }

    #[test]
    fn linked_sheets_are_keyed_next_to_the_first_key() {
        let linked = AssetHandle::new(sheet("sheets/hero-1.json", &["jump"], &[]));
        let main = sheet("sheets/hero-0.json", &["idle"], &["hero-1.json"])
            .with_linked_sheets(vec![linked.clone()]);

        let entries = SpritesheetCacheParser.cacheable_assets(
            &["sheets/hero-0.json".to_string()],
            &AssetValue::new(main),
        );

        let keys: Vec<_> = entries.keys().map(String::as_str).collect();
        assert_eq!(keys, ["sheets/hero-0.json", "idle", "sheets/hero-1.json", "jump"]);
        assert!(AssetValue::ptr_eq(
            &entries["sheets/hero-1.json"],
            &AssetValue::from(linked)
        ));
    }

    #[test]
    fn other_values_are_not_claimed() {
        assert!(!SpritesheetCacheParser.test(&AssetValue::new("text".to_string())));
    }
}
