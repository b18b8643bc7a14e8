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

use kiln_core::asset::{AssetHandle, AssetValue, Spritesheet, SpritesheetData, Texture};
use kiln_data::assets::{Cache, CacheParser, SpritesheetCacheParser};
use serde_json::json;
use std::sync::Arc;

fn atlas(source: &str, frames: &[&str]) -> Spritesheet {
    let frames: serde_json::Map<_, _> = frames
        .iter()
        .map(|name| (name.to_string(), json!({ "frame": { "x": 0, "y": 0, "w": 2, "h": 2 } })))
        .collect();
    let data: SpritesheetData = serde_json::from_value(json!({
        "frames": frames,
        "meta": { "image": "atlas.png" }
    }))
    .unwrap();
    let texture = AssetHandle::new(Texture::new("atlas.png", 2, 2, 1.0, vec![0; 16]));
    Spritesheet::from_data(source, "atlas.png", texture, &data, 1.0)
}

#[test]
fn removal_by_any_key_clears_the_whole_fan_out() {
    let mut cache = Cache::new();
    cache.add_parser(Arc::new(SpritesheetCacheParser));

    cache.set(["ui.json", "ui"], AssetValue::new(atlas("ui.json", &["ok", "cancel"])));
    cache.set("font.txt", AssetValue::new("glyphs".to_string()));
    assert_eq!(cache.len(), 5);

    cache.remove("ui");
    for key in ["ui.json", "ui", "ok", "cancel"] {
        assert!(!cache.has(key), "{key} should be gone");
    }
    assert!(cache.has("font.txt"));
}

#[test]
fn first_matching_parser_wins() {
    struct Shadow;
    impl CacheParser for Shadow {
        fn name(&self) -> &str {
            "shadow"
        }
        fn test(&self, value: &AssetValue) -> bool {
            value.is::<Spritesheet>()
        }
        fn cacheable_assets(
            &self,
            keys: &[String],
            value: &AssetValue,
        ) -> indexmap::IndexMap<String, AssetValue> {
            keys.iter().map(|k| (k.clone(), value.clone())).collect()
        }
    }

    let mut cache = Cache::new();
    cache.add_parser(Arc::new(Shadow));
    cache.add_parser(Arc::new(SpritesheetCacheParser));
    cache.set("ui.json", AssetValue::new(atlas("ui.json", &["ok"])));

    assert!(cache.has("ui.json"));
    assert!(!cache.has("ok"));
}

#[test]
fn overwriting_keeps_the_latest_value() {
    let mut cache = Cache::new();
    cache.set("a", AssetValue::new("one".to_string()));
    cache.set("a", AssetValue::new("two".to_string()));
    assert_eq!(cache.get_as::<String>("a").as_deref().map(String::as_str), Some("two"));
}
