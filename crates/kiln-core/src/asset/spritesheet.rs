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

use super::{Asset, AssetHandle, Texture};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A rectangle inside a texture, in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameRect {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width.
    pub w: u32,
    /// Height.
    pub h: u32,
}

/// Untrimmed size of a frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameSize {
    /// Width.
    pub w: u32,
    /// Height.
    pub h: u32,
}

/// One frame entry of a spritesheet document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameData {
    /// Region of the frame in the backing image.
    pub frame: FrameRect,
    /// Whether the region is stored rotated by 90 degrees.
    #[serde(default)]
    pub rotated: bool,
    /// Whether transparent borders were trimmed away.
    #[serde(default)]
    pub trimmed: bool,
    /// Size of the frame before trimming.
    #[serde(default)]
    pub source_size: Option<FrameSize>,
}

/// The `meta` block of a spritesheet document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpritesheetMeta {
    /// Backing image, relative to the document.
    pub image: String,
    /// Authored scale, as a number or a numeric string.
    #[serde(default)]
    pub scale: Option<Value>,
    /// Sibling documents of a multi-pack sheet, relative to the document.
    #[serde(default)]
    pub related_multi_packs: Vec<String>,
}

/// A spritesheet document in the common "hash" layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpritesheetData {
    /// Frames by name.
    pub frames: IndexMap<String, FrameData>,
    /// Named frame sequences.
    #[serde(default)]
    pub animations: IndexMap<String, Vec<String>>,
    /// Document metadata.
    pub meta: SpritesheetMeta,
}

impl SpritesheetData {
    /// The authored scale, if the document declares a usable one.
    pub fn scale(&self) -> Option<f64> {
        match self.meta.scale.as_ref()? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
        .filter(|scale| *scale > 0.0)
    }
}

/// A named region of a spritesheet's backing texture.
#[derive(Debug)]
pub struct SpriteFrame {
    /// Frame name as declared in the document.
    pub name: String,
    /// The texture the frame is cut from.
    pub texture: AssetHandle<Texture>,
    /// Region inside `texture`.
    pub frame: FrameRect,
    /// Whether the region is stored rotated.
    pub rotated: bool,
    /// Whether transparent borders were trimmed away.
    pub trimmed: bool,
    /// Size before trimming.
    pub source_size: FrameSize,
}

impl Asset for SpriteFrame {}

/// A texture atlas split into named frames.
#[derive(Debug)]
pub struct Spritesheet {
    /// URL of the document this sheet was parsed from.
    pub source: String,
    /// URL of the backing image.
    pub image_source: String,
    /// The backing texture.
    pub texture: AssetHandle<Texture>,
    /// Frames by name, in document order.
    pub frames: IndexMap<String, AssetHandle<SpriteFrame>>,
    /// Frame sequences by name.
    pub animations: IndexMap<String, Vec<AssetHandle<SpriteFrame>>>,
    /// Sibling sheets of a multi-pack, in `related_multi_packs` order.
    pub linked_sheets: Vec<AssetHandle<Spritesheet>>,
    /// Related document names as declared, parallel to `linked_sheets`.
    pub related_multi_packs: Vec<String>,
    /// Pixel density of the sheet.
    pub resolution: f64,
}

impl Asset for Spritesheet {}

impl Spritesheet {
    /// Cuts `texture` into the frames described by `data`.
    ///
    /// Animations referencing unknown frames keep the frames that exist.
    pub fn from_data(
        source: impl Into<String>,
        image_source: impl Into<String>,
        texture: AssetHandle<Texture>,
        data: &SpritesheetData,
        resolution: f64,
    ) -> Self {
        let frames: IndexMap<_, _> = data
            .frames
            .iter()
            .map(|(name, entry)| {
                let frame = SpriteFrame {
                    name: name.clone(),
                    texture: texture.clone(),
                    frame: entry.frame,
                    rotated: entry.rotated,
                    trimmed: entry.trimmed,
                    source_size: entry.source_size.unwrap_or(FrameSize {
                        w: entry.frame.w,
                        h: entry.frame.h,
                    }),
                };
                (name.clone(), AssetHandle::new(frame))
            })
            .collect();

        let animations = data
            .animations
            .iter()
            .map(|(name, sequence)| {
                let resolved = sequence
                    .iter()
                    .filter_map(|frame_name| {
                        let frame = frames.get(frame_name).cloned();
                        if frame.is_none() {
                            log::warn!(
                                "Animation '{name}' references unknown frame '{frame_name}'"
                            );
                        }
                        frame
                    })
                    .collect();
                (name.clone(), resolved)
            })
            .collect();

        Self {
            source: source.into(),
            image_source: image_source.into(),
            texture,
            frames,
            animations,
            linked_sheets: Vec::new(),
            related_multi_packs: data.meta.related_multi_packs.clone(),
            resolution,
        }
    }

    /// Attaches the sibling sheets of a multi-pack.
    pub fn with_linked_sheets(mut self, linked: Vec<AssetHandle<Spritesheet>>) -> Self {
        self.linked_sheets = linked;
        self
    }
}
