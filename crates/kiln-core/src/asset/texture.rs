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

use super::Asset;
use std::sync::atomic::{AtomicBool, Ordering};

/// A decoded, CPU-side RGBA8 image ready to be uploaded by a renderer backend.
#[derive(Debug)]
pub struct Texture {
    /// The URL the texture was decoded from.
    pub source: String,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel density the image was authored for.
    pub resolution: f64,
    /// Tightly packed RGBA8 pixels, row-major.
    pub pixels: Vec<u8>,
    destroyed: AtomicBool,
}

impl Asset for Texture {}

impl Texture {
    /// Creates a texture from already decoded RGBA8 pixels.
    pub fn new(
        source: impl Into<String>,
        width: u32,
        height: u32,
        resolution: f64,
        pixels: Vec<u8>,
    ) -> Self {
        Self {
            source: source.into(),
            width,
            height,
            resolution,
            pixels,
            destroyed: AtomicBool::new(false),
        }
    }

    /// Logical width, once the authored resolution is taken into account.
    pub fn logical_width(&self) -> f64 {
        f64::from(self.width) / self.resolution
    }

    /// Logical height, once the authored resolution is taken into account.
    pub fn logical_height(&self) -> f64 {
        f64::from(self.height) / self.resolution
    }

    /// Marks the texture as released. Renderer backends drop their GPU copy
    /// of destroyed textures on their next frame.
    pub fn destroy(&self) {
        if !self.destroyed.swap(true, Ordering::AcqRel) {
            log::debug!("Texture '{}' destroyed", self.source);
        }
    }

    /// Returns `true` once [`Texture::destroy`] has been called.
    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::Acquire)
    }
}
