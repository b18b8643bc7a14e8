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

//! Texture loading and management.

use super::fetch_bytes;
use crate::asset_lane::{
    retina_resolution, LoadStage, Loader, LoaderParser, ParserPriority, UnloadStage,
    TEXTURE_EXTENSIONS,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use kiln_core::{
    asset::{AssetValue, ResolvedAsset, Texture},
    path,
};

/// A lane dedicated to loading and decoding texture files on the CPU.
///
/// Decoding runs on tokio's blocking pool. The texture's resolution comes from
/// the descriptor, or else from an `@<n>x` suffix of the URL.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextureLoaderLane;

impl TextureLoaderLane {
    /// The name this parser registers under.
    pub const NAME: &'static str = "loadTextures";

    /// Decodes `bytes` into an RGBA8 texture.
    pub fn decode(source: &str, bytes: &[u8], resolution: f64) -> Result<Texture> {
        // Decode the image using the `image` crate
        let img = image::load_from_memory(bytes).context("Failed to decode image from memory")?;

        // Convert to RGBA8 (keep in sRGB space)
        let rgba_img = img.to_rgba8();
        let (width, height) = rgba_img.dimensions();

        Ok(Texture::new(
            source,
            width,
            height,
            resolution,
            rgba_img.into_raw(),
        ))
    }
}

#[async_trait]
impl LoadStage for TextureLoaderLane {
    fn test(&self, url: &str, _asset: &ResolvedAsset, _loader: &Loader) -> bool {
        path::data_url_mime(url).is_some_and(|mime| mime.starts_with("image/"))
            || path::has_extension(url, TEXTURE_EXTENSIONS)
    }

    async fn load(&self, url: &str, asset: &ResolvedAsset, loader: &Loader) -> Result<AssetValue> {
        let bytes = fetch_bytes(loader, url).await?;
        let resolution = asset
            .resolution()
            .or_else(|| retina_resolution(url))
            .unwrap_or(1.0);

        let source = url.to_string();
        let texture = tokio::task::spawn_blocking(move || Self::decode(&source, &bytes, resolution))
            .await
            .context("Texture decoding task failed")??;

        log::debug!(
            "Decoded texture {url} ({}x{} @{}x)",
            texture.width,
            texture.height,
            texture.resolution
        );
        Ok(AssetValue::new(texture))
    }
}

#[async_trait]
impl UnloadStage for TextureLoaderLane {
    async fn unload(&self, value: &AssetValue, _asset: &ResolvedAsset, _loader: &Loader) -> Result<()> {
        if let Some(texture) = value.downcast_ref::<Texture>() {
            texture.destroy();
        }
        Ok(())
    }
}

impl LoaderParser for TextureLoaderLane {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn priority(&self) -> ParserPriority {
        ParserPriority::High
    }

    fn as_loader(&self) -> Option<&dyn LoadStage> {
        Some(self)
    }

    fn as_unloader(&self) -> Option<&dyn UnloadStage> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    #[test]
    fn decode_produces_rgba_pixels() {
        let mut encoded = Cursor::new(Vec::new());
        RgbaImage::from_pixel(3, 2, Rgba([10, 20, 30, 255]))
            .write_to(&mut encoded, ImageFormat::Png)
            .unwrap();

        let texture = TextureLoaderLane::decode("a@2x.png", encoded.get_ref(), 2.0).unwrap();
        assert_eq!((texture.width, texture.height), (3, 2));
        assert_eq!(texture.pixels.len(), 3 * 2 * 4);
        assert_eq!(&texture.pixels[..4], &[10, 20, 30, 255]);
        assert_eq!(texture.logical_width(), 1.5);
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(TextureLoaderLane::decode("a.png", b"not an image", 1.0).is_err());
    }
}
