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

use kiln_core::{
    asset::{ResolvedAsset, RESOLUTION_PROPERTY},
    path,
};
use regex::Regex;
use std::sync::LazyLock;

/// Extensions the built-in texture pipeline understands.
pub const TEXTURE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "avif", "gif", "bmp"];

static RETINA_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@([0-9\.]+)x").expect("retina pattern is valid"));

/// Reads the pixel density encoded as an `@<n>x` suffix (`hero@2x.png` → `2`).
pub fn retina_resolution(url: &str) -> Option<f64> {
    RETINA_SUFFIX
        .captures(url)
        .and_then(|captures| captures.get(1))
        .and_then(|resolution| resolution.as_str().parse().ok())
}

/// Derives descriptor metadata from a bare source string.
///
/// Registered on the [`Resolver`](super::Resolver), URL parsers run on every
/// string source passed to `add`; the first whose `test` accepts the string
/// builds the candidate descriptor.
pub trait ResolveUrlParser: Send + Sync + 'static {
    /// A human readable name for diagnostics.
    fn name(&self) -> &str;

    /// Should this parser describe `url`?
    fn test(&self, url: &str) -> bool;

    /// Builds the descriptor of `url`.
    fn parse(&self, url: &str) -> ResolvedAsset;
}

fn describe_with_resolution(url: &str) -> ResolvedAsset {
    let mut asset = ResolvedAsset::new(url)
        .with_property(RESOLUTION_PROPERTY, retina_resolution(url).unwrap_or(1.0));
    asset.format = path::url_extension(url);
    asset
}

/// Describes texture sources: format from the extension, resolution from `@<n>x`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextureUrlParser;

impl ResolveUrlParser for TextureUrlParser {
    fn name(&self) -> &str {
        "resolveTexture"
    }

    fn test(&self, url: &str) -> bool {
        path::has_extension(url, TEXTURE_EXTENSIONS)
    }

    fn parse(&self, url: &str) -> ResolvedAsset {
        describe_with_resolution(url)
    }
}

/// Describes density specific spritesheet documents (`hero@2x.json`).
#[derive(Debug, Default, Clone, Copy)]
pub struct SpritesheetUrlParser;

impl ResolveUrlParser for SpritesheetUrlParser {
    fn name(&self) -> &str {
        "resolveSpritesheet"
    }

    fn test(&self, url: &str) -> bool {
        RETINA_SUFFIX.is_match(url) && path::has_extension(url, &["json"])
    }

    fn parse(&self, url: &str) -> ResolvedAsset {
        describe_with_resolution(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn texture_parser_reads_density_and_format() {
        let asset = TextureUrlParser.parse("img/hero@2x.webp?v=3");
        assert_eq!(asset.resolution(), Some(2.0));
        assert_eq!(asset.format.as_deref(), Some("webp"));
        assert_eq!(asset.src, "img/hero@2x.webp?v=3");

        assert_eq!(TextureUrlParser.parse("hero.png").resolution(), Some(1.0));
        assert_eq!(TextureUrlParser.parse("hero@0.5x.png").resolution(), Some(0.5));
    }

    #[test]
    fn spritesheet_parser_requires_a_density_suffix() {
        assert!(SpritesheetUrlParser.test("sheet@2x.json"));
        assert!(!SpritesheetUrlParser.test("sheet.json"));
        assert!(!SpritesheetUrlParser.test("sheet@2x.png"));
        assert!(!TextureUrlParser.test("sheet@2x.json"));
    }
}
