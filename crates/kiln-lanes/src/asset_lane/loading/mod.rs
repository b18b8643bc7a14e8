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

//! The built-in loader parsers.
//!
//! Each lane handles one kind of source: JSON documents, plain text,
//! textures, and spritesheets layered on top of JSON and textures.

mod json_loader_lane;
mod spritesheet_loader_lane;
mod text_loader_lane;
mod texture_loader_lane;

pub use json_loader_lane::*;
pub use spritesheet_loader_lane::*;
pub use text_loader_lane::*;
pub use texture_loader_lane::*;

use super::{Loader, LoaderParser};
use anyhow::{bail, Context, Result};
use base64::Engine;
use kiln_core::path;
use std::sync::Arc;

/// The parsers an asset agent registers by default.
pub fn default_parsers() -> Vec<Arc<dyn LoaderParser>> {
    vec![
        Arc::new(TextureLoaderLane),
        Arc::new(SpritesheetLoaderLane),
        Arc::new(JsonLoaderLane),
        Arc::new(TextLoaderLane),
    ]
}

/// Reads the bytes behind `url`: data URLs are decoded in place, everything
/// else goes through the loader's fetch capability.
pub async fn fetch_bytes(loader: &Loader, url: &str) -> Result<Vec<u8>> {
    if path::is_data_url(url) {
        return decode_data_url(url);
    }
    Ok(loader.fetcher().fetch(url).await?)
}

fn decode_data_url(url: &str) -> Result<Vec<u8>> {
    let body = &url.trim_start()[5..];
    let Some((header, payload)) = body.split_once(',') else {
        bail!("Malformed data URL: missing ','");
    };

    if header.split(';').any(|part| part.eq_ignore_ascii_case("base64")) {
        base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .context("Failed to decode base64 data URL")
    } else {
        Ok(percent_encoding::percent_decode_str(payload).collect())
    }
}

/// Returns `true` if `url` is a data URL of media type `mime`.
fn is_data_of(url: &str, mime: &str) -> bool {
    path::data_url_mime(url).is_some_and(|found| found.eq_ignore_ascii_case(mime))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_urls_decode_both_encodings() {
        assert_eq!(decode_data_url("data:text/plain;base64,aGk=").unwrap(), b"hi");
        assert_eq!(decode_data_url("data:,a%20b").unwrap(), b"a b");
        assert!(decode_data_url("data:text/plain").is_err());
    }

    #[test]
    fn data_mime_matching_is_case_insensitive() {
        assert!(is_data_of("data:Application/JSON,{}", "application/json"));
        assert!(!is_data_of("data:text/plain,{}", "application/json"));
    }
}
