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

use super::{fetch_bytes, is_data_of};
use crate::asset_lane::{LoadStage, Loader, LoaderParser, ParserPriority};
use anyhow::{Context, Result};
use async_trait::async_trait;
use kiln_core::{
    asset::{AssetValue, ResolvedAsset},
    path,
};

/// Loads `.json` sources into a [`serde_json::Value`].
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonLoaderLane;

impl JsonLoaderLane {
    /// The name this parser registers under.
    pub const NAME: &'static str = "loadJson";
}

#[async_trait]
impl LoadStage for JsonLoaderLane {
    fn test(&self, url: &str, _asset: &ResolvedAsset, _loader: &Loader) -> bool {
        is_data_of(url, "application/json") || path::has_extension(url, &["json"])
    }

    async fn load(&self, url: &str, _asset: &ResolvedAsset, loader: &Loader) -> Result<AssetValue> {
        let bytes = fetch_bytes(loader, url).await?;
        let document: serde_json::Value =
            serde_json::from_slice(&bytes).context("Failed to parse JSON document")?;
        Ok(AssetValue::new(document))
    }
}

impl LoaderParser for JsonLoaderLane {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn priority(&self) -> ParserPriority {
        ParserPriority::Low
    }

    fn as_loader(&self) -> Option<&dyn LoadStage> {
        Some(self)
    }
}
