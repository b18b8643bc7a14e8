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

use async_trait::async_trait;
use kiln_core::{fetch::Fetch, path, AssetError};
use parking_lot::{Mutex, RwLock};
use std::{collections::HashMap, sync::Arc};

/// Serves byte blobs registered in memory.
///
/// Lookups try the exact URL first, then the URL without its query string.
/// Every fetch is counted per URL, which makes the fetcher handy to observe
/// how often the pipeline actually reaches for a source.
#[derive(Debug, Default)]
pub struct MemoryFetcher {
    entries: RwLock<HashMap<String, Arc<[u8]>>>,
    fetches: Mutex<HashMap<String, usize>>,
}

impl MemoryFetcher {
    /// Creates an empty fetcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `bytes` under `url`, builder style.
    pub fn with(self, url: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(url, bytes);
        self
    }

    /// Registers `bytes` under `url`, replacing any previous blob.
    pub fn insert(&self, url: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.entries
            .write()
            .insert(url.into(), Arc::from(bytes.into()));
    }

    /// Unregisters `url`. Returns `true` if it was registered.
    pub fn remove(&self, url: &str) -> bool {
        self.entries.write().remove(url).is_some()
    }

    /// How many times `url` was fetched, successfully or not.
    pub fn fetch_count(&self, url: &str) -> usize {
        self.fetches.lock().get(url).copied().unwrap_or(0)
    }

    /// How many fetches happened overall.
    pub fn total_fetches(&self) -> usize {
        self.fetches.lock().values().sum()
    }
}

#[async_trait]
impl Fetch for MemoryFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, AssetError> {
        *self.fetches.lock().entry(url.to_string()).or_default() += 1;

        let entries = self.entries.read();
        entries
            .get(url)
            .or_else(|| entries.get(path::remove_url_params(url)))
            .map(|bytes| bytes.to_vec())
            .ok_or_else(|| AssetError::fetch(url, "not found"))
    }
}
