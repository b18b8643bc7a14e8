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
use std::path::{Component, Path, PathBuf};

/// Serves asset URLs from a directory on disk.
///
/// Plain paths and `file://` URLs map under `root`; the query string and
/// fragment are ignored. Other schemes, and paths climbing out of `root`, are
/// rejected.
#[derive(Debug, Clone)]
pub struct FileFetcher {
    root: PathBuf,
}

impl FileFetcher {
    /// Creates a fetcher serving files under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory URLs are resolved against.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps `url` to a file under the root.
    pub fn file_path(&self, url: &str) -> Result<PathBuf, AssetError> {
        let location = path::remove_url_params(url);
        let location = match location.strip_prefix("file://") {
            Some(rest) => rest,
            None if path::has_protocol(location) || path::is_data_url(location) => {
                return Err(AssetError::fetch(url, "unsupported scheme"));
            }
            None => location,
        };

        let relative = Path::new(location.trim_start_matches('/'));
        if relative
            .components()
            .any(|component| matches!(component, Component::ParentDir))
        {
            return Err(AssetError::fetch(url, "path escapes the asset root"));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl Fetch for FileFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, AssetError> {
        let file = self.file_path(url)?;
        log::trace!("Reading {}", file.display());
        tokio::fs::read(&file)
            .await
            .map_err(|error| AssetError::fetch(url, error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_map_under_the_root() {
        let fetcher = FileFetcher::new("/srv/assets");
        assert_eq!(
            fetcher.file_path("sheets/hero.json?v=2").unwrap(),
            Path::new("/srv/assets/sheets/hero.json")
        );
        assert_eq!(
            fetcher.file_path("/hero.png").unwrap(),
            Path::new("/srv/assets/hero.png")
        );
        assert_eq!(
            fetcher.file_path("file:///hero.png").unwrap(),
            Path::new("/srv/assets/hero.png")
        );
    }

    #[test]
    fn foreign_schemes_and_escapes_are_rejected() {
        let fetcher = FileFetcher::new("/srv/assets");
        assert!(fetcher.file_path("https://cdn.test/hero.png").is_err());
        assert!(fetcher.file_path("../secret.txt").is_err());
    }
}
