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

use kiln_core::{fetch::Fetch, AssetError};
use kiln_infra::fetch::{FileFetcher, MemoryFetcher};
use tempfile::tempdir;

#[tokio::test]
async fn file_fetcher_reads_under_its_root() -> std::io::Result<()> {
    let dir = tempdir()?;
    std::fs::create_dir_all(dir.path().join("sheets"))?;
    std::fs::write(dir.path().join("sheets/hero.json"), br#"{"frames":{}}"#)?;

    let fetcher = FileFetcher::new(dir.path());
    let bytes = fetcher.fetch("sheets/hero.json?v=3").await.unwrap();
    assert_eq!(bytes, br#"{"frames":{}}"#);

    let missing = fetcher.fetch("sheets/ghost.json").await;
    assert!(matches!(missing, Err(AssetError::Fetch { url, .. }) if url == "sheets/ghost.json"));
    Ok(())
}

#[tokio::test]
async fn memory_fetcher_counts_and_ignores_queries() {
    let fetcher = MemoryFetcher::new().with("hero.png", vec![1, 2, 3]);

    assert_eq!(fetcher.fetch("hero.png").await.unwrap(), [1, 2, 3]);
    assert_eq!(fetcher.fetch("hero.png?v=2").await.unwrap(), [1, 2, 3]);
    assert!(fetcher.fetch("ghost.png").await.is_err());

    assert_eq!(fetcher.fetch_count("hero.png"), 1);
    assert_eq!(fetcher.fetch_count("hero.png?v=2"), 1);
    assert_eq!(fetcher.total_fetches(), 3);

    assert!(fetcher.remove("hero.png"));
    assert!(fetcher.fetch("hero.png").await.is_err());
}
