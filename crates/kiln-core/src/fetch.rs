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

//! The I/O capability the asset pipeline requires from its environment.

use crate::error::AssetError;
use async_trait::async_trait;

/// Provides the raw bytes behind a URL.
///
/// This is the only I/O primitive the pipeline depends on. Concrete
/// implementations (file system, in-memory archives, network clients) live
/// in `kiln-infra` or in the embedding application.
#[async_trait]
pub trait Fetch: Send + Sync + 'static {
    /// Fetches the full contents of `url`.
    ///
    /// # Errors
    ///
    /// Returns [`AssetError::Fetch`] if the resource does not exist or cannot
    /// be read.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, AssetError>;
}
