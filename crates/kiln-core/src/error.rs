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

//! Defines the error types shared by the whole asset pipeline.

use std::{error::Error, sync::Arc};
use thiserror::Error;

/// A cloneable, thread-safe error cause.
///
/// One in-flight load may be awaited by many callers at once, so the cause of
/// its failure must be shareable between all of them.
pub type SharedError = Arc<dyn Error + Send + Sync + 'static>;

/// Converts a parser failure into a [`SharedError`].
pub fn share_error(error: anyhow::Error) -> SharedError {
    Arc::from(Box::<dyn Error + Send + Sync + 'static>::from(error))
}

/// An error raised by the resolver, loader, cache, or facade.
#[derive(Debug, Clone, Error)]
pub enum AssetError {
    /// A single asset failed to load or parse.
    ///
    /// The failing URL has already been purged from the loader, so the same
    /// request can simply be retried.
    #[error("Failed to load '{url}': {source}")]
    Load {
        /// The absolute URL that failed.
        url: String,
        /// The underlying cause.
        #[source]
        source: SharedError,
    },

    /// A fetch implementation could not provide the bytes of a URL.
    #[error("Failed to fetch '{url}': {reason}")]
    Fetch {
        /// The URL that was requested.
        url: String,
        /// Why the request failed.
        reason: String,
    },

    /// A bundle operation was requested before any manifest or bundle was registered.
    #[error("No manifest or bundle has been registered")]
    MissingManifest,

    /// The requested bundle id was never registered.
    #[error("Bundle '{0}' does not exist")]
    UnknownBundle(String),

    /// An asset was added without any key to address it by.
    #[error("No alias was provided for asset '{0}'")]
    MissingAlias(String),
}

impl AssetError {
    /// Builds a [`AssetError::Fetch`] from anything printable.
    pub fn fetch(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::Fetch {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// The URL involved in this error, if any.
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Load { url, .. } | Self::Fetch { url, .. } => Some(url),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn load_error_exposes_url_and_cause() {
        let error = AssetError::Load {
            url: "https://cdn/hero.png".into(),
            source: share_error(anyhow!("corrupt header")),
        };

        assert_eq!(error.url(), Some("https://cdn/hero.png"));
        let message = error.to_string();
        assert!(message.contains("hero.png"));
        assert!(message.contains("corrupt header"));
        assert!(error.source().is_some());
    }

    #[test]
    fn bundle_errors_have_no_url() {
        assert_eq!(AssetError::UnknownBundle("ui".into()).url(), None);
        assert_eq!(
            AssetError::UnknownBundle("ui".into()).to_string(),
            "Bundle 'ui' does not exist"
        );
    }
}
