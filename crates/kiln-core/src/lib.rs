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

//! Foundational crate of the Kiln asset pipeline.
//!
//! `kiln-core` holds the "common language" shared by every other crate: the
//! [`asset::Asset`] marker trait and its handles, the [`asset::ResolvedAsset`]
//! descriptor exchanged between the resolver and the loader, preference rules,
//! manifest types, the input/output shape types used by every public entry
//! point, URL utilities, and the [`fetch::Fetch`] capability that is the only
//! I/O primitive the pipeline needs from its environment.
//!
//! It knows nothing about how assets are resolved, loaded, or cached.

#![warn(missing_docs)]

pub mod asset;
pub mod error;
pub mod fetch;
pub mod manifest;
pub mod path;
pub mod shape;

pub use error::{AssetError, SharedError};
pub use shape::{AssetRequest, Keys, OneOrMany};
