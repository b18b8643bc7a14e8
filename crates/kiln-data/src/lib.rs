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

//! Data layouts and storage for loaded assets.
//!
//! The [`assets::Cache`] is the single source of truth for "is this asset
//! available synchronously". Pluggable [`assets::CacheParser`]s let one stored
//! value fan out into many addressable entries (a spritesheet into its frames).

#![warn(missing_docs)]

pub mod assets;
