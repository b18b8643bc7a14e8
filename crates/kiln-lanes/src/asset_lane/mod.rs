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

//! Resolution and loading of assets.
//!
//! The lanes in this module hold no cache of their own beyond what their
//! contracts require: the resolver memoizes key resolution and the loader
//! deduplicates in-flight loads. Long-lived storage is the job of
//! the cache in `kiln-data`.

mod detection;
mod loader;
mod parser;
mod resolver;

pub mod loading;

pub use detection::*;
pub use loader::*;
pub use parser::*;
pub use resolver::*;
