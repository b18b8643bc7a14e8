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

//! Acts as the **[A]gent** for the asset subsystem.
//!
//! This module provides the high-level logic for asset management in Kiln. It
//! is the public-facing API for requesting assets and querying their state,
//! but it delegates the actual work to the lanes: keys are resolved by the
//! `Resolver`, sources are fetched and parsed by the `Loader`, and results are
//! stored in the `Cache`.
//!
//! The primary entry point is [`AssetAgent`]. Its [`BackgroundLoader`] warms
//! up assets that will be needed later while yielding to foreground loads.

mod agent;
mod background;
mod options;

pub use agent::*;
pub use background::*;
pub use options::*;
