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

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An ordered, multi-dimensional preference rule.
///
/// `params` maps a dimension (`format`, `resolution`, ...) to its accepted
/// values, most preferred first. `priority` lists the order in which the
/// dimensions are applied; when empty, the insertion order of `params` is used.
///
/// # Examples
///
/// ```
/// use kiln_core::asset::PreferOrder;
///
/// let order = PreferOrder::new()
///     .param("resolution", [2.0, 1.0])
///     .param("format", ["webp", "png"]);
///
/// assert_eq!(order.effective_priority(), vec!["resolution", "format"]);
/// assert!(order.prefers_format("webp"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreferOrder {
    /// Order in which dimensions narrow the candidate set.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub priority: Vec<String>,

    /// Accepted values per dimension, most preferred first.
    #[serde(default)]
    pub params: IndexMap<String, Vec<Value>>,
}

impl PreferOrder {
    /// Creates an empty rule.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a dimension with its values in order of preference.
    pub fn param<I, V>(mut self, dimension: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.params.insert(
            dimension.into(),
            values.into_iter().map(Into::into).collect(),
        );
        self
    }

    /// Sets an explicit dimension order.
    pub fn priority<I, S>(mut self, dimensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.priority = dimensions.into_iter().map(Into::into).collect();
        self
    }

    /// The dimension order actually applied during selection.
    pub fn effective_priority(&self) -> Vec<&str> {
        if self.priority.is_empty() {
            self.params.keys().map(String::as_str).collect()
        } else {
            self.priority.iter().map(String::as_str).collect()
        }
    }

    /// Returns `true` if `format` is listed in this rule's `format` dimension.
    pub fn prefers_format(&self, format: &str) -> bool {
        self.params
            .get("format")
            .is_some_and(|formats| formats.iter().any(|f| f.as_str() == Some(format)))
    }
}

/// Compares two dimension values.
///
/// Numbers compare by value regardless of their JSON representation, so that
/// a resolution parsed as `2.0` matches a preference written as `2`.
pub fn dimension_matches(candidate: &Value, preferred: &Value) -> bool {
    match (candidate.as_f64(), preferred.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => candidate == preferred,
    }
}
