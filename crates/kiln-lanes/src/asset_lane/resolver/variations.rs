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

use regex::Regex;
use std::sync::LazyLock;

static BRACES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^{}]*)\}").expect("brace pattern is valid"));

/// Expands every `{a,b}` group of `source` into its alternatives.
///
/// Groups combine left to right, the first group varying slowest:
/// `hero@{1,2}x.{png,webp}` yields `hero@1x.png`, `hero@1x.webp`,
/// `hero@2x.png`, `hero@2x.webp`.
pub(crate) fn string_variations(source: &str) -> Vec<String> {
    let mut variations = vec![String::new()];
    let mut cursor = 0;

    for group in BRACES.captures_iter(source) {
        let (Some(whole), Some(options)) = (group.get(0), group.get(1)) else {
            continue;
        };
        let literal = &source[cursor..whole.start()];
        variations = variations
            .iter()
            .flat_map(|prefix| {
                options
                    .as_str()
                    .split(',')
                    .map(move |option| format!("{prefix}{literal}{option}"))
            })
            .collect();
        cursor = whole.end();
    }

    let tail = &source[cursor..];
    for variation in &mut variations {
        variation.push_str(tail);
    }
    variations
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_strings_are_kept() {
        assert_eq!(string_variations("hero.png"), ["hero.png"]);
    }

    #[test]
    fn groups_multiply_in_order() {
        assert_eq!(
            string_variations("hero@{1,2}x.{png,webp}"),
            ["hero@1x.png", "hero@1x.webp", "hero@2x.png", "hero@2x.webp"]
        );
    }

    #[test]
    fn single_option_group_is_unwrapped() {
        assert_eq!(string_variations("a/{b}/c.json?v=1"), ["a/b/c.json?v=1"]);
    }
}
