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

//! A key-addressable store for loaded assets.

use indexmap::IndexMap;
use kiln_core::{
    asset::{Asset, AssetHandle, AssetValue},
    Keys,
};
use std::{collections::HashMap, sync::Arc};

/// Expands one cached value into several cache entries.
///
/// Parsers are consulted in registration order; the first one whose
/// [`test`](CacheParser::test) accepts the value decides which entries
/// [`Cache::set`] creates.
pub trait CacheParser: Send + Sync + 'static {
    /// A unique, human readable name for diagnostics.
    fn name(&self) -> &str;

    /// Should this parser expand `value`?
    fn test(&self, value: &AssetValue) -> bool;

    /// Returns every entry to store for `value` requested under `keys`.
    ///
    /// Implementations are expected to include every key of `keys`.
    fn cacheable_assets(&self, keys: &[String], value: &AssetValue) -> IndexMap<String, AssetValue>;
}

/// Bookkeeping for one [`Cache::set`] call.
#[derive(Debug)]
struct CacheRecord {
    /// The keys the caller stored the value under.
    keys: Vec<String>,
    /// Every entry created for the value, fan-out included.
    cache_keys: Vec<String>,
}

/// The central, in-memory cache of loaded assets.
///
/// Every `set` remembers which entries it created, so that removing *any*
/// of the keys it was called with removes all of them at once: no orphaned
/// frames of a removed spritesheet remain addressable.
#[derive(Default)]
pub struct Cache {
    parsers: Vec<Arc<dyn CacheParser>>,
    store: HashMap<String, AssetValue>,
    records: HashMap<String, Arc<CacheRecord>>,
}

impl Cache {
    /// Creates a new, empty cache without parsers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a cache parser after the existing ones.
    pub fn add_parser(&mut self, parser: Arc<dyn CacheParser>) {
        if self.parsers.iter().any(|p| Arc::ptr_eq(p, &parser)) {
            return;
        }
        self.parsers.push(parser);
    }

    /// Unregisters a cache parser. Returns `false` if it was not registered.
    pub fn remove_parser(&mut self, parser: &Arc<dyn CacheParser>) -> bool {
        let before = self.parsers.len();
        self.parsers.retain(|p| !Arc::ptr_eq(p, parser));
        self.parsers.len() != before
    }

    /// The registered parsers, in consultation order.
    pub fn parsers(&self) -> &[Arc<dyn CacheParser>] {
        &self.parsers
    }

    /// Stores `value` under `keys`, fanning it out through the first matching parser.
    ///
    /// Overwriting an entry that holds a *different* value is allowed but logged.
    pub fn set(&mut self, keys: impl Into<Keys>, value: AssetValue) {
        let keys = keys.into().into_vec();

        let cacheable = match self.parsers.iter().find(|parser| parser.test(&value)) {
            Some(parser) => {
                log::trace!("Cache parser '{}' expands {:?}", parser.name(), keys);
                parser.cacheable_assets(&keys, &value)
            }
            None => keys
                .iter()
                .map(|key| (key.clone(), value.clone()))
                .collect(),
        };

        let record = Arc::new(CacheRecord {
            keys: keys.clone(),
            cache_keys: cacheable.keys().cloned().collect(),
        });
        for key in &keys {
            self.records.insert(key.clone(), record.clone());
        }

        for (key, entry) in cacheable {
            if let Some(existing) = self.store.get(&key) {
                if !AssetValue::ptr_eq(existing, &entry) {
                    log::warn!("[Cache] already has key: {key}");
                }
            }
            self.store.insert(key, entry);
        }
    }

    /// Looks up an entry. Missing keys are logged and yield `None`.
    pub fn get(&self, key: &str) -> Option<AssetValue> {
        let value = self.store.get(key).cloned();
        if value.is_none() {
            log::warn!("[Cache] Asset id {key} was not found in the Cache");
        }
        value
    }

    /// Looks up an entry as a typed handle.
    pub fn get_as<T: Asset>(&self, key: &str) -> Option<AssetHandle<T>> {
        self.get(key).and_then(|value| value.downcast::<T>())
    }

    /// Returns `true` if an entry exists for `key`.
    pub fn has(&self, key: &str) -> bool {
        self.store.contains_key(key)
    }

    /// Removes `key` together with every entry created by the same `set` call.
    pub fn remove(&mut self, key: &str) {
        let Some(record) = self.records.get(key).cloned() else {
            log::warn!("[Cache] Asset id {key} was not found in the Cache");
            return;
        };

        for cache_key in &record.cache_keys {
            self.store.remove(cache_key);
        }
        for key in &record.keys {
            self.records.remove(key);
        }
    }

    /// Number of stored entries, fan-out included.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Clears every parser and every entry.
    pub fn reset(&mut self) {
        self.parsers.clear();
        self.store.clear();
        self.records.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Expands a `Pair` into one entry per half, plus the requested keys.
    struct PairParser;

    struct Pair(&'static str, &'static str);
    impl Asset for Pair {}

    impl CacheParser for PairParser {
        fn name(&self) -> &str {
            "pair"
        }

        fn test(&self, value: &AssetValue) -> bool {
            value.is::<Pair>()
        }

        fn cacheable_assets(&self, keys: &[String], value: &AssetValue) -> IndexMap<String, AssetValue> {
            let mut out: IndexMap<_, _> = keys.iter().map(|k| (k.clone(), value.clone())).collect();
            if let Some(pair) = value.downcast_ref::<Pair>() {
                out.insert(pair.0.to_string(), AssetValue::new(pair.0.to_string()));
                out.insert(pair.1.to_string(), AssetValue::new(pair.1.to_string()));
            }
            out
        }
    }

    fn cache_with_pairs() -> Cache {
        let mut cache = Cache::new();
        cache.add_parser(Arc::new(PairParser));
        cache
    }

    #[test]
    fn plain_values_are_stored_under_every_key() {
        let mut cache = Cache::new();
        let value = AssetValue::new("hello".to_string());
        cache.set(["greeting", "hi"], value.clone());

        assert!(AssetValue::ptr_eq(&cache.get("greeting").unwrap(), &value));
        assert!(AssetValue::ptr_eq(&cache.get("hi").unwrap(), &value));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn fan_out_is_removed_symmetrically() {
        let mut cache = cache_with_pairs();
        cache.set("a", AssetValue::new(Pair("left", "right")));

        assert!(cache.has("a"));
        assert_eq!(
            cache.get_as::<String>("right").as_deref().map(String::as_str),
            Some("right")
        );

        cache.remove("a");
        assert!(cache.get("a").is_none());
        assert!(cache.get("left").is_none());
        assert!(cache.get("right").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn removing_any_alias_removes_all_of_them() {
        let mut cache = Cache::new();
        cache.set(["src.png", "hero"], AssetValue::new(1u8.to_string()));
        cache.remove("hero");
        assert!(!cache.has("src.png"));
        assert!(!cache.has("hero"));

        // The record is gone too: a second removal is only a warning.
        cache.remove("src.png");
    }

    #[test]
    fn removing_unknown_key_is_harmless() {
        let mut cache = Cache::new();
        cache.remove("ghost");
        assert!(cache.is_empty());
    }

    #[test]
    fn parsers_are_idempotent_and_removable() {
        let parser: Arc<dyn CacheParser> = Arc::new(PairParser);
        let mut cache = Cache::new();
        cache.add_parser(parser.clone());
        cache.add_parser(parser.clone());
        assert_eq!(cache.parsers().len(), 1);

        assert!(cache.remove_parser(&parser));
        assert!(!cache.remove_parser(&parser));

        cache.set("a", AssetValue::new(Pair("l", "r")));
        assert!(!cache.has("l"));
    }

    #[test]
    fn reset_clears_parsers_and_entries() {
        let mut cache = cache_with_pairs();
        cache.set("a", AssetValue::new(Pair("l", "r")));
        cache.reset();

        assert!(cache.is_empty());
        assert!(cache.parsers().is_empty());
    }
}
