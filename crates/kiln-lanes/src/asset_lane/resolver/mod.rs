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

//! Maps developer facing keys to concrete asset sources.
//!
//! The resolver never performs I/O. It owns the table of registered keys and
//! their candidate sources, the preference rules used to pick one candidate,
//! and the bundles declared through manifests.

mod url_parser;
mod variations;

pub use url_parser::*;

use indexmap::IndexMap;
use kiln_core::{
    asset::{dimension_matches, AssetSrc, PreferOrder, ResolvedAsset},
    manifest::{AssetsManifest, UnresolvedAsset},
    path, AssetError, Keys, OneOrMany,
};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{collections::HashMap, sync::Arc};
use variations::string_variations;

/// Characters `encodeURIComponent` leaves untouched.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// How the keys of bundle members are namespaced.
///
/// Every member of bundle `ui` declared as `button` is also registered as
/// `ui<connector>button`, so two bundles may use the same bare alias.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleIdentifier {
    /// Joins the bundle id and the asset alias.
    pub connector: String,
}

impl Default for BundleIdentifier {
    fn default() -> Self {
        Self {
            connector: "-".to_string(),
        }
    }
}

impl BundleIdentifier {
    /// The namespaced key of `alias` inside `bundle`.
    pub fn create_id(&self, bundle: &str, alias: &str) -> String {
        format!("{bundle}{}{alias}", self.connector)
    }

    /// Strips the namespace added by [`create_id`](Self::create_id).
    pub fn extract_asset_id<'a>(&self, bundle: &str, id: &'a str) -> &'a str {
        id.strip_prefix(bundle)
            .and_then(|rest| rest.strip_prefix(self.connector.as_str()))
            .unwrap_or(id)
    }
}

/// Resolves keys to one concrete [`ResolvedAsset`] each.
///
/// A key may be registered with several candidates (the same image in
/// several formats and densities). [`resolve`](Resolver::resolve) picks one
/// with the registered [`PreferOrder`]s and memoizes it: until the next
/// [`prefer`](Resolver::prefer), re-[`add`](Resolver::add) of the key, or
/// [`reset`](Resolver::reset), the same `Arc` is returned.
///
/// Keys that were never added resolve to themselves, so raw URLs can be used
/// wherever a key is expected.
#[derive(Default)]
pub struct Resolver {
    asset_map: HashMap<String, Vec<Arc<ResolvedAsset>>>,
    preferred_order: Vec<PreferOrder>,
    parsers: Vec<Arc<dyn ResolveUrlParser>>,
    resolver_hash: HashMap<String, Arc<ResolvedAsset>>,
    base_path: Option<String>,
    root_path: Option<String>,
    default_search_params: Option<String>,
    manifest: Option<AssetsManifest>,
    bundles: IndexMap<String, Vec<String>>,
    bundle_identifier: BundleIdentifier,
}

impl Resolver {
    /// Creates an empty resolver without URL parsers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Changes how bundle member keys are namespaced.
    pub fn set_bundle_identifier(&mut self, identifier: BundleIdentifier) {
        self.bundle_identifier = identifier;
    }

    /// The current bundle namespacing.
    pub fn bundle_identifier(&self) -> &BundleIdentifier {
        &self.bundle_identifier
    }

    /// Sets the base relative sources of later `add`s are made absolute against.
    pub fn set_base_path(&mut self, base_path: impl Into<String>) {
        self.base_path = Some(base_path.into());
    }

    /// The base path, if any.
    pub fn base_path(&self) -> Option<&str> {
        self.base_path.as_deref()
    }

    /// Sets the root `/`-prefixed sources of later `add`s are resolved against.
    pub fn set_root_path(&mut self, root_path: impl Into<String>) {
        self.root_path = Some(root_path.into());
    }

    /// The root path, if any.
    pub fn root_path(&self) -> Option<&str> {
        self.root_path.as_deref()
    }

    /// Query parameters appended to every source resolved from now on.
    pub fn set_default_search_params(&mut self, params: &IndexMap<String, String>) {
        let encoded = params
            .iter()
            .map(|(key, value)| {
                format!(
                    "{}={}",
                    utf8_percent_encode(key, URI_COMPONENT),
                    utf8_percent_encode(value, URI_COMPONENT)
                )
            })
            .collect::<Vec<_>>()
            .join("&");
        self.default_search_params = (!encoded.is_empty()).then_some(encoded);
    }

    /// Appends a preference rule and forgets every memoized resolution.
    ///
    /// A rule without `priority` filters its dimensions in the order of its
    /// `params`.
    pub fn prefer(&mut self, mut order: PreferOrder) {
        if order.priority.is_empty() {
            order.priority = order.params.keys().cloned().collect();
        }
        self.preferred_order.push(order);
        self.resolver_hash.clear();
    }

    /// The registered preference rules, in registration order.
    pub fn preferred_order(&self) -> &[PreferOrder] {
        &self.preferred_order
    }

    /// Registers a URL parser. Registering the same parser twice is a no-op.
    pub fn add_url_parser(&mut self, parser: Arc<dyn ResolveUrlParser>) {
        if self.parsers.iter().any(|existing| Arc::ptr_eq(existing, &parser)) {
            return;
        }
        self.parsers.push(parser);
    }

    /// The registered URL parsers, in consultation order.
    pub fn url_parsers(&self) -> &[Arc<dyn ResolveUrlParser>] {
        &self.parsers
    }

    /// Registers every bundle of `manifest`.
    pub fn add_manifest(&mut self, manifest: AssetsManifest) -> Result<(), AssetError> {
        if self.manifest.is_some() {
            log::warn!("[Resolver] Manifest already exists, this will be overwritten");
        }
        for bundle in &manifest.bundles {
            self.add_bundle(&bundle.name, bundle.assets.iter().cloned())?;
        }
        self.manifest = Some(manifest);
        Ok(())
    }

    /// The manifest registered through [`add_manifest`](Self::add_manifest).
    pub fn manifest(&self) -> Option<&AssetsManifest> {
        self.manifest.as_ref()
    }

    /// Registers a bundle. Every member is reachable by its bare aliases and by
    /// the namespaced ids of [`BundleIdentifier`].
    pub fn add_bundle(
        &mut self,
        bundle_id: &str,
        assets: impl IntoIterator<Item = UnresolvedAsset>,
    ) -> Result<(), AssetError> {
        let mut member_ids = Vec::new();
        for mut asset in assets {
            let namespaced: Vec<String> = asset
                .name
                .iter()
                .map(|alias| self.bundle_identifier.create_id(bundle_id, alias))
                .collect();
            member_ids.extend(namespaced.iter().cloned());
            asset.name.extend(namespaced);
            self.add(asset)?;
        }
        self.bundles.insert(bundle_id.to_string(), member_ids);
        Ok(())
    }

    /// Returns `true` if `bundle_id` was registered.
    pub fn has_bundle(&self, bundle_id: &str) -> bool {
        self.bundles.contains_key(bundle_id)
    }

    /// Registers the candidate sources of one logical asset under its keys.
    ///
    /// String sources are brace expanded (`hero.{webp,png}`) and described by
    /// the first URL parser accepting them. Re-adding a key replaces its
    /// candidates with a warning.
    pub fn add(&mut self, asset: impl Into<UnresolvedAsset>) -> Result<(), AssetError> {
        let asset = asset.into();
        if asset.name.is_empty() {
            return Err(AssetError::MissingAlias(asset.srcs.describe()));
        }

        for key in &asset.name {
            if self.asset_map.contains_key(key) {
                log::warn!("[Resolver] already has key: {key} overwriting");
            }
        }

        let mut candidates = Vec::new();
        for src in asset.srcs.iter() {
            match src {
                AssetSrc::Url(url) => {
                    for variation in string_variations(url) {
                        let described = self
                            .parsers
                            .iter()
                            .find(|parser| parser.test(&variation))
                            .map(|parser| parser.parse(&variation))
                            .unwrap_or_else(|| ResolvedAsset::new(variation.as_str()));
                        candidates.push(self.build_resolved_asset(
                            described,
                            &asset.name,
                            asset.data.as_ref(),
                            asset.format.as_deref(),
                            asset.load_parser.as_deref(),
                        ));
                    }
                }
                AssetSrc::Descriptor(descriptor) => {
                    let data = descriptor.data.as_ref().or(asset.data.as_ref()).cloned();
                    let format = descriptor.format.clone().or_else(|| asset.format.clone());
                    let load_parser = descriptor
                        .load_parser
                        .clone()
                        .or_else(|| asset.load_parser.clone());
                    candidates.push(self.build_resolved_asset(
                        descriptor.clone(),
                        &asset.name,
                        data.as_ref(),
                        format.as_deref(),
                        load_parser.as_deref(),
                    ));
                }
            }
        }

        let candidates: Vec<_> = candidates.into_iter().map(Arc::new).collect();
        for key in &asset.name {
            self.resolver_hash.remove(key);
            self.asset_map.insert(key.clone(), candidates.clone());
        }
        Ok(())
    }

    /// Returns `true` if `key` was added.
    pub fn has_key(&self, key: &str) -> bool {
        self.asset_map.contains_key(key)
    }

    /// Resolves one key, or a list of keys into a map keyed by key.
    pub fn resolve(&mut self, keys: impl Into<Keys>) -> OneOrMany<Arc<ResolvedAsset>> {
        match keys.into() {
            Keys::One(key) => OneOrMany::One(self.resolve_key(&key)),
            Keys::Many(keys) => OneOrMany::Many(
                keys.into_iter()
                    .map(|key| {
                        let resolved = self.resolve_key(&key);
                        (key, resolved)
                    })
                    .collect(),
            ),
        }
    }

    /// Like [`resolve`](Self::resolve), keeping only the sources.
    pub fn resolve_url(&mut self, keys: impl Into<Keys>) -> OneOrMany<String> {
        self.resolve(keys).map(|asset| asset.src.clone())
    }

    /// Resolves every member of one or several bundles.
    ///
    /// Members are keyed by their bare alias. Each bundle yields a map; a list
    /// of bundle ids yields a map of those maps keyed by bundle id.
    pub fn resolve_bundle(
        &mut self,
        bundle_ids: impl Into<Keys>,
    ) -> Result<OneOrMany<IndexMap<String, Arc<ResolvedAsset>>>, AssetError> {
        if self.manifest.is_none() && self.bundles.is_empty() {
            return Err(AssetError::MissingManifest);
        }

        let bundle_ids = bundle_ids.into();
        let mut out = IndexMap::new();
        for bundle_id in bundle_ids.iter() {
            let member_ids = self
                .bundles
                .get(bundle_id)
                .cloned()
                .ok_or_else(|| AssetError::UnknownBundle(bundle_id.clone()))?;

            let mut members = IndexMap::with_capacity(member_ids.len());
            for member_id in &member_ids {
                let alias = self
                    .bundle_identifier
                    .extract_asset_id(bundle_id, member_id)
                    .to_string();
                members.insert(alias, self.resolve_key(member_id));
            }
            out.insert(bundle_id.clone(), members);
        }

        Ok(bundle_ids.mirror(out))
    }

    /// Returns the resolver to its freshly constructed state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn resolve_key(&mut self, key: &str) -> Arc<ResolvedAsset> {
        if let Some(resolved) = self.resolver_hash.get(key) {
            return resolved.clone();
        }

        let resolved = match self.asset_map.get(key) {
            Some(candidates) if !candidates.is_empty() => self.select(candidates),
            _ => Arc::new(self.build_resolved_asset(
                ResolvedAsset::new(key),
                &[key.to_string()],
                None,
                None,
                None,
            )),
        };

        self.resolver_hash.insert(key.to_string(), resolved.clone());
        resolved
    }

    /// The first rule preferring the format of a candidate, in candidate order.
    fn preferred_order_for(&self, candidates: &[Arc<ResolvedAsset>]) -> Option<&PreferOrder> {
        candidates
            .iter()
            .filter_map(|candidate| candidate.format.as_deref())
            .find_map(|format| {
                self.preferred_order
                    .iter()
                    .find(|order| order.prefers_format(format))
            })
            .or_else(|| self.preferred_order.first())
    }

    /// Progressively narrows `candidates` dimension by dimension.
    ///
    /// A preferred value that matches no remaining candidate is skipped, so the
    /// set never becomes empty.
    fn select(&self, candidates: &[Arc<ResolvedAsset>]) -> Arc<ResolvedAsset> {
        let mut remaining: Vec<&Arc<ResolvedAsset>> = candidates.iter().collect();

        if let Some(order) = self.preferred_order_for(candidates) {
            for dimension in &order.priority {
                let Some(values) = order.params.get(dimension) else {
                    continue;
                };
                for preferred in values {
                    let narrowed: Vec<_> = remaining
                        .iter()
                        .copied()
                        .filter(|candidate| {
                            candidate
                                .dimension(dimension)
                                .is_some_and(|value| dimension_matches(&value, preferred))
                        })
                        .collect();
                    if !narrowed.is_empty() {
                        remaining = narrowed;
                    }
                }
            }
        }

        remaining
            .first()
            .copied()
            .unwrap_or(&candidates[0])
            .clone()
    }

    fn build_resolved_asset(
        &self,
        mut asset: ResolvedAsset,
        aliases: &[String],
        data: Option<&Value>,
        format: Option<&str>,
        load_parser: Option<&str>,
    ) -> ResolvedAsset {
        if self.base_path.is_some() || self.root_path.is_some() {
            asset.src = path::to_absolute(
                &asset.src,
                self.base_path.as_deref(),
                self.root_path.as_deref(),
            );
        }

        asset.alias = aliases.to_vec();

        if let Some(params) = &self.default_search_params {
            if !path::is_data_url(&asset.src) {
                asset.src = path::append_search_params(&asset.src, params);
            }
        }

        asset.data = merge_data(data, asset.data.take());

        if let Some(load_parser) = load_parser {
            asset.load_parser = Some(load_parser.to_string());
        }

        asset.format = format
            .map(str::to_string)
            .or(asset.format)
            .or_else(|| path::url_extension(&asset.src));

        asset
    }
}

/// Overlays the descriptor's own `data` on the asset-level `data`.
fn merge_data(base: Option<&Value>, own: Option<Value>) -> Option<Value> {
    match (base, own) {
        (Some(Value::Object(base)), Some(Value::Object(own))) => {
            let mut merged = base.clone();
            merged.extend(own);
            Some(Value::Object(merged))
        }
        (base, own) => own.or_else(|| base.cloned()),
    }
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("keys", &self.asset_map.len())
            .field("preferred_order", &self.preferred_order)
            .field("base_path", &self.base_path)
            .field("root_path", &self.root_path)
            .field("bundles", &self.bundles.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_core::asset::RESOLUTION_PROPERTY;
    use serde_json::json;

    fn candidate(src: &str, resolution: f64, format: &str) -> ResolvedAsset {
        ResolvedAsset::new(src)
            .with_format(format)
            .with_property(RESOLUTION_PROPERTY, resolution)
    }

    #[test]
    fn resolution_is_memoized_until_prefer() {
        let mut resolver = Resolver::new();
        resolver
            .add(UnresolvedAsset::new("hero", "hero.png"))
            .unwrap();

        let first = resolver.resolve("hero").one().unwrap();
        let second = resolver.resolve("hero").one().unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        resolver.prefer(PreferOrder::new().param("format", ["png"]));
        let third = resolver.resolve("hero").one().unwrap();
        assert_eq!(third.src, "hero.png");
        assert_eq!(third.alias, ["hero"]);
    }

    #[test]
    fn resolution_narrows_dimension_by_dimension() {
        let mut resolver = Resolver::new();
        resolver
            .add(UnresolvedAsset::new(
                "hero",
                vec![
                    candidate("hero.png", 1.0, "png"),
                    candidate("hero@2x.png", 2.0, "png"),
                    candidate("hero.webp", 1.0, "webp"),
                ],
            ))
            .unwrap();
        resolver.prefer(
            PreferOrder::new()
                .priority(["resolution", "format"])
                .param("resolution", [2, 1])
                .param("format", ["webp", "png"]),
        );

        assert_eq!(resolver.resolve("hero").one().unwrap().src, "hero@2x.png");
    }

    #[test]
    fn format_first_priority_changes_the_pick() {
        let mut resolver = Resolver::new();
        resolver.add_url_parser(Arc::new(TextureUrlParser));
        resolver
            .add(UnresolvedAsset::new("hero", "hero@{1,2}x.{png,webp}"))
            .unwrap();
        resolver.prefer(
            PreferOrder::new()
                .param("format", ["webp", "png"])
                .param("resolution", [2, 1]),
        );

        assert_eq!(resolver.resolve_url("hero").one().unwrap(), "hero@2x.webp");
    }

    #[test]
    fn unmatched_preferences_fall_back_to_the_first_candidate() {
        let mut resolver = Resolver::new();
        resolver
            .add(UnresolvedAsset::new("bg", vec!["bg.jpg", "bg.png"]))
            .unwrap();
        resolver.prefer(PreferOrder::new().param("format", ["avif"]));

        assert_eq!(resolver.resolve_url("bg").one().unwrap(), "bg.jpg");
    }

    #[test]
    fn preference_is_chosen_by_candidate_format() {
        let mut resolver = Resolver::new();
        resolver.prefer(PreferOrder::new().param("format", ["json"]));
        resolver.prefer(PreferOrder::new().param("format", ["webp", "png"]));
        resolver
            .add(UnresolvedAsset::new("bg", vec!["bg.png", "bg.webp"]))
            .unwrap();

        assert_eq!(resolver.resolve_url("bg").one().unwrap(), "bg.webp");
    }

    #[test]
    fn unknown_keys_pass_through() {
        let mut resolver = Resolver::new();
        resolver.set_base_path("http://cdn.test/assets/");
        let asset = resolver.resolve("img/hero.png").one().unwrap();
        assert_eq!(asset.src, "http://cdn.test/assets/img/hero.png");
        assert_eq!(asset.alias, ["img/hero.png"]);
        assert_eq!(asset.format.as_deref(), Some("png"));
    }

    #[test]
    fn output_shape_mirrors_input() {
        let mut resolver = Resolver::new();
        resolver.add(UnresolvedAsset::new("k", "k.png")).unwrap();

        assert!(matches!(resolver.resolve("k"), OneOrMany::One(_)));
        let many = resolver.resolve(vec!["k"]).many().unwrap();
        assert_eq!(many["k"].src, "k.png");
    }

    #[test]
    fn descriptor_fields_override_asset_level_fields() {
        let mut resolver = Resolver::new();
        let asset = UnresolvedAsset {
            format: Some("png".into()),
            load_parser: Some("texture".into()),
            ..UnresolvedAsset::new(
                "icon",
                vec![ResolvedAsset::new("icon.bin")
                    .with_format("ktx")
                    .with_data(json!({ "mips": true }))],
            )
            .with_data(json!({ "mips": false, "premultiply": true }))
        };
        resolver.add(asset).unwrap();

        let resolved = resolver.resolve("icon").one().unwrap();
        assert_eq!(resolved.format.as_deref(), Some("ktx"));
        assert_eq!(resolved.load_parser.as_deref(), Some("texture"));
        assert_eq!(resolved.data, Some(json!({ "mips": true })));
    }

    #[test]
    fn readding_a_key_replaces_its_candidates() {
        let mut resolver = Resolver::new();
        resolver.add(UnresolvedAsset::new("k", "a.png")).unwrap();
        assert_eq!(resolver.resolve_url("k").one().unwrap(), "a.png");

        resolver.add(UnresolvedAsset::new("k", "b.png")).unwrap();
        assert_eq!(resolver.resolve_url("k").one().unwrap(), "b.png");
    }

    #[test]
    fn empty_keys_are_rejected() {
        let mut resolver = Resolver::new();
        let result = resolver.add(UnresolvedAsset::new(Vec::<String>::new(), "a.png"));
        assert!(matches!(result, Err(AssetError::MissingAlias(src)) if src == "a.png"));
    }

    #[test]
    fn default_search_params_are_appended() {
        let mut resolver = Resolver::new();
        let mut params = IndexMap::new();
        params.insert("v".to_string(), "1 2".to_string());
        resolver.set_default_search_params(&params);
        resolver.add(UnresolvedAsset::new("a", "a.png?x=1")).unwrap();

        assert_eq!(resolver.resolve_url("a").one().unwrap(), "a.png?x=1&v=1%202");
        assert_eq!(resolver.resolve_url("b.png").one().unwrap(), "b.png?v=1%202");
    }

    #[test]
    fn bundles_resolve_by_bare_alias() {
        let mut resolver = Resolver::new();
        assert!(matches!(
            resolver.resolve_bundle("ui"),
            Err(AssetError::MissingManifest)
        ));

        let manifest: AssetsManifest = serde_json::from_value(json!({
            "bundles": [
                { "name": "ui", "assets": [
                    { "name": "button", "srcs": "button.png" },
                    { "name": ["panel", "frame"], "srcs": ["panel.png"] }
                ] },
                { "name": "game", "assets": [ { "name": "button", "srcs": "game-button.png" } ] }
            ]
        }))
        .unwrap();
        resolver.add_manifest(manifest).unwrap();

        let ui = resolver.resolve_bundle("ui").unwrap().one().unwrap();
        let keys: Vec<_> = ui.keys().map(String::as_str).collect();
        assert_eq!(keys, ["button", "panel", "frame"]);
        assert_eq!(ui["frame"].src, "panel.png");

        // The bare alias belongs to the last bundle that declared it.
        assert_eq!(resolver.resolve_url("button").one().unwrap(), "game-button.png");
        assert_eq!(resolver.resolve_url("ui-button").one().unwrap(), "button.png");

        let both = resolver.resolve_bundle(vec!["ui", "game"]).unwrap().many().unwrap();
        assert_eq!(both["game"]["button"].src, "game-button.png");

        assert!(matches!(
            resolver.resolve_bundle("missing"),
            Err(AssetError::UnknownBundle(id)) if id == "missing"
        ));
    }

    #[test]
    fn custom_connector_namespaces_members() {
        let mut resolver = Resolver::new();
        resolver.set_bundle_identifier(BundleIdentifier {
            connector: "::".into(),
        });
        resolver
            .add_bundle("hud", [UnresolvedAsset::new("heart", "heart.png")])
            .unwrap();

        assert!(resolver.has_key("hud::heart"));
        assert!(resolver.has_bundle("hud"));
        let hud = resolver.resolve_bundle("hud").unwrap().one().unwrap();
        assert_eq!(hud["heart"].alias, ["heart", "hud::heart"]);
    }

    #[test]
    fn reset_returns_to_construction_state() {
        let mut resolver = Resolver::new();
        resolver.set_base_path("assets");
        resolver.add_url_parser(Arc::new(TextureUrlParser));
        resolver.add(UnresolvedAsset::new("k", "k.png")).unwrap();
        resolver.prefer(PreferOrder::new().param("format", ["png"]));

        resolver.reset();
        assert!(!resolver.has_key("k"));
        assert!(resolver.url_parsers().is_empty());
        assert!(resolver.preferred_order().is_empty());
        assert_eq!(resolver.resolve_url("k").one().unwrap(), "k");
    }
}
