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

//! The AssetAgent is responsible for resolving, loading, and caching assets.

use super::{AssetInitOptions, BackgroundLoader};
use indexmap::IndexMap;
use kiln_core::{
    asset::{Asset, AssetHandle, AssetValue, PreferOrder, ResolvedAsset},
    fetch::Fetch,
    manifest::UnresolvedAsset,
    AssetError, Keys, OneOrMany,
};
use kiln_data::assets::{Cache, SpritesheetCacheParser};
use kiln_lanes::asset_lane::{
    detect_formats, loading::default_parsers, FormatDetectionParser, ImageCodecDetection, Loader,
    Resolver, SpritesheetUrlParser, TextureUrlParser,
};
use parking_lot::{RwLock, RwLockWriteGuard};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// One entry point for every asset operation.
///
/// The agent owns a [`Resolver`], a [`Loader`], a [`Cache`] and a
/// [`BackgroundLoader`] and keeps them consistent: whatever
/// [`load`](Self::load) returns is also in the cache under the asset's
/// source and every one of its keys, and [`unload`](Self::unload) removes
/// it from both the loader and the cache.
///
/// Operations that need the agent to be configured call
/// [`init`](Self::init) with default options when it was not called first.
pub struct AssetAgent {
    resolver: RwLock<Resolver>,
    loader: Loader,
    cache: RwLock<Cache>,
    background: BackgroundLoader,
    detections: RwLock<Vec<Arc<dyn FormatDetectionParser>>>,
    with_defaults: bool,
    initialized: AtomicBool,
}

impl AssetAgent {
    /// Creates an agent fetching through `fetcher`, with the built-in parsers.
    pub fn new(fetcher: Arc<dyn Fetch>) -> Self {
        let agent = Self::build(Loader::new(fetcher), true);
        agent.register_defaults();
        agent
    }

    /// Creates an agent around an existing loader, without any parser.
    pub fn empty(loader: Loader) -> Self {
        Self::build(loader, false)
    }

    fn build(loader: Loader, with_defaults: bool) -> Self {
        Self {
            resolver: RwLock::new(Resolver::new()),
            background: BackgroundLoader::new(loader.clone()),
            loader,
            cache: RwLock::new(Cache::new()),
            detections: RwLock::new(Vec::new()),
            with_defaults,
            initialized: AtomicBool::new(false),
        }
    }

    fn register_defaults(&self) {
        {
            let mut resolver = self.resolver.write();
            resolver.add_url_parser(Arc::new(TextureUrlParser));
            resolver.add_url_parser(Arc::new(SpritesheetUrlParser));
        }
        let registered: Vec<_> = self
            .loader
            .parsers()
            .iter()
            .map(|parser| parser.name().to_string())
            .collect();
        for parser in default_parsers() {
            if !registered.iter().any(|name| name == parser.name()) {
                self.loader.add_parser(parser);
            }
        }
        self.cache.write().add_parser(Arc::new(SpritesheetCacheParser));
        self.detections.write().extend(
            ImageCodecDetection::defaults()
                .into_iter()
                .map(|detection| Arc::new(detection) as Arc<dyn FormatDetectionParser>),
        );
    }

    /// Configures the agent. Only the first call has an effect.
    ///
    /// Registers the manifest, then narrows the preferred texture formats to
    /// those the detections report as supported (unless
    /// [`skip_detections`](AssetInitOptions::skip_detections) is set) and
    /// installs them as the resolver's texture preference.
    pub async fn init(&self, options: AssetInitOptions) -> Result<(), AssetError> {
        if self.initialized.swap(true, Ordering::SeqCst) {
            log::warn!("[AssetAgent] Already initialized, did you load before calling init?");
            return Ok(());
        }
        self.configure(options).await
    }

    async fn ensure_initialized(&self) -> Result<(), AssetError> {
        if self.initialized.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.configure(AssetInitOptions::default()).await
    }

    async fn configure(&self, options: AssetInitOptions) -> Result<(), AssetError> {
        self.background
            .set_max_concurrent(options.background_concurrency);

        {
            let mut resolver = self.resolver.write();
            if let Some(params) = &options.default_search_params {
                resolver.set_default_search_params(params);
            }
            if let Some(base_path) = options.base_path {
                resolver.set_base_path(base_path);
            }
            if let Some(root_path) = options.root_path {
                resolver.set_root_path(root_path);
            }
            if let Some(identifier) = options.bundle_identifier {
                resolver.set_bundle_identifier(identifier);
            }
            if let Some(manifest) = options.manifest {
                resolver.add_manifest(manifest)?;
            }
        }

        let preference = options.texture_preference.unwrap_or_default();
        let formats = if options.skip_detections {
            preference.format
        } else {
            let detections = self.detections.read().clone();
            detect_formats(&preference.format, &detections).await
        };
        log::info!(
            "[AssetAgent] Preferring formats {formats:?} at resolutions {:?}",
            preference.resolution
        );

        self.resolver.write().prefer(
            PreferOrder::new()
                .param("format", formats)
                .param("resolution", preference.resolution),
        );
        Ok(())
    }

    /// Returns `true` once [`init`](Self::init) ran, explicitly or not.
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    /// Registers one logical asset with the resolver.
    pub fn add(&self, asset: impl Into<UnresolvedAsset>) -> Result<(), AssetError> {
        self.resolver.write().add(asset)
    }

    /// Registers an ad-hoc bundle with the resolver.
    pub fn add_bundle(
        &self,
        bundle_id: &str,
        assets: impl IntoIterator<Item = UnresolvedAsset>,
    ) -> Result<(), AssetError> {
        self.resolver.write().add_bundle(bundle_id, assets)
    }

    /// Loads one or several keys and caches the results.
    ///
    /// Keys never added are loaded as URLs. The output mirrors the input:
    /// one key yields one value, a list yields a map keyed by the requested
    /// keys. A `None` value means no parser could load the source; such
    /// values are not cached.
    pub async fn load(
        &self,
        keys: impl Into<Keys>,
    ) -> Result<OneOrMany<Option<AssetValue>>, AssetError> {
        self.load_with_progress(keys, |_| {}).await
    }

    /// Like [`load`](Self::load), reporting progress from 0 to 1.
    pub async fn load_with_progress<F>(
        &self,
        keys: impl Into<Keys>,
        on_progress: F,
    ) -> Result<OneOrMany<Option<AssetValue>>, AssetError>
    where
        F: FnMut(f64) + Send,
    {
        self.ensure_initialized().await?;

        let keys = keys.into();
        let resolved: Vec<(String, Arc<ResolvedAsset>)> = {
            let mut resolver = self.resolver.write();
            keys.iter()
                .map(|key| (key.clone(), resolver.resolve(key.as_str())))
                .filter_map(|(key, resolved)| resolved.one().map(|asset| (key, asset)))
                .collect()
        };

        let out = self.load_resolved(resolved, on_progress).await?;
        Ok(keys.mirror(out))
    }

    /// Loads every member of one or several bundles.
    ///
    /// Members are keyed by their bare alias. A list of bundle ids yields the
    /// per-bundle maps keyed by bundle id.
    pub async fn load_bundle(
        &self,
        bundle_ids: impl Into<Keys>,
    ) -> Result<OneOrMany<IndexMap<String, Option<AssetValue>>>, AssetError> {
        self.load_bundle_with_progress(bundle_ids, |_| {}).await
    }

    /// Like [`load_bundle`](Self::load_bundle), reporting progress over all
    /// the requested bundles together.
    pub async fn load_bundle_with_progress<F>(
        &self,
        bundle_ids: impl Into<Keys>,
        on_progress: F,
    ) -> Result<OneOrMany<IndexMap<String, Option<AssetValue>>>, AssetError>
    where
        F: FnMut(f64) + Send,
    {
        self.ensure_initialized().await?;

        let bundle_ids = bundle_ids.into();
        let bundles = self.resolve_bundles(&bundle_ids)?;

        // One batch for every member, tagged with its bundle.
        let resolved: Vec<(String, Arc<ResolvedAsset>)> = bundles
            .iter()
            .flat_map(|(bundle_id, members)| {
                members
                    .iter()
                    .map(move |(alias, asset)| (tagged(bundle_id, alias), asset.clone()))
            })
            .collect();
        let mut loaded = self.load_resolved(resolved, on_progress).await?;

        let out: IndexMap<String, IndexMap<String, Option<AssetValue>>> = bundles
            .into_iter()
            .map(|(bundle_id, members)| {
                let values = members
                    .keys()
                    .map(|alias| {
                        let value = loaded.shift_remove(&tagged(&bundle_id, alias)).flatten();
                        (alias.clone(), value)
                    })
                    .collect();
                (bundle_id, values)
            })
            .collect();

        Ok(bundle_ids.mirror(out))
    }

    /// Queues keys for loading in the background.
    ///
    /// Background results are not cached until the keys are [`load`](Self::load)ed,
    /// which then completes without fetching again.
    pub async fn background_load(&self, keys: impl Into<Keys>) -> Result<(), AssetError> {
        self.ensure_initialized().await?;

        let assets: Vec<ResolvedAsset> = {
            let mut resolver = self.resolver.write();
            keys.into()
                .iter()
                .filter_map(|key| resolver.resolve(key.as_str()).one())
                .map(|asset| (*asset).clone())
                .collect()
        };
        self.background.add(assets);
        Ok(())
    }

    /// Queues every member of one or several bundles for loading in the background.
    pub async fn background_load_bundle(
        &self,
        bundle_ids: impl Into<Keys>,
    ) -> Result<(), AssetError> {
        self.ensure_initialized().await?;

        let bundles = self.resolve_bundles(&bundle_ids.into())?;
        self.background.add(
            bundles
                .into_values()
                .flat_map(IndexMap::into_values)
                .map(|asset| (*asset).clone()),
        );
        Ok(())
    }

    /// Looks up loaded assets. Missing keys are logged and yield `None`.
    pub fn get(&self, keys: impl Into<Keys>) -> OneOrMany<Option<AssetValue>> {
        let cache = self.cache.read();
        match keys.into() {
            Keys::One(key) => OneOrMany::One(cache.get(&key)),
            Keys::Many(keys) => OneOrMany::Many(
                keys.into_iter()
                    .map(|key| {
                        let value = cache.get(&key);
                        (key, value)
                    })
                    .collect(),
            ),
        }
    }

    /// Looks up a loaded asset as a typed handle.
    pub fn get_as<T: Asset>(&self, key: &str) -> Option<AssetHandle<T>> {
        self.cache.read().get_as::<T>(key)
    }

    /// Removes assets from the cache and unloads them.
    ///
    /// Every cache entry created together with an asset goes with it, so the
    /// frames of an unloaded spritesheet are no longer addressable.
    pub async fn unload(&self, keys: impl Into<Keys>) -> Result<(), AssetError> {
        self.ensure_initialized().await?;

        let assets: Vec<Arc<ResolvedAsset>> = {
            let mut resolver = self.resolver.write();
            keys.into()
                .iter()
                .filter_map(|key| resolver.resolve(key.as_str()).one())
                .collect()
        };
        self.unload_resolved(assets).await;
        Ok(())
    }

    /// Unloads every member of one or several bundles.
    pub async fn unload_bundle(&self, bundle_ids: impl Into<Keys>) -> Result<(), AssetError> {
        self.ensure_initialized().await?;

        let bundles = self.resolve_bundles(&bundle_ids.into())?;
        let assets = bundles
            .into_values()
            .flat_map(IndexMap::into_values)
            .collect();
        self.unload_resolved(assets).await;
        Ok(())
    }

    /// Forgets every key, load, and cache entry, and drops the configuration.
    ///
    /// An agent built with [`new`](Self::new) gets its built-in parsers back;
    /// the next operation initializes it again.
    pub fn reset(&self) {
        self.background.clear();
        self.resolver.write().reset();
        self.loader.reset();
        self.cache.write().reset();
        self.detections.write().clear();
        if self.with_defaults {
            self.register_defaults();
        }
        self.initialized.store(false, Ordering::SeqCst);
        log::info!("[AssetAgent] Reset");
    }

    /// Exclusive access to the resolver.
    pub fn resolver(&self) -> RwLockWriteGuard<'_, Resolver> {
        self.resolver.write()
    }

    /// The loader shared by foreground and background loads.
    pub fn loader(&self) -> &Loader {
        &self.loader
    }

    /// Exclusive access to the cache.
    pub fn cache(&self) -> RwLockWriteGuard<'_, Cache> {
        self.cache.write()
    }

    /// The background loader.
    pub fn background(&self) -> &BackgroundLoader {
        &self.background
    }

    /// Registers a format detection consulted by [`init`](Self::init).
    pub fn add_detection(&self, detection: Arc<dyn FormatDetectionParser>) {
        self.detections.write().push(detection);
    }

    fn resolve_bundles(
        &self,
        bundle_ids: &Keys,
    ) -> Result<IndexMap<String, IndexMap<String, Arc<ResolvedAsset>>>, AssetError> {
        let mut resolver = self.resolver.write();
        Ok(match resolver.resolve_bundle(bundle_ids.clone())? {
            OneOrMany::One(members) => bundle_ids
                .iter()
                .map(|bundle_id| (bundle_id.clone(), members.clone()))
                .collect(),
            OneOrMany::Many(bundles) => bundles,
        })
    }

    /// Loads resolved assets and caches each under its source and aliases.
    ///
    /// The output is keyed by the tag paired with each asset.
    async fn load_resolved<F>(
        &self,
        resolved: Vec<(String, Arc<ResolvedAsset>)>,
        on_progress: F,
    ) -> Result<IndexMap<String, Option<AssetValue>>, AssetError>
    where
        F: FnMut(f64) + Send,
    {
        let assets = resolved.iter().map(|(_, asset)| (**asset).clone()).collect();
        let loaded = {
            let _foreground = self.background.foreground();
            self.loader.load_many(assets, on_progress).await?
        };

        let mut cache = self.cache.write();
        Ok(resolved
            .into_iter()
            .map(|(tag, asset)| {
                let value = loaded.get(&asset.src).cloned().flatten();
                if let Some(value) = &value {
                    let mut keys = vec![asset.src.clone()];
                    keys.extend(asset.alias.iter().cloned());
                    cache.set(keys, value.clone());
                }
                (tag, value)
            })
            .collect())
    }

    async fn unload_resolved(&self, assets: Vec<Arc<ResolvedAsset>>) {
        {
            let mut cache = self.cache.write();
            for asset in &assets {
                if cache.has(&asset.src) {
                    cache.remove(&asset.src);
                }
            }
        }
        self.loader.unload(assets).await;
    }
}

impl std::fmt::Debug for AssetAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetAgent")
            .field("initialized", &self.is_initialized())
            .field("loader", &self.loader)
            .field("cached", &self.cache.read().len())
            .field("background", &self.background)
            .finish()
    }
}

/// Key of a bundle member inside one combined load.
fn tagged(bundle_id: &str, alias: &str) -> String {
    format!("{bundle_id}\u{0}{alias}")
}
