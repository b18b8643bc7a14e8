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

//! The loading pipeline.

use super::LoaderParser;
use anyhow::Context;
use futures::{
    future::{BoxFuture, Shared},
    stream::FuturesUnordered,
    FutureExt, StreamExt,
};
use indexmap::IndexMap;
use kiln_core::{
    asset::{AssetValue, ResolvedAsset},
    error::share_error,
    fetch::Fetch,
    path, AssetError, AssetRequest, OneOrMany, SharedError,
};
use parking_lot::{Mutex, RwLock};
use std::{collections::HashMap, sync::Arc};
use tokio::runtime::Handle;

/// What a finished load produced.
#[derive(Clone, Default)]
pub struct LoadOutcome {
    /// The final value, or `None` if no parser could load the URL.
    pub value: Option<AssetValue>,
    /// The last parser that produced `value`. Its unload stage releases it.
    pub owner: Option<Arc<dyn LoaderParser>>,
}

/// A load shared by every caller requesting the same absolute URL.
pub type LoadPromise = Shared<BoxFuture<'static, Result<LoadOutcome, SharedError>>>;

struct LoaderInner {
    parsers: RwLock<Vec<Arc<dyn LoaderParser>>>,
    promise_cache: Mutex<HashMap<String, LoadPromise>>,
    fetcher: Arc<dyn Fetch>,
    base_url: RwLock<Option<String>>,
}

/// Loads assets exactly once per absolute URL through a chain of parsers.
///
/// `Loader` is a cheap handle: clones share the same registry and in-flight
/// map, which is what lets parse stages load dependent assets recursively.
///
/// For a URL that is not loaded yet, the pipeline is:
///
/// 1. the parser named by the descriptor's `load_parser`, or else the first
///    parser whose [`LoadStage::test`](super::LoadStage::test) accepts the URL,
///    loads the raw value. Without such a parser the load yields `None`;
/// 2. every parser whose [`ParseStage::test_parse`](super::ParseStage::test_parse)
///    accepts the current value transforms it in turn and becomes its owner.
///
/// The whole pipeline is spawned on the current tokio runtime and stored in
/// the in-flight map under the same lock, so concurrent requests for the same
/// URL all await the one shared task, and the task runs to completion even if
/// every caller gives up on it.
#[derive(Clone)]
pub struct Loader {
    inner: Arc<LoaderInner>,
}

impl Loader {
    /// Creates a loader without parsers.
    pub fn new(fetcher: Arc<dyn Fetch>) -> Self {
        Self {
            inner: Arc::new(LoaderInner {
                parsers: RwLock::new(Vec::new()),
                promise_cache: Mutex::new(HashMap::new()),
                fetcher,
                base_url: RwLock::new(None),
            }),
        }
    }

    /// Sets the base relative sources are made absolute against.
    pub fn with_base_url(self, base_url: impl Into<String>) -> Self {
        self.set_base_url(Some(base_url.into()));
        self
    }

    /// Replaces the base relative sources are made absolute against.
    pub fn set_base_url(&self, base_url: Option<String>) {
        *self.inner.base_url.write() = base_url;
    }

    /// The fetch capability shared by every parser.
    pub fn fetcher(&self) -> &Arc<dyn Fetch> {
        &self.inner.fetcher
    }

    /// Registers a parser in its priority tier, after the parsers already there.
    pub fn add_parser(&self, parser: Arc<dyn LoaderParser>) {
        let mut parsers = self.inner.parsers.write();
        if parsers.iter().any(|existing| existing.name() == parser.name()) {
            log::warn!(
                "[Loader] A parser named '{}' is already registered",
                parser.name()
            );
        }
        parsers.push(parser);
        // Stable: insertion order is kept within a tier.
        parsers.sort_by_key(|parser| std::cmp::Reverse(parser.priority()));
    }

    /// Unregisters every parser named `name`. Returns `true` if one was removed.
    pub fn remove_parser(&self, name: &str) -> bool {
        let mut parsers = self.inner.parsers.write();
        let before = parsers.len();
        parsers.retain(|parser| parser.name() != name);
        parsers.len() != before
    }

    /// A snapshot of the registry, in consultation order.
    pub fn parsers(&self) -> Vec<Arc<dyn LoaderParser>> {
        self.inner.parsers.read().clone()
    }

    /// Finds a registered parser by name.
    pub fn parser(&self, name: &str) -> Option<Arc<dyn LoaderParser>> {
        self.inner
            .parsers
            .read()
            .iter()
            .find(|parser| parser.name() == name)
            .cloned()
    }

    /// The key of `src` in the in-flight map.
    pub fn absolute_url(&self, src: &str) -> String {
        path::to_absolute(src, self.inner.base_url.read().as_deref(), None)
    }

    /// Returns `true` if `src` is loading or loaded.
    pub fn is_loaded(&self, src: &str) -> bool {
        let url = self.absolute_url(src);
        self.inner.promise_cache.lock().contains_key(&url)
    }

    /// Forgets every load. Registered parsers are kept.
    pub fn reset(&self) {
        self.inner.promise_cache.lock().clear();
    }

    /// Loads one or several assets.
    ///
    /// A single source yields [`OneOrMany::One`]; a list yields
    /// [`OneOrMany::Many`] keyed by each descriptor's `src`, in request order.
    pub async fn load(
        &self,
        request: impl Into<AssetRequest>,
    ) -> Result<OneOrMany<Option<AssetValue>>, AssetError> {
        self.load_with_progress(request, |_| {}).await
    }

    /// Like [`load`](Self::load), calling `on_progress` after each completed asset.
    pub async fn load_with_progress<F>(
        &self,
        request: impl Into<AssetRequest>,
        on_progress: F,
    ) -> Result<OneOrMany<Option<AssetValue>>, AssetError>
    where
        F: FnMut(f64) + Send,
    {
        let request = request.into();
        let many = request.is_many();
        let assets = request.into_vec();
        let first = assets.first().map(|asset| asset.src.clone());

        let mut loaded = self.load_many(assets, on_progress).await?;
        if many {
            return Ok(OneOrMany::Many(loaded));
        }
        Ok(OneOrMany::One(
            first.and_then(|src| loaded.shift_remove(&src)).flatten(),
        ))
    }

    /// Loads every descriptor concurrently and returns the values keyed by `src`.
    ///
    /// `on_progress` receives `completed / total` after each success. A failing
    /// asset does not cancel its siblings: they run to completion, the failed
    /// URL is dropped from the in-flight map so that a later call retries it,
    /// and the first failure is returned.
    pub async fn load_many<F>(
        &self,
        assets: Vec<ResolvedAsset>,
        mut on_progress: F,
    ) -> Result<IndexMap<String, Option<AssetValue>>, AssetError>
    where
        F: FnMut(f64) + Send,
    {
        let total = assets.len();
        let mut results: IndexMap<String, Option<AssetValue>> = assets
            .iter()
            .map(|asset| (asset.src.clone(), None))
            .collect();

        let mut pending: FuturesUnordered<_> = assets
            .into_iter()
            .map(|asset| {
                let url = self.absolute_url(&asset.src);
                let promise = self.promise_for(&url, &asset);
                async move {
                    let outcome = promise.clone().await;
                    (asset.src, url, promise, outcome)
                }
            })
            .collect();

        let mut completed = 0usize;
        let mut failure = None;
        while let Some((src, url, promise, outcome)) = pending.next().await {
            match outcome {
                Ok(outcome) => {
                    completed += 1;
                    on_progress(completed as f64 / total as f64);
                    results.insert(src, outcome.value);
                }
                Err(source) => {
                    log::error!("[Loader] Failed to load {url}: {source}");
                    self.forget(&url, &promise);
                    results.shift_remove(&src);
                    failure.get_or_insert(AssetError::Load { url, source });
                }
            }
        }

        match failure {
            Some(error) => Err(error),
            None => Ok(results),
        }
    }

    /// Unloads assets.
    ///
    /// Each loaded URL has its owner's unload stage called once and leaves the
    /// in-flight map, so the next load starts from scratch. Unknown URLs are
    /// ignored.
    pub async fn unload(&self, request: impl Into<AssetRequest>) {
        for asset in request.into().into_vec() {
            let url = self.absolute_url(&asset.src);
            let Some(promise) = self.inner.promise_cache.lock().get(&url).cloned() else {
                continue;
            };

            match promise.clone().await {
                Ok(LoadOutcome {
                    value: Some(value),
                    owner: Some(owner),
                }) => {
                    if let Some(stage) = owner.as_unloader() {
                        if let Err(error) = stage.unload(&value, &asset, self).await {
                            log::warn!(
                                "[Loader] Parser '{}' failed to unload {url}: {error:#}",
                                owner.name()
                            );
                        }
                    }
                }
                Ok(_) => {}
                Err(error) => log::debug!("[Loader] Unloading failed load {url}: {error}"),
            }

            self.forget(&url, &promise);
        }
    }

    /// Returns the in-flight entry for `url`, installing a new one on a miss.
    fn promise_for(&self, url: &str, asset: &ResolvedAsset) -> LoadPromise {
        let mut cache = self.inner.promise_cache.lock();
        if let Some(promise) = cache.get(url) {
            return promise.clone();
        }

        let loader = self.clone();
        let parsers = self.parsers();
        let url_owned = url.to_string();
        let asset = asset.clone();
        let pipeline = async move {
            loader
                .run_pipeline(&url_owned, &asset, &parsers)
                .await
                .map_err(share_error)
        };

        // Spawned while the map is locked: a started load finishes even if
        // every caller stops awaiting it.
        let promise = match Handle::try_current() {
            Ok(runtime) => {
                let task = runtime.spawn(pipeline);
                async move {
                    task.await
                        .unwrap_or_else(|error| Err(Arc::new(error) as SharedError))
                }
                .boxed()
                .shared()
            }
            Err(_) => {
                log::debug!("[Loader] No runtime available, {url} loads while awaited");
                pipeline.boxed().shared()
            }
        };

        cache.insert(url.to_string(), promise.clone());
        promise
    }

    /// Removes `url` from the in-flight map if it still holds `promise`.
    fn forget(&self, url: &str, promise: &LoadPromise) {
        let mut cache = self.inner.promise_cache.lock();
        if cache
            .get(url)
            .is_some_and(|current| current.ptr_eq(promise))
        {
            cache.remove(url);
        }
    }

    async fn run_pipeline(
        &self,
        url: &str,
        asset: &ResolvedAsset,
        parsers: &[Arc<dyn LoaderParser>],
    ) -> anyhow::Result<LoadOutcome> {
        let forced = asset.load_parser.as_deref().and_then(|name| {
            let found = parsers
                .iter()
                .filter(|parser| parser.name() == name)
                .find_map(|parser| parser.as_loader().map(|stage| (parser, stage)));
            if found.is_none() {
                log::warn!(
                    "[Loader] The loadParser '{name}' of {url} is not registered, falling back to the parsers' tests"
                );
            }
            found
        });

        let chosen = forced.or_else(|| {
            parsers.iter().find_map(|parser| {
                parser
                    .as_loader()
                    .filter(|stage| stage.test(url, asset, self))
                    .map(|stage| (parser, stage))
            })
        });

        let Some((loading_parser, stage)) = chosen else {
            log::warn!(
                "[Loader] {url} could not be loaded as no registered parser accepts it, ensure the correct parser has been added"
            );
            return Ok(LoadOutcome::default());
        };

        log::trace!("[Loader] '{}' loads {url}", loading_parser.name());
        let mut value = stage
            .load(url, asset, self)
            .await
            .with_context(|| format!("parser '{}' failed to load", loading_parser.name()))?;
        let mut owner = loading_parser.clone();

        for parser in parsers {
            let Some(stage) = parser.as_transformer() else {
                continue;
            };
            if !stage.test_parse(&value, asset, self) {
                continue;
            }
            log::trace!("[Loader] '{}' parses {url}", parser.name());
            if let Some(parsed) = stage
                .parse(value.clone(), asset, self)
                .await
                .with_context(|| format!("parser '{}' failed to parse", parser.name()))?
            {
                value = parsed;
            }
            owner = parser.clone();
        }

        Ok(LoadOutcome {
            value: Some(value),
            owner: Some(owner),
        })
    }
}

impl std::fmt::Debug for Loader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parsers: Vec<_> = self
            .inner
            .parsers
            .read()
            .iter()
            .map(|parser| (parser.name().to_string(), parser.priority()))
            .collect();
        f.debug_struct("Loader")
            .field("parsers", &parsers)
            .field("loading", &self.inner.promise_cache.lock().len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset_lane::{LoadStage, ParserPriority};
    use async_trait::async_trait;

    struct NoFetch;

    #[async_trait]
    impl Fetch for NoFetch {
        async fn fetch(&self, url: &str) -> Result<Vec<u8>, AssetError> {
            Err(AssetError::fetch(url, "offline"))
        }
    }

    struct Named(&'static str, ParserPriority);

    #[async_trait]
    impl LoadStage for Named {
        fn test(&self, _: &str, _: &ResolvedAsset, _: &Loader) -> bool {
            true
        }

        async fn load(&self, _: &str, _: &ResolvedAsset, _: &Loader) -> anyhow::Result<AssetValue> {
            Ok(AssetValue::new(self.0.to_string()))
        }
    }

    impl LoaderParser for Named {
        fn name(&self) -> &str {
            self.0
        }

        fn priority(&self) -> ParserPriority {
            self.1
        }

        fn as_loader(&self) -> Option<&dyn LoadStage> {
            Some(self)
        }
    }

    fn loader() -> Loader {
        Loader::new(Arc::new(NoFetch))
    }

    #[test]
    fn registry_is_sorted_by_tier_then_insertion() {
        let loader = loader();
        loader.add_parser(Arc::new(Named("low", ParserPriority::Low)));
        loader.add_parser(Arc::new(Named("normal-a", ParserPriority::Normal)));
        loader.add_parser(Arc::new(Named("high", ParserPriority::High)));
        loader.add_parser(Arc::new(Named("normal-b", ParserPriority::Normal)));

        let names: Vec<_> = loader
            .parsers()
            .iter()
            .map(|parser| parser.name().to_string())
            .collect();
        assert_eq!(names, ["high", "normal-a", "normal-b", "low"]);

        assert!(loader.remove_parser("high"));
        assert!(loader.parser("high").is_none());
    }

    #[test]
    fn absolute_urls_use_the_base() {
        let loader = loader().with_base_url("http://cdn.test/game/");
        assert_eq!(loader.absolute_url("hero.png"), "http://cdn.test/game/hero.png");
        assert_eq!(loader.absolute_url("./a/../hero.png"), "http://cdn.test/game/hero.png");
    }

    #[tokio::test]
    async fn higher_tier_shadows_generic_parsers() {
        let loader = loader();
        loader.add_parser(Arc::new(Named("generic", ParserPriority::Low)));
        loader.add_parser(Arc::new(Named("specific", ParserPriority::High)));

        let value = loader.load("anything.bin").await.unwrap().one().flatten().unwrap();
        assert_eq!(value.downcast_ref::<String>().map(String::as_str), Some("specific"));
    }

    #[tokio::test]
    async fn forced_parser_skips_tests() {
        let loader = loader();
        loader.add_parser(Arc::new(Named("first", ParserPriority::High)));
        loader.add_parser(Arc::new(Named("forced", ParserPriority::Low)));

        let asset = ResolvedAsset::new("thing.bin").with_load_parser("forced");
        let value = loader.load(asset).await.unwrap().one().flatten().unwrap();
        assert_eq!(value.downcast_ref::<String>().map(String::as_str), Some("forced"));
    }

    #[tokio::test]
    async fn no_matching_parser_yields_none() {
        let loader = loader();
        let value = loader.load("mystery.xyz").await.unwrap();
        assert!(matches!(value, OneOrMany::One(None)));
        assert!(loader.is_loaded("mystery.xyz"));
    }
}
