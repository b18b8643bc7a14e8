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

//! Low-priority loading of assets that will be needed later.

use kiln_core::{asset::ResolvedAsset, AssetRequest};
use kiln_lanes::asset_lane::Loader;
use parking_lot::Mutex;
use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc,
};
use tokio::{runtime::Handle, sync::Notify};

struct BackgroundState {
    loader: Loader,
    /// Pending assets; the most recently queued ones load first.
    queue: Mutex<Vec<ResolvedAsset>>,
    /// Number of foreground loads in flight.
    foreground: AtomicUsize,
    /// A drain task is running.
    loading: AtomicBool,
    max_concurrent: AtomicUsize,
    idle: Notify,
}

/// Loads queued assets in small batches whenever the foreground is quiet.
///
/// The background loader shares the agent's [`Loader`], so an asset it has
/// started is never loaded twice: a foreground request for it simply joins
/// the load in flight. While any [`ForegroundGuard`] is alive no new batch
/// starts; the batch already running completes.
///
/// Batches run on the tokio runtime the assets were queued from. Queuing
/// outside of a runtime keeps the assets until the next call made from one.
#[derive(Clone)]
pub struct BackgroundLoader {
    state: Arc<BackgroundState>,
}

impl BackgroundLoader {
    /// Creates an idle background loader working through `loader`.
    pub fn new(loader: Loader) -> Self {
        Self {
            state: Arc::new(BackgroundState {
                loader,
                queue: Mutex::new(Vec::new()),
                foreground: AtomicUsize::new(0),
                loading: AtomicBool::new(false),
                max_concurrent: AtomicUsize::new(1),
                idle: Notify::new(),
            }),
        }
    }

    /// How many assets one batch requests at once.
    pub fn max_concurrent(&self) -> usize {
        self.state.max_concurrent.load(Ordering::Relaxed)
    }

    /// Changes the batch size. Zero is treated as one.
    pub fn set_max_concurrent(&self, max_concurrent: usize) {
        self.state
            .max_concurrent
            .store(max_concurrent.max(1), Ordering::Relaxed);
    }

    /// Queues assets and starts loading them if the foreground is quiet.
    pub fn add(&self, assets: impl IntoIterator<Item = ResolvedAsset>) {
        let queued = {
            let mut queue = self.state.queue.lock();
            queue.extend(assets);
            queue.len()
        };
        log::debug!("[BackgroundLoader] {queued} asset(s) queued");
        kick(&self.state);
    }

    /// Number of assets waiting for a batch.
    pub fn pending(&self) -> usize {
        self.state.queue.lock().len()
    }

    /// Drops every queued asset. A running batch is not interrupted.
    pub fn clear(&self) {
        self.state.queue.lock().clear();
    }

    /// Returns `true` unless a foreground load is in flight.
    pub fn is_active(&self) -> bool {
        self.state.foreground.load(Ordering::SeqCst) == 0
    }

    /// Returns `true` while a batch is loading.
    pub fn is_loading(&self) -> bool {
        self.state.loading.load(Ordering::SeqCst)
    }

    /// Pauses background batches until the returned guard is dropped.
    ///
    /// Guards nest: loading resumes when the last one is dropped.
    pub fn foreground(&self) -> ForegroundGuard {
        self.state.foreground.fetch_add(1, Ordering::SeqCst);
        ForegroundGuard {
            state: self.state.clone(),
        }
    }

    /// Waits until the queue is drained and no batch is running.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.state.idle.notified();
            if !self.is_loading() && self.pending() == 0 {
                return;
            }
            notified.await;
        }
    }
}

impl std::fmt::Debug for BackgroundLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackgroundLoader")
            .field("pending", &self.pending())
            .field("active", &self.is_active())
            .field("loading", &self.is_loading())
            .finish()
    }
}

/// Keeps the [`BackgroundLoader`] paused while alive.
#[must_use = "the background loader resumes as soon as the guard is dropped"]
pub struct ForegroundGuard {
    state: Arc<BackgroundState>,
}

impl Drop for ForegroundGuard {
    fn drop(&mut self) {
        if self.state.foreground.fetch_sub(1, Ordering::SeqCst) == 1 {
            kick(&self.state);
        }
    }
}

fn kick(state: &Arc<BackgroundState>) {
    if state.foreground.load(Ordering::SeqCst) > 0 || state.queue.lock().is_empty() {
        return;
    }
    if state.loading.swap(true, Ordering::SeqCst) {
        return;
    }

    match Handle::try_current() {
        Ok(runtime) => {
            runtime.spawn(drain(state.clone()));
        }
        Err(_) => {
            state.loading.store(false, Ordering::SeqCst);
            log::debug!("[BackgroundLoader] No runtime available, loading deferred");
        }
    }
}

async fn drain(state: Arc<BackgroundState>) {
    loop {
        if state.foreground.load(Ordering::SeqCst) > 0 {
            break;
        }

        let batch: Vec<ResolvedAsset> = {
            let mut queue = state.queue.lock();
            let size = state.max_concurrent.load(Ordering::Relaxed).min(queue.len());
            (0..size).filter_map(|_| queue.pop()).collect()
        };
        if batch.is_empty() {
            break;
        }

        log::trace!("[BackgroundLoader] Loading a batch of {}", batch.len());
        if let Err(error) = state.loader.load(AssetRequest::Many(batch)).await {
            log::warn!("[BackgroundLoader] {error}");
        }
    }

    state.loading.store(false, Ordering::SeqCst);
    state.idle.notify_waiters();

    // Assets queued between the last pop and the flag reset.
    kick(&state);
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_core::asset::AssetValue;
    use kiln_infra::fetch::MemoryFetcher;
    use kiln_lanes::asset_lane::{loading::default_parsers, LoadStage, LoaderParser};

    fn loader() -> (Loader, Arc<MemoryFetcher>) {
        let fetcher = Arc::new(
            MemoryFetcher::new()
                .with("a.txt", "a")
                .with("b.txt", "b")
                .with("c.txt", "c"),
        );
        let loader = Loader::new(fetcher.clone());
        for parser in default_parsers() {
            loader.add_parser(parser);
        }
        (loader, fetcher)
    }

    #[tokio::test]
    async fn queued_assets_are_loaded() {
        let (loader, fetcher) = loader();
        let background = BackgroundLoader::new(loader.clone());

        background.add(["a.txt", "b.txt"].map(ResolvedAsset::new));
        background.wait_idle().await;

        assert!(loader.is_loaded("a.txt"));
        assert!(loader.is_loaded("b.txt"));
        assert_eq!(fetcher.total_fetches(), 2);
    }

    #[tokio::test]
    async fn foreground_guards_pause_until_the_last_is_dropped() {
        let (loader, _) = loader();
        let background = BackgroundLoader::new(loader.clone());

        let outer = background.foreground();
        let inner = background.foreground();
        background.add([ResolvedAsset::new("a.txt")]);
        assert!(!background.is_active());

        drop(inner);
        tokio::task::yield_now().await;
        assert_eq!(background.pending(), 1);

        drop(outer);
        background.wait_idle().await;
        assert!(background.is_active());
        assert!(loader.is_loaded("a.txt"));
    }

    /// Accepts every URL and records the order of the loads.
    #[derive(Default)]
    struct Recorder(Mutex<Vec<String>>);

    #[async_trait::async_trait]
    impl LoadStage for Recorder {
        fn test(&self, _: &str, _: &ResolvedAsset, _: &Loader) -> bool {
            true
        }

        async fn load(&self, url: &str, _: &ResolvedAsset, _: &Loader) -> anyhow::Result<AssetValue> {
            self.0.lock().push(url.to_string());
            Ok(AssetValue::new(url.to_string()))
        }
    }

    impl LoaderParser for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        fn as_loader(&self) -> Option<&dyn LoadStage> {
            Some(self)
        }
    }

    #[tokio::test]
    async fn the_newest_assets_load_first() {
        let recorder = Arc::new(Recorder::default());
        let loader = Loader::new(Arc::new(MemoryFetcher::new()));
        loader.add_parser(recorder.clone());
        let background = BackgroundLoader::new(loader);

        let guard = background.foreground();
        background.add(["a.txt", "b.txt", "c.txt"].map(ResolvedAsset::new));
        drop(guard);
        background.wait_idle().await;

        assert_eq!(*recorder.0.lock(), ["c.txt", "b.txt", "a.txt"]);
    }

    #[test]
    fn zero_concurrency_means_one() {
        let (loader, _) = loader();
        let background = BackgroundLoader::new(loader);
        background.set_max_concurrent(0);
        assert_eq!(background.max_concurrent(), 1);
    }
}
