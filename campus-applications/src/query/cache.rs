//! Query cache
//!
//! Keyed store of server reads with request deduplication, a freshness
//! window and stale-while-revalidate. Every fetch runs as its own tokio
//! task behind a shared future, so concurrent readers of one key ride the
//! same request and an abandoned reader never cancels it.
//!
//! Ordering rules:
//! - a fetch only lands in the entry it was started for; if the entry was
//!   removed or the cache cleared meanwhile, the result is dropped
//! - a fetch started before an invalidation still lands (it is newer than
//!   nothing), but the entry stays stale so the next read refetches
//! - an older fetch never overwrites data from a newer one

use super::keys::QueryKey;
use campus_core::{CampusError, CampusResult};
use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

pub const DEFAULT_STALE_TIME: Duration = Duration::from_secs(60);

/// Outcome of one fetch, shared by every waiter
pub type FetchResult = Result<Arc<Value>, Arc<CampusError>>;

type SharedFetch = Shared<BoxFuture<'static, FetchResult>>;

/// What a reader sees for one key at one moment
#[derive(Debug, Clone, Default)]
pub struct QuerySnapshot {
    pub data: Option<Arc<Value>>,
    /// A fetch for this key is running
    pub is_loading: bool,
    /// Data is missing, older than the freshness window, or invalidated
    pub is_stale: bool,
    /// The most recent fetch failed
    pub error: Option<Arc<CampusError>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl QuerySnapshot {
    /// Decode the cached payload, if any
    pub fn decode<T: DeserializeOwned>(&self) -> Option<serde_json::Result<T>> {
        self.data.as_deref().map(T::deserialize)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub fresh: usize,
    pub stale: usize,
    pub in_flight: usize,
    /// Requests actually issued since the cache was created
    pub fetches_started: u64,
}

struct InFlight {
    id: u64,
    fetch: SharedFetch,
}

struct CacheEntry {
    data: Option<Arc<Value>>,
    fetched_at: Option<Instant>,
    updated_at: Option<DateTime<Utc>>,
    invalidated: bool,
    error: Option<Arc<CampusError>>,
    in_flight: Option<InFlight>,
    /// Bumped on every invalidation
    generation: u64,
    /// Generation of the fetch that produced `data`
    data_generation: u64,
}

impl CacheEntry {
    fn new(generation: u64) -> Self {
        Self {
            data: None,
            fetched_at: None,
            updated_at: None,
            invalidated: false,
            error: None,
            in_flight: None,
            generation,
            data_generation: generation,
        }
    }

    fn fresh_data(&self, stale_time: Duration) -> Option<Arc<Value>> {
        if self.invalidated {
            return None;
        }
        let fetched_at = self.fetched_at?;
        if fetched_at.elapsed() >= stale_time {
            return None;
        }
        self.data.clone()
    }

    fn snapshot(&self, stale_time: Duration) -> QuerySnapshot {
        QuerySnapshot {
            data: self.data.clone(),
            is_loading: self.in_flight.is_some(),
            is_stale: self.fresh_data(stale_time).is_none(),
            error: self.error.clone(),
            updated_at: self.updated_at,
        }
    }
}

struct CacheInner {
    entries: Mutex<HashMap<QueryKey, CacheEntry>>,
    stale_time: Duration,
    generations: AtomicU64,
    fetch_ids: AtomicU64,
}

impl CacheInner {
    fn next_generation(&self) -> u64 {
        self.generations.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn settle(&self, key: &QueryKey, fetch_id: u64, generation: u64, outcome: &FetchResult) {
        let mut entries = self.entries.lock();
        let Some(entry) = entries.get_mut(key) else {
            debug!(key = %key, "Entry gone before fetch finished, dropping result");
            return;
        };

        if entry.in_flight.as_ref().is_some_and(|f| f.id == fetch_id) {
            entry.in_flight = None;
        }

        if generation < entry.data_generation {
            debug!(key = %key, "Newer data already cached, dropping result");
            return;
        }

        match outcome {
            Ok(data) => {
                entry.data = Some(Arc::clone(data));
                entry.fetched_at = Some(Instant::now());
                entry.updated_at = Some(Utc::now());
                entry.data_generation = generation;
                entry.invalidated = generation != entry.generation;
                entry.error = None;
                debug!(key = %key, stale = entry.invalidated, "Fetch stored");
            }
            Err(error) => {
                if generation == entry.generation {
                    entry.error = Some(Arc::clone(error));
                }
                warn!(key = %key, error = %error, "Fetch failed");
            }
        }
    }
}

/// Shared, cloneable handle to one cache
#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<CacheInner>,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(DEFAULT_STALE_TIME)
    }
}

impl QueryCache {
    pub fn new(stale_time: Duration) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                entries: Mutex::new(HashMap::new()),
                stale_time,
                generations: AtomicU64::new(0),
                fetch_ids: AtomicU64::new(0),
            }),
        }
    }

    pub fn stale_time(&self) -> Duration {
        self.inner.stale_time
    }

    /// Non-blocking read.
    ///
    /// Returns whatever is cached right now and, unless it is fresh, makes
    /// sure a background fetch is running. A reader that already has data
    /// keeps showing it while the refresh happens.
    pub fn query<F, Fut>(&self, key: &QueryKey, fetcher: F) -> QuerySnapshot
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = CampusResult<Value>> + Send + 'static,
    {
        let mut entries = self.inner.entries.lock();
        let entry = entries
            .entry(key.clone())
            .or_insert_with(|| CacheEntry::new(self.inner.next_generation()));

        if entry.fresh_data(self.inner.stale_time).is_none() && entry.in_flight.is_none() {
            // The spawned task drives the fetch; this reader only wants the snapshot
            drop(self.start_fetch(key, entry, fetcher));
        }
        entry.snapshot(self.inner.stale_time)
    }

    /// Awaiting read.
    ///
    /// Fresh data returns immediately without a request; otherwise joins the
    /// running fetch for the key or starts one.
    pub async fn fetch_query<F, Fut>(&self, key: &QueryKey, fetcher: F) -> FetchResult
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = CampusResult<Value>> + Send + 'static,
    {
        let fetch = {
            let mut entries = self.inner.entries.lock();
            let entry = entries
                .entry(key.clone())
                .or_insert_with(|| CacheEntry::new(self.inner.next_generation()));

            if let Some(data) = entry.fresh_data(self.inner.stale_time) {
                debug!(key = %key, "Cache hit");
                return Ok(data);
            }
            match &entry.in_flight {
                Some(in_flight) => {
                    debug!(key = %key, "Joining in-flight fetch");
                    in_flight.fetch.clone()
                }
                None => self.start_fetch(key, entry, fetcher),
            }
        };

        fetch.await
    }

    fn start_fetch<F, Fut>(&self, key: &QueryKey, entry: &mut CacheEntry, fetcher: F) -> SharedFetch
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = CampusResult<Value>> + Send + 'static,
    {
        let fetch_id = self.inner.fetch_ids.fetch_add(1, Ordering::Relaxed) + 1;
        let generation = entry.generation;
        let inner = Arc::clone(&self.inner);
        let owned_key = key.clone();

        let fetch = async move {
            let outcome = fetcher().await.map(Arc::new).map_err(Arc::new);
            inner.settle(&owned_key, fetch_id, generation, &outcome);
            outcome
        }
        .boxed()
        .shared();

        debug!(key = %key, fetch_id, "Starting fetch");
        entry.in_flight = Some(InFlight {
            id: fetch_id,
            fetch: fetch.clone(),
        });
        tokio::spawn(fetch.clone());
        fetch
    }

    /// Current snapshot without triggering anything
    pub fn peek(&self, key: &QueryKey) -> Option<QuerySnapshot> {
        self.inner
            .entries
            .lock()
            .get(key)
            .map(|entry| entry.snapshot(self.inner.stale_time))
    }

    /// Mark every key under `prefix` stale.
    ///
    /// Cached data stays visible. A fetch already running for a matched key
    /// is detached: the next read starts a new one instead of joining it.
    /// Returns how many entries matched.
    pub fn invalidate(&self, prefix: &QueryKey) -> usize {
        let mut entries = self.inner.entries.lock();
        let mut matched = 0;
        for (key, entry) in entries.iter_mut() {
            if key.starts_with(prefix) {
                entry.generation = self.inner.next_generation();
                entry.invalidated = true;
                entry.in_flight = None;
                matched += 1;
            }
        }
        debug!(prefix = %prefix, matched, "Invalidated");
        matched
    }

    pub fn invalidate_many(&self, prefixes: &[QueryKey]) -> usize {
        prefixes.iter().map(|prefix| self.invalidate(prefix)).sum()
    }

    /// Write data as if a fetch had just returned it
    pub fn set_query_data(&self, key: &QueryKey, value: Value) {
        let mut entries = self.inner.entries.lock();
        let entry = entries
            .entry(key.clone())
            .or_insert_with(|| CacheEntry::new(self.inner.next_generation()));
        entry.data = Some(Arc::new(value));
        entry.fetched_at = Some(Instant::now());
        entry.updated_at = Some(Utc::now());
        entry.data_generation = entry.generation;
        entry.invalidated = false;
        entry.error = None;
    }

    pub fn remove(&self, key: &QueryKey) -> bool {
        self.inner.entries.lock().remove(key).is_some()
    }

    /// Drop everything; results of fetches still running are discarded
    pub fn clear(&self) {
        let mut entries = self.inner.entries.lock();
        let dropped = entries.len();
        entries.clear();
        debug!(dropped, "Query cache cleared");
    }

    pub fn stats(&self) -> CacheStats {
        let entries = self.inner.entries.lock();
        let mut stats = CacheStats {
            entries: entries.len(),
            fetches_started: self.inner.fetch_ids.load(Ordering::Relaxed),
            ..CacheStats::default()
        };
        for entry in entries.values() {
            if entry.fresh_data(self.inner.stale_time).is_some() {
                stats.fresh += 1;
            } else {
                stats.stale += 1;
            }
            if entry.in_flight.is_some() {
                stats.in_flight += 1;
            }
        }
        stats
    }
}

impl std::fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCache")
            .field("stale_time", &self.inner.stale_time)
            .field("stats", &self.stats())
            .finish()
    }
}
