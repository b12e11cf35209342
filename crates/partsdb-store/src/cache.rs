//! TTL cache in front of the refresher with disk fallback.
//!
//! ## Read path
//!
//! 1. A fresh entry (`now - captured_at <= ttl`) is served as is.
//! 2. Otherwise one refresh runs in its own task. Readers that arrive while it
//!    is in flight join it and share its outcome; a reader that goes away
//!    does not cancel the refresh for the others.
//! 3. On success the snapshot is persisted and becomes the entry.
//! 4. On failure the previous entry is served stale, else the persisted
//!    snapshot, else [`StoreError::NoFallbackAvailable`].

use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use partsdb_core::PartStore;

use crate::clock::Clock;
use crate::refresher::Refresher;
use crate::snapshot::SnapshotStore;
use crate::StoreError;

/// What a caller gets back from [`ServingCache::get`].
#[derive(Debug, Clone)]
pub struct CacheRead {
    pub snapshot: Arc<PartStore>,
    pub captured_at: DateTime<Utc>,
    /// The data is older than the TTL or came from the disk fallback.
    pub stale: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    Empty,
    Fresh,
    Stale,
}

impl CacheState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CacheState::Empty => "empty",
            CacheState::Fresh => "fresh",
            CacheState::Stale => "stale",
        }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    snapshot: Arc<PartStore>,
    captured_at: DateTime<Utc>,
    /// Loaded from the snapshot store rather than scraped by this process.
    from_fallback: bool,
}

/// Outcome of one refresh attempt. `None` means nothing could be served.
type Flight = Shared<BoxFuture<'static, Option<CacheRead>>>;

struct Inner {
    refresher: Arc<dyn Refresher>,
    snapshots: Arc<dyn SnapshotStore>,
    clock: Arc<dyn Clock>,
    ttl: TimeDelta,
    entry: RwLock<Option<Entry>>,
    in_flight: Mutex<Option<Flight>>,
}

pub struct ServingCache {
    inner: Arc<Inner>,
}

impl ServingCache {
    #[must_use]
    pub fn new(
        refresher: Arc<dyn Refresher>,
        snapshots: Arc<dyn SnapshotStore>,
        clock: Arc<dyn Clock>,
        ttl: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                refresher,
                snapshots,
                clock,
                ttl: TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX),
                entry: RwLock::new(None),
                in_flight: Mutex::new(None),
            }),
        }
    }

    /// Seeds the cache from the persisted snapshot as stale so the first read
    /// refreshes but still has a fallback. Returns whether a snapshot was
    /// found.
    pub async fn warm_from_disk(&self) -> bool {
        match self.inner.snapshots.load().await {
            Ok(loaded) => {
                tracing::info!(
                    parts = loaded.store.len(),
                    saved_at = %loaded.saved_at,
                    "cache warmed from snapshot"
                );
                self.inner.replace(Entry {
                    snapshot: Arc::new(loaded.store),
                    captured_at: loaded.saved_at,
                    from_fallback: true,
                });
                true
            }
            Err(StoreError::NotFound { .. }) => {
                tracing::info!("no snapshot on disk, cache starts empty");
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to load snapshot, cache starts empty");
                false
            }
        }
    }

    #[must_use]
    pub fn state(&self) -> CacheState {
        match self.inner.current() {
            None => CacheState::Empty,
            Some(entry) if self.inner.is_fresh(&entry) => CacheState::Fresh,
            Some(_) => CacheState::Stale,
        }
    }

    /// Returns fresh data, refreshing when the entry has expired.
    ///
    /// # Errors
    ///
    /// [`StoreError::NoFallbackAvailable`] when the refresh fails and neither
    /// an earlier entry nor a persisted snapshot exists.
    pub async fn get(&self) -> Result<CacheRead, StoreError> {
        if let Some(read) = self.inner.fresh_read() {
            return Ok(read);
        }
        self.join_or_start()
            .await
            .ok_or(StoreError::NoFallbackAvailable)
    }

    /// Returns the in-flight refresh, starting one when none is running.
    fn join_or_start(&self) -> Flight {
        let mut slot = self
            .inner
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(flight) = slot.as_ref() {
            tracing::debug!("joining in-flight refresh");
            return flight.clone();
        }
        // A refresh may have finished between the caller's check and the lock.
        if let Some(read) = self.inner.fresh_read() {
            return futures::future::ready(Some(read)).boxed().shared();
        }

        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(async move {
            let outcome = inner.refresh_once().await.ok();
            inner
                .in_flight
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take();
            outcome
        });
        let flight = async move {
            task.await.unwrap_or_else(|e| {
                tracing::error!(error = %e, "refresh task failed");
                None
            })
        }
        .boxed()
        .shared();

        *slot = Some(flight.clone());
        flight
    }
}

impl Inner {
    async fn refresh_once(&self) -> Result<CacheRead, StoreError> {
        tracing::info!("cache expired, refreshing");
        let refreshed = match self.refresher.refresh().await {
            Ok(store) if store.is_empty() => Err(StoreError::UpstreamUnavailable(
                "refresh returned no parts".to_owned(),
            )),
            other => other,
        };

        match refreshed {
            Ok(store) => {
                if let Err(e) = self.snapshots.save(&store).await {
                    tracing::warn!(error = %e, "failed to persist snapshot, serving in-memory copy");
                }
                let entry = Entry {
                    snapshot: Arc::new(store),
                    captured_at: self.clock.now(),
                    from_fallback: false,
                };
                tracing::info!(parts = entry.snapshot.len(), "cache refreshed");
                self.replace(entry.clone());
                Ok(self.read(&entry))
            }
            Err(e) => {
                tracing::warn!(error = %e, "refresh failed, falling back");
                self.fallback().await
            }
        }
    }

    async fn fallback(&self) -> Result<CacheRead, StoreError> {
        if let Some(entry) = self.current() {
            tracing::info!(captured_at = %entry.captured_at, "serving previous in-memory data");
            return Ok(self.read(&entry));
        }

        match self.snapshots.load().await {
            Ok(loaded) => {
                tracing::info!(saved_at = %loaded.saved_at, "serving persisted snapshot");
                let entry = Entry {
                    snapshot: Arc::new(loaded.store),
                    captured_at: loaded.saved_at,
                    from_fallback: true,
                };
                self.replace(entry.clone());
                Ok(self.read(&entry))
            }
            Err(e) => {
                tracing::error!(error = %e, "no fallback snapshot available");
                Err(StoreError::NoFallbackAvailable)
            }
        }
    }

    fn is_fresh(&self, entry: &Entry) -> bool {
        !entry.from_fallback && self.clock.now() - entry.captured_at <= self.ttl
    }

    fn read(&self, entry: &Entry) -> CacheRead {
        CacheRead {
            snapshot: Arc::clone(&entry.snapshot),
            captured_at: entry.captured_at,
            stale: !self.is_fresh(entry),
        }
    }

    fn fresh_read(&self) -> Option<CacheRead> {
        self.current()
            .filter(|e| self.is_fresh(e))
            .map(|e| self.read(&e))
    }

    fn current(&self) -> Option<Entry> {
        self.entry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn replace(&self, entry: Entry) {
        *self.entry.write().unwrap_or_else(PoisonError::into_inner) = Some(entry);
    }
}

#[cfg(test)]
#[path = "cache_test.rs"]
mod tests;
