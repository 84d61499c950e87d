//! Snapshot cache over a [`DocumentStore`].

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use appforge_core::{Application, DocumentKind, ForgeResult, StoreError};
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use super::stats::CacheStats;
use crate::store::DocumentStore;

// ============================================================================
// SNAPSHOT
// ============================================================================

/// Every application known to the store at one point in time.
///
/// Snapshots are never mutated after construction. Readers holding one keep
/// a consistent view even after the cache has been invalidated.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplicationSnapshot {
    apps: BTreeMap<String, Application>,
    built_at: DateTime<Utc>,
}

impl ApplicationSnapshot {
    pub fn new(apps: BTreeMap<String, Application>) -> Self {
        Self {
            apps,
            built_at: Utc::now(),
        }
    }

    pub fn len(&self) -> usize {
        self.apps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Application> {
        self.apps.get(name)
    }

    /// Applications in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Application> {
        self.apps.values()
    }

    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }
}

// ============================================================================
// CACHE
// ============================================================================

/// Lazily built, wholesale-invalidated cache of all applications.
pub struct ApplicationCache<S: DocumentStore + ?Sized> {
    store: Arc<S>,
    slot: RwLock<Option<Arc<ApplicationSnapshot>>>,
    /// Held for the duration of a rebuild.
    rebuild: Mutex<()>,
    /// Bumped by every invalidation, under the slot write lock.
    epoch: AtomicU64,
    hits: AtomicU64,
    rebuilds: AtomicU64,
    invalidations: AtomicU64,
}

impl<S: DocumentStore + ?Sized> ApplicationCache<S> {
    /// Create an empty cache. Nothing is read until the first `list` or `get`.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            slot: RwLock::new(None),
            rebuild: Mutex::new(()),
            epoch: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            rebuilds: AtomicU64::new(0),
            invalidations: AtomicU64::new(0),
        }
    }

    /// The store this cache reads from.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// All applications, building the snapshot if none is held.
    ///
    /// The returned snapshot is shared with other readers; it is immutable,
    /// so no caller can affect what another one sees.
    pub async fn list(&self) -> ForgeResult<Arc<ApplicationSnapshot>> {
        if let Some(snapshot) = self.current() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(snapshot);
        }

        let _guard = self.rebuild.lock().await;

        // Another caller may have finished a rebuild while we waited.
        if let Some(snapshot) = self.current() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(snapshot);
        }

        let epoch = self.epoch.load(Ordering::SeqCst);
        let apps = self.store.scan_applications().await?;
        let snapshot = Arc::new(ApplicationSnapshot::new(apps));
        self.rebuilds.fetch_add(1, Ordering::Relaxed);

        {
            let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
            if self.epoch.load(Ordering::SeqCst) == epoch {
                *slot = Some(Arc::clone(&snapshot));
                tracing::info!(entries = snapshot.len(), "Application cache rebuilt");
            } else {
                // Invalidated mid-scan: serve this caller but do not install.
                tracing::debug!(
                    entries = snapshot.len(),
                    "Application cache invalidated during rebuild, snapshot discarded"
                );
            }
        }

        Ok(snapshot)
    }

    /// One application by name, as an owned copy.
    ///
    /// Mutating the returned value never affects the cache.
    pub async fn get(&self, name: &str) -> ForgeResult<Application> {
        let snapshot = self.list().await?;
        snapshot.get(name).cloned().ok_or_else(|| {
            StoreError::NotFound {
                kind: DocumentKind::Application,
                name: name.to_string(),
            }
            .into()
        })
    }

    /// Drop the current snapshot. Idempotent.
    pub fn invalidate(&self) {
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        self.epoch.fetch_add(1, Ordering::SeqCst);
        if slot.take().is_some() {
            tracing::info!("Application cache invalidated");
        }
        self.invalidations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn stats(&self) -> CacheStats {
        let slot = self.slot.read().unwrap_or_else(PoisonError::into_inner);
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            rebuilds: self.rebuilds.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
            entries: slot.as_ref().map_or(0, |s| s.len() as u64),
            cached: slot.is_some(),
            built_at: slot.as_ref().map(|s| s.built_at()),
        }
    }

    fn current(&self) -> Option<Arc<ApplicationSnapshot>> {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl<S: DocumentStore + ?Sized> std::fmt::Debug for ApplicationCache<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApplicationCache")
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}
