//! In-memory document store for tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use appforge_core::{
    validate_name, Application, DocumentKind, ForgeResult, StaticDocument, StoreError,
};

use crate::store::DocumentStore;

/// Document store held entirely in memory.
///
/// Counts scans so cache behaviour can be asserted, and can be told to
/// slow down scans or fail writes.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    statics: RwLock<HashMap<StaticDocument, Vec<u8>>>,
    apps: RwLock<BTreeMap<String, Application>>,
    scan_count: AtomicUsize,
    scan_delay: Option<Duration>,
    fail_writes: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every scan, widening the window for concurrent callers.
    pub fn with_scan_delay(mut self, delay: Duration) -> Self {
        self.scan_delay = Some(delay);
        self
    }

    /// Insert an application without going through the write path.
    pub fn insert(&self, app: Application) {
        self.apps
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(app.name.clone(), app);
    }

    /// Set the raw bytes of a static document.
    pub fn put_static(&self, doc: StaticDocument, bytes: impl Into<Vec<u8>>) {
        self.statics
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(doc, bytes.into());
    }

    /// Number of full scans performed so far.
    pub fn scan_count(&self) -> usize {
        self.scan_count.load(Ordering::SeqCst)
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn read_static(&self, doc: &StaticDocument) -> ForgeResult<Vec<u8>> {
        let statics = self.statics.read().unwrap_or_else(PoisonError::into_inner);
        statics.get(doc).cloned().ok_or_else(|| {
            let (kind, name) = match doc {
                StaticDocument::TemplateIndex => (DocumentKind::TemplateIndex, "template.index"),
                StaticDocument::TableIndex => (DocumentKind::TableIndex, "table.index"),
                StaticDocument::Table(name) => (DocumentKind::Table, name.as_str()),
            };
            StoreError::NotFound {
                kind,
                name: name.to_string(),
            }
            .into()
        })
    }

    async fn scan_applications(&self) -> ForgeResult<BTreeMap<String, Application>> {
        self.scan_count.fetch_add(1, Ordering::SeqCst);
        // Copy before sleeping so a slow scan sees the state at its start.
        let apps = self
            .apps
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(delay) = self.scan_delay {
            tokio::time::sleep(delay).await;
        }
        Ok(apps)
    }

    async fn write_application(&self, app: &Application) -> ForgeResult<()> {
        validate_name(&app.name)?;
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Io {
                path: format!("memory://application/{}", app.name).into(),
                reason: "writes disabled".to_string(),
            }
            .into());
        }
        self.insert(app.clone());
        Ok(())
    }

    async fn ping(&self) -> ForgeResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scan_counts() {
        let store = InMemoryStore::new();
        store.insert(Application::new("a"));

        assert_eq!(store.scan_count(), 0);
        let apps = store.scan_applications().await.unwrap();
        assert_eq!(apps.len(), 1);
        assert_eq!(store.scan_count(), 1);
    }

    #[tokio::test]
    async fn test_static_not_found() {
        let store = InMemoryStore::new();
        let err = store
            .read_static(&StaticDocument::TableIndex)
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        store.put_static(StaticDocument::TableIndex, "[]");
        let bytes = store.read_static(&StaticDocument::TableIndex).await.unwrap();
        assert_eq!(bytes, b"[]".to_vec());
    }

    #[tokio::test]
    async fn test_fail_writes() {
        let store = InMemoryStore::new();
        store.set_fail_writes(true);
        assert!(store.write_application(&Application::new("a")).await.is_err());
        assert!(store.scan_applications().await.unwrap().is_empty());
    }
}
