//! Async document store trait.
//!
//! Implementations own all filesystem (or other backing) access. They never
//! touch the application cache: invalidation is the caller's job.

use std::collections::BTreeMap;

use async_trait::async_trait;
use appforge_core::{Application, ForgeResult, StaticDocument};

/// Persistence contract for application documents and static reference data.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read a static document verbatim. No parsing, no caching.
    async fn read_static(&self, doc: &StaticDocument) -> ForgeResult<Vec<u8>>;

    /// Load every application document, keyed by its parsed `name`.
    async fn scan_applications(&self) -> ForgeResult<BTreeMap<String, Application>>;

    /// Persist an application, replacing any document with the same name.
    async fn write_application(&self, app: &Application) -> ForgeResult<()>;

    /// Check the backing storage is usable.
    async fn ping(&self) -> ForgeResult<()>;
}
