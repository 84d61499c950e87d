//! Cache usage counters.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Point-in-time statistics for the application cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Reads served from an existing snapshot.
    pub hits: u64,
    /// Full rescans of the store.
    pub rebuilds: u64,
    /// Times the snapshot was dropped.
    pub invalidations: u64,
    /// Applications in the current snapshot (0 when none is cached).
    pub entries: u64,
    /// Whether a snapshot is currently held.
    pub cached: bool,
    /// When the held snapshot was built.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub built_at: Option<DateTime<Utc>>,
}

impl CacheStats {
    /// Fraction of reads served without a rescan (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.rebuilds;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
