//! Whole-collection application cache.
//!
//! The cache holds at most one [`ApplicationSnapshot`]: every application
//! known to the store at the moment it was built. A snapshot is immutable and
//! shared by reference between readers. Any write through the API drops it,
//! and the next read rebuilds it from a full scan.
//!
//! Rebuilds are single-flight: concurrent readers that find no snapshot wait
//! on one scan instead of each starting their own.

pub mod application;
pub mod stats;

pub use application::{ApplicationCache, ApplicationSnapshot};
pub use stats::CacheStats;
