//! appforge Storage - Document Store and Application Cache
//!
//! [`DocumentStore`] is the persistence contract: one JSON document per
//! application under the data root, plus read-only static documents.
//! [`ApplicationCache`] keeps a wholesale-rebuildable snapshot of every
//! application on top of a store.

pub mod cache;
pub mod file_store;
pub mod memory;
pub mod store;

pub use cache::{ApplicationCache, ApplicationSnapshot, CacheStats};
pub use file_store::FileStore;
pub use memory::InMemoryStore;
pub use store::DocumentStore;
