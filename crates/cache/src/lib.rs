//! # Docdrift Cache
//!
//! Content-addressed memoization for expensive, idempotent calls (LLM drift checks).
//!
//! ## Architecture
//!
//! ```text
//! (context, current_doc, model_id)
//!     │
//!     ├──> HashKey: sha256(context) ":" sha256(doc) ":" model_id
//!     │
//!     ├──> DriftCache (Mutex<map + FIFO order>)
//!     │      ├─> hit  → cloned value
//!     │      └─> miss → compute() outside the lock → insert + evict oldest
//!     │
//!     └──> Snapshot (JSON, version 1, atomic rename)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use docdrift_cache::DriftCache;
//!
//! let cache: DriftCache<String> = DriftCache::new(16);
//! let key = cache.key("fn main() {}", "# Docs", "model-a");
//!
//! let value: Result<String, std::convert::Infallible> =
//!     cache.get_or_compute(&key, || Ok("computed".to_string()));
//! assert_eq!(value.unwrap(), "computed");
//! assert_eq!(cache.stats().size, 1);
//! ```

mod cache;
mod hash;
mod snapshot;

pub use cache::{CacheStats, DriftCache, DEFAULT_MAX_ENTRIES};
pub use hash::{cache_key, sha256_hex};
pub use snapshot::{SnapshotLoad, SnapshotSave, SNAPSHOT_SCHEMA_VERSION};
