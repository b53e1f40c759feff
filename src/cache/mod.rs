//! Response cache
//!
//! Two-tier cache keyed by request fingerprint: a hot in-memory LRU tier
//! of configured capacity, and a demoted on-disk tier holding one JSON
//! file per fingerprint. The cache is a single-process optimization
//! layer, not a source of truth; only status-200 responses with
//! non-empty bodies are ever stored.

mod store;
mod types;

pub use store::{CacheConfig, ResponseCache};
pub use types::CacheEntry;
