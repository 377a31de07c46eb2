//! Cache subsystem.
//!
//! # Data Flow
//! ```text
//! get(key, category):
//!     → fast map (DashMap, whole items, TTL checked)
//!     → per-category LRU (capacity bound, TTL checked, promotes on hit)
//!     → persistent store (`cache_<category>_<key>` → JSON CacheItem)
//!     → fallback producer, result written back to all tiers
//!
//! set(key, data, category, ttl?):
//!     → LRU (may evict; the evicted key also leaves the fast map)
//!     → fast map
//!     → persistent store (best effort)
//! ```
//!
//! # Design Decisions
//! - Category policies are constants fixed at construction
//! - Persistent-tier errors are swallowed and counted
//! - Time comes from an injected `Clock` so TTL behavior is testable

pub mod blockchain;
pub mod category;
pub mod clock;
pub mod item;
pub mod manager;
pub mod store;

pub use blockchain::BlockchainCache;
pub use category::{CacheCategory, CategoryPolicy};
pub use clock::{Clock, ManualClock, SystemClock};
pub use item::{CacheItem, Freshness};
pub use manager::{CacheError, CacheManager, CategoryStats, WarmupEntry};
pub use store::{JsonFileStore, MemoryStore, PersistentStore, StoreError};
