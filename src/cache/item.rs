//! Cached values and their freshness.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::cache::category::CacheCategory;

/// A value wrapped with its insertion time and lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheItem<T> {
    pub data: T,
    /// Insertion time, ms since the epoch.
    pub timestamp: u64,
    /// Lifetime in ms.
    pub ttl: u64,
    pub key: String,
    #[serde(rename = "type")]
    pub category: CacheCategory,
}

/// Where an item sits on its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Freshness {
    /// `age < ttl`
    Fresh,
    /// `ttl <= age < ttl + stale_window`
    StaleUsable,
    Expired,
}

impl<T> CacheItem<T> {
    pub fn age(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.timestamp)
    }

    pub fn is_fresh(&self, now_ms: u64) -> bool {
        self.age(now_ms) < self.ttl
    }

    pub fn freshness(&self, now_ms: u64, stale_window: Duration) -> Freshness {
        let age = self.age(now_ms);
        if age < self.ttl {
            Freshness::Fresh
        } else if age < self.ttl.saturating_add(stale_window.as_millis() as u64) {
            Freshness::StaleUsable
        } else {
            Freshness::Expired
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(timestamp: u64, ttl: u64) -> CacheItem<u32> {
        CacheItem {
            data: 7,
            timestamp,
            ttl,
            key: "k".into(),
            category: CacheCategory::UserData,
        }
    }

    #[test]
    fn test_freshness_boundaries() {
        let it = item(1_000, 100);
        let window = Duration::from_millis(50);
        assert_eq!(it.freshness(1_099, window), Freshness::Fresh);
        assert_eq!(it.freshness(1_100, window), Freshness::StaleUsable);
        assert_eq!(it.freshness(1_149, window), Freshness::StaleUsable);
        assert_eq!(it.freshness(1_150, window), Freshness::Expired);
        assert!(!it.is_fresh(1_100));
    }

    #[test]
    fn test_clock_behind_timestamp() {
        assert!(item(5_000, 10).is_fresh(4_000));
    }

    #[test]
    fn test_wire_shape() {
        let json = serde_json::to_value(item(1, 2)).unwrap();
        assert_eq!(json["type"], "user_data");
        assert_eq!(json["ttl"], 2);
    }
}
