//! Cache categories and their fixed policies.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Namespace partition of the cache. A key is unique only within its category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheCategory {
    BlockchainData,
    UserData,
    NetworkStatus,
    TransactionHistory,
    ContractData,
    WalletInfo,
}

/// Capacity and timing policy of one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryPolicy {
    pub max_items: usize,
    pub ttl: Duration,
    /// Age after which an entry should be refreshed in the background.
    pub stale_window: Duration,
}

const fn policy(max_items: usize, ttl_secs: u64, stale_secs: u64) -> CategoryPolicy {
    CategoryPolicy {
        max_items,
        ttl: Duration::from_secs(ttl_secs),
        stale_window: Duration::from_secs(stale_secs),
    }
}

impl CacheCategory {
    pub const ALL: [CacheCategory; 6] = [
        CacheCategory::BlockchainData,
        CacheCategory::UserData,
        CacheCategory::NetworkStatus,
        CacheCategory::TransactionHistory,
        CacheCategory::ContractData,
        CacheCategory::WalletInfo,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CacheCategory::BlockchainData => "blockchain_data",
            CacheCategory::UserData => "user_data",
            CacheCategory::NetworkStatus => "network_status",
            CacheCategory::TransactionHistory => "transaction_history",
            CacheCategory::ContractData => "contract_data",
            CacheCategory::WalletInfo => "wallet_info",
        }
    }

    pub fn policy(self) -> CategoryPolicy {
        match self {
            CacheCategory::BlockchainData => policy(100, 5 * 60, 2 * 60),
            CacheCategory::UserData => policy(50, 10 * 60, 5 * 60),
            CacheCategory::NetworkStatus => policy(10, 30, 15),
            CacheCategory::TransactionHistory => policy(200, 2 * 60, 60),
            CacheCategory::ContractData => policy(75, 15 * 60, 7 * 60),
            CacheCategory::WalletInfo => policy(25, 60, 30),
        }
    }

    /// Position in [`CacheCategory::ALL`].
    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for CacheCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown cache category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for CacheCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CacheCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stale_window_shorter_than_ttl() {
        for category in CacheCategory::ALL {
            let p = category.policy();
            assert!(p.stale_window < p.ttl, "{}", category);
            assert!(p.max_items > 0);
        }
    }

    #[test]
    fn test_index_matches_all() {
        for (i, category) in CacheCategory::ALL.iter().enumerate() {
            assert_eq!(category.index(), i);
        }
    }

    #[test]
    fn test_parse() {
        assert_eq!("wallet_info".parse::<CacheCategory>(), Ok(CacheCategory::WalletInfo));
        assert!("wallet".parse::<CacheCategory>().is_err());
        let json = serde_json::to_string(&CacheCategory::TransactionHistory).unwrap();
        assert_eq!(json, "\"transaction_history\"");
    }
}
