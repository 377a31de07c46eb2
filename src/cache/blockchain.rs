//! Typed helpers for the blockchain reads the club repeats most.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::category::CacheCategory;
use crate::cache::manager::{CacheError, CacheManager};

pub const NETWORK_STATUS_KEY: &str = "network_status";

fn account_key(account_id: &str) -> String {
    format!("account_{}", account_id)
}

fn tx_history_key(account_id: &str) -> String {
    format!("tx_history_{}", account_id)
}

fn wallet_key(account_id: &str) -> String {
    format!("wallet_{}", account_id)
}

/// Account, history, wallet and network-status entries over a shared [`CacheManager`].
#[derive(Debug, Clone)]
pub struct BlockchainCache {
    cache: Arc<CacheManager>,
}

impl BlockchainCache {
    pub fn new(cache: Arc<CacheManager>) -> Self {
        Self { cache }
    }

    pub fn manager(&self) -> &Arc<CacheManager> {
        &self.cache
    }

    pub async fn account_data<T: DeserializeOwned>(&self, account_id: &str) -> Option<T> {
        self.cache
            .get(&account_key(account_id), CacheCategory::BlockchainData)
            .await
    }

    pub async fn set_account_data<T>(&self, account_id: &str, data: &T) -> Result<(), CacheError>
    where
        T: Serialize + Sync + ?Sized,
    {
        self.cache
            .set(&account_key(account_id), data, CacheCategory::BlockchainData, None)
            .await
    }

    pub async fn transaction_history<T: DeserializeOwned>(&self, account_id: &str) -> Option<T> {
        self.cache
            .get(&tx_history_key(account_id), CacheCategory::TransactionHistory)
            .await
    }

    pub async fn set_transaction_history<T>(
        &self,
        account_id: &str,
        history: &T,
    ) -> Result<(), CacheError>
    where
        T: Serialize + Sync + ?Sized,
    {
        self.cache
            .set(
                &tx_history_key(account_id),
                history,
                CacheCategory::TransactionHistory,
                None,
            )
            .await
    }

    pub async fn wallet_info<T: DeserializeOwned>(&self, account_id: &str) -> Option<T> {
        self.cache
            .get(&wallet_key(account_id), CacheCategory::WalletInfo)
            .await
    }

    pub async fn set_wallet_info<T>(&self, account_id: &str, info: &T) -> Result<(), CacheError>
    where
        T: Serialize + Sync + ?Sized,
    {
        self.cache
            .set(&wallet_key(account_id), info, CacheCategory::WalletInfo, None)
            .await
    }

    pub async fn network_status<T: DeserializeOwned>(&self) -> Option<T> {
        self.cache
            .get(NETWORK_STATUS_KEY, CacheCategory::NetworkStatus)
            .await
    }

    /// `ttl` overrides the category default when set.
    pub async fn set_network_status<T>(
        &self,
        status: &T,
        ttl: Option<Duration>,
    ) -> Result<(), CacheError>
    where
        T: Serialize + Sync + ?Sized,
    {
        self.cache
            .set(NETWORK_STATUS_KEY, status, CacheCategory::NetworkStatus, ttl)
            .await
    }

    /// Drop everything cached about `account_id`.
    pub async fn invalidate_account(&self, account_id: &str) {
        let account = account_key(account_id);
        let history = tx_history_key(account_id);
        let wallet = wallet_key(account_id);
        tokio::join!(
            self.cache.invalidate(&account, CacheCategory::BlockchainData),
            self.cache.invalidate(&history, CacheCategory::TransactionHistory),
            self.cache.invalidate(&wallet, CacheCategory::WalletInfo),
        );
    }
}
