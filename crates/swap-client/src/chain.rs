//! Balance / allowance source
//!
//! [`ChainReader`] is the engine's only view of on-chain token state.
//! [`CachedChainReader`] puts a short-lived allowance cache in front of any
//! reader; a `force` read skips the cache and refreshes it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use swap_core::{Address, ChainId, Token, TokenInfo, U256};
use tokio::sync::RwLock;

use crate::Result;

/// Reads balances, allowances and token metadata
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// Balance of `token.owner` in the token's smallest unit
    async fn balance(&self, token: &Token) -> Result<U256>;

    /// ERC20 allowance `owner -> spender` on `token`.
    /// `force` bypasses any caching between the caller and the chain.
    async fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
        force: bool,
    ) -> Result<U256>;

    /// Symbol and decimals of an ERC20 contract
    async fn token_info(&self, chain_id: ChainId, address: Address) -> Result<TokenInfo>;
}

#[async_trait]
impl<T: ChainReader + ?Sized> ChainReader for Arc<T> {
    async fn balance(&self, token: &Token) -> Result<U256> {
        (**self).balance(token).await
    }

    async fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
        force: bool,
    ) -> Result<U256> {
        (**self).allowance(token, owner, spender, force).await
    }

    async fn token_info(&self, chain_id: ChainId, address: Address) -> Result<TokenInfo> {
        (**self).token_info(chain_id, address).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct AllowanceKey {
    token: Address,
    owner: Address,
    spender: Address,
}

#[derive(Clone)]
struct CachedAllowance {
    fetched_at: Instant,
    value: U256,
}

/// Allowance cache in front of another [`ChainReader`].
///
/// Balances and token metadata pass straight through.
#[derive(Clone)]
pub struct CachedChainReader<R> {
    inner: R,
    ttl: Duration,
    allowances: Arc<RwLock<HashMap<AllowanceKey, CachedAllowance>>>,
}

impl<R: ChainReader> CachedChainReader<R> {
    pub fn new(inner: R, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            allowances: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    async fn cached(&self, key: &AllowanceKey) -> Option<U256> {
        let cache = self.allowances.read().await;
        cache
            .get(key)
            .filter(|entry| entry.fetched_at.elapsed() < self.ttl)
            .map(|entry| entry.value)
    }
}

#[async_trait]
impl<R: ChainReader> ChainReader for CachedChainReader<R> {
    async fn balance(&self, token: &Token) -> Result<U256> {
        self.inner.balance(token).await
    }

    async fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
        force: bool,
    ) -> Result<U256> {
        let key = AllowanceKey {
            token,
            owner,
            spender,
        };

        if !force {
            if let Some(value) = self.cached(&key).await {
                return Ok(value);
            }
        }

        let value = self.inner.allowance(token, owner, spender, force).await?;
        self.allowances.write().await.insert(
            key,
            CachedAllowance {
                fetched_at: Instant::now(),
                value,
            },
        );
        Ok(value)
    }

    async fn token_info(&self, chain_id: ChainId, address: Address) -> Result<TokenInfo> {
        self.inner.token_info(chain_id, address).await
    }
}
