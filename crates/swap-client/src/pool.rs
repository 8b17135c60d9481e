//! External pending-transaction pool

use std::collections::HashSet;

use async_trait::async_trait;
use swap_core::{TxHash, TxStatus};

use crate::Result;

/// Registry of broadcast transactions that have not settled yet
#[async_trait]
pub trait PendingPool: Send + Sync {
    /// Hashes currently pending
    async fn list_pending(&self) -> Result<HashSet<TxHash>>;

    /// Receipt status of a transaction that left the pool.
    /// Pools without receipt access report `TxStatus::Unknown`.
    async fn receipt_status(&self, _hash: TxHash) -> Result<TxStatus> {
        Ok(TxStatus::Unknown)
    }
}
