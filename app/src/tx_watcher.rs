//! Pending transaction tracker
//!
//! Polls the external pending pool for the transactions this engine
//! submitted. A hash settles once the pool stops reporting it; every poll
//! that settles something forces one allowance re-check, since a settled
//! approval changes what the router may spend.
//!
//! Polling runs until nothing is pending. There is no backoff and no attempt
//! limit; a failing pool is simply asked again on the next tick.

use std::collections::{HashSet, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::sync::Weak;
use std::time::Duration;

use serde::Serialize;
use swap_client::timed_request;
use swap_core::{TxHash, TxStatus};

use crate::engine::{EngineInner, SwapEngine};

/// Settled transactions kept for display
const SETTLED_HISTORY: usize = 16;

/// A transaction that left the pending pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SettledTx {
    pub hash: TxHash,
    pub status: TxStatus,
}

/// Hashes awaiting settlement plus a short settlement history
#[derive(Debug, Default)]
pub struct PendingTxs {
    hashes: HashSet<TxHash>,
    settled: VecDeque<SettledTx>,
}

impl PendingTxs {
    /// Returns false if the hash was already tracked
    pub fn insert(&mut self, hash: TxHash) -> bool {
        self.hashes.insert(hash)
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    /// Tracked hashes in a stable order
    pub fn hashes(&self) -> Vec<TxHash> {
        let mut hashes: Vec<TxHash> = self.hashes.iter().copied().collect();
        hashes.sort();
        hashes
    }

    pub fn tracked(&self) -> HashSet<TxHash> {
        self.hashes.clone()
    }

    /// Drop every hash of `polled` the pool no longer reports.
    ///
    /// Hashes enqueued after `polled` was taken are left alone.
    pub fn settle(
        &mut self,
        polled: &HashSet<TxHash>,
        still_pending: &HashSet<TxHash>,
    ) -> Vec<TxHash> {
        let mut settled: Vec<TxHash> = polled
            .iter()
            .filter(|hash| !still_pending.contains(*hash) && self.hashes.contains(*hash))
            .copied()
            .collect();
        settled.sort();
        for hash in &settled {
            self.hashes.remove(hash);
        }
        settled
    }

    pub fn record(&mut self, tx: SettledTx) {
        if self.settled.len() == SETTLED_HISTORY {
            self.settled.pop_front();
        }
        self.settled.push_back(tx);
    }

    /// Most recent last
    pub fn settled(&self) -> Vec<SettledTx> {
        self.settled.iter().copied().collect()
    }
}

impl SwapEngine {
    /// Track a broadcast transaction and (re)arm the poll timer
    pub async fn enqueue_tx(&self, hash: TxHash) {
        {
            let mut st = self.lock().await;
            if st.pending.insert(hash) {
                tracing::info!("Tracking transaction {} ({} pending)", hash, st.pending.len());
            }
            self.publish(&st);
        }
        self.schedule_poll();
    }

    pub(crate) fn schedule_poll(&self) {
        if self.is_shut_down() {
            return;
        }
        let weak = self.downgrade();
        let interval = Duration::from_millis(self.inner.config.pending_poll_ms);
        self.inner
            .poll_timer
            .schedule(interval, move || poll_after_timer(weak));
    }

    /// One poll of the pending pool
    pub async fn poll_pending(&self) {
        let polled = self.lock().await.pending.tracked();
        if polled.is_empty() {
            return;
        }

        let still_pending =
            match timed_request("pending pool", self.inner.pool.list_pending()).await {
                Ok(pending) => pending,
                Err(e) => {
                    tracing::warn!("Pending pool query failed: {}", e);
                    self.schedule_poll();
                    return;
                }
            };

        let (settled, remaining) = {
            let mut st = self.lock().await;
            let settled = st.pending.settle(&polled, &still_pending);
            (settled, !st.pending.is_empty())
        };

        if !settled.is_empty() {
            for hash in settled {
                let status =
                    match timed_request("pending pool", self.inner.pool.receipt_status(hash)).await
                    {
                        Ok(status) => status,
                        Err(e) => {
                            tracing::debug!("No receipt status for {}: {}", hash, e);
                            TxStatus::Unknown
                        }
                    };

                match status {
                    TxStatus::Reverted => tracing::warn!("Transaction {} reverted", hash),
                    _ => tracing::info!("Transaction {} settled ({})", hash, status),
                }

                let mut st = self.lock().await;
                st.pending.record(SettledTx { hash, status });
                self.publish(&st);
            }

            // must not hold up re-arming the poll
            self.spawn_task(|engine| async move { engine.check_approval(true).await });
            self.spawn_task(|engine| async move { engine.refresh_from_balance().await });
        }

        if remaining {
            self.schedule_poll();
        } else {
            tracing::debug!("No pending transactions left, polling stopped");
        }
    }
}

fn poll_after_timer(weak: Weak<EngineInner>) -> Pin<Box<dyn Future<Output = ()> + Send>> {
    Box::pin(async move {
        if let Some(engine) = SwapEngine::upgrade(&weak) {
            engine.poll_pending().await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{hash, settle, Harness};
    use std::sync::atomic::Ordering;

    #[test]
    fn test_settle_ignores_hashes_enqueued_after_poll() {
        let mut pending = PendingTxs::default();
        pending.insert(hash(1));
        let polled = pending.tracked();
        pending.insert(hash(2));

        let settled = pending.settle(&polled, &HashSet::new());
        assert_eq!(settled, vec![hash(1)]);
        assert_eq!(pending.hashes(), vec![hash(2)]);
    }

    #[test]
    fn test_settled_history_is_bounded() {
        let mut pending = PendingTxs::default();
        for n in 0..20u8 {
            pending.record(SettledTx {
                hash: hash(n),
                status: TxStatus::Unknown,
            });
        }
        let settled = pending.settled();
        assert_eq!(settled.len(), SETTLED_HISTORY);
        assert_eq!(settled[0].hash, hash(4));
        assert_eq!(settled.last().unwrap().hash, hash(19));
    }

    async fn selling_usdc() -> Harness {
        let h = Harness::new().await;
        h.engine.switch_swap_from(h.token("USDC")).await;
        settle().await;
        h
    }

    #[tokio::test(start_paused = true)]
    async fn test_settlement_triggers_one_forced_recheck() {
        let h = selling_usdc().await;
        let forced = h.chain.forced_allowance_calls.load(Ordering::SeqCst);

        h.pool.set_pending(&[hash(1)]);
        h.engine.enqueue_tx(hash(1)).await;
        assert_eq!(h.engine.snapshot().pending_txs, vec![hash(1)]);

        // still pending on the first poll
        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(h.pool.list_calls.load(Ordering::SeqCst), 1);
        assert_eq!(h.engine.snapshot().pending_txs, vec![hash(1)]);
        assert_eq!(h.chain.forced_allowance_calls.load(Ordering::SeqCst), forced);

        h.pool.set_pending(&[]);
        tokio::time::sleep(Duration::from_millis(1000)).await;

        let snap = h.engine.snapshot();
        assert!(snap.pending_txs.is_empty());
        assert_eq!(snap.settled_txs.len(), 1);
        assert_eq!(snap.settled_txs[0].hash, hash(1));
        assert_eq!(
            h.chain.forced_allowance_calls.load(Ordering::SeqCst),
            forced + 1
        );

        // polling stopped
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(h.pool.list_calls.load(Ordering::SeqCst), 2);
        assert_eq!(
            h.chain.forced_allowance_calls.load(Ordering::SeqCst),
            forced + 1
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_allowance_read_does_not_delay_polling() {
        let h = selling_usdc().await;
        h.chain.set_allowance_delay(Duration::from_secs(10));
        h.pool.set_pending(&[hash(2)]);
        h.engine.enqueue_tx(hash(1)).await;
        h.engine.enqueue_tx(hash(2)).await;

        // hash(1) settles, its re-check hangs on the allowance source
        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(h.engine.snapshot().pending_txs, vec![hash(2)]);

        h.pool.set_pending(&[]);
        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(h.pool.list_calls.load(Ordering::SeqCst), 2);
        assert!(h.engine.snapshot().pending_txs.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_of_enqueues_coalesces_into_one_poll() {
        let h = Harness::new().await;
        h.pool.set_pending(&[hash(1), hash(2), hash(3)]);

        for n in 1..=3u8 {
            h.engine.enqueue_tx(hash(n)).await;
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        // last enqueue at 200ms, poll due at 1200ms
        tokio::time::sleep(Duration::from_millis(800)).await;
        assert_eq!(h.pool.list_calls.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(h.pool.list_calls.load(Ordering::SeqCst), 1);
        assert_eq!(h.engine.snapshot().pending_txs.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_partial_settlement_keeps_polling() {
        let h = Harness::new().await;
        h.pool.set_pending(&[hash(2)]);
        h.engine.enqueue_tx(hash(1)).await;
        h.engine.enqueue_tx(hash(2)).await;

        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(h.engine.snapshot().pending_txs, vec![hash(2)]);

        h.pool.set_pending(&[]);
        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert!(h.engine.snapshot().pending_txs.is_empty());
        assert_eq!(h.engine.snapshot().settled_txs.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_receipt_status_is_recorded() {
        let h = Harness::new().await;
        h.pool.set_status(hash(7), TxStatus::Reverted);
        h.engine.enqueue_tx(hash(7)).await;
        h.engine.enqueue_tx(hash(8)).await;

        tokio::time::sleep(Duration::from_millis(1100)).await;
        let settled = h.engine.snapshot().settled_txs;
        assert_eq!(
            settled,
            vec![
                SettledTx {
                    hash: hash(7),
                    status: TxStatus::Reverted
                },
                SettledTx {
                    hash: hash(8),
                    status: TxStatus::Unknown
                },
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_pool_failure_retries() {
        let h = Harness::new().await;
        h.pool.fail(true);
        h.engine.enqueue_tx(hash(1)).await;

        tokio::time::sleep(Duration::from_millis(3100)).await;
        assert_eq!(h.pool.list_calls.load(Ordering::SeqCst), 3);
        assert_eq!(h.engine.snapshot().pending_txs, vec![hash(1)]);

        h.pool.fail(false);
        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert!(h.engine.snapshot().pending_txs.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_settlement_refreshes_balance() {
        let h = selling_usdc().await;
        let one_usdc = swap_core::U256::from(1_000_000u64);
        h.chain.set_balance(one_usdc);
        h.engine.enqueue_tx(hash(1)).await;

        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert_eq!(
            h.engine.snapshot().swap_from.unwrap().balance,
            Some(one_usdc)
        );
    }
}
