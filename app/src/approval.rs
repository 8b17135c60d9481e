//! Approval Tracker
//!
//! Decides whether the router may move the source amount on the account's
//! behalf and issues ERC20 approvals. The native asset never needs one.

use swap_client::timed_request;
use swap_core::{TxHash, TxRequest, U256};

use curve::{build_approve_data, parse_amount};

use crate::engine::{EngineState, SwapEngine};
use crate::signing::RequestKind;

impl SwapEngine {
    /// Re-read the router's allowance for the source token.
    ///
    /// `force` bypasses the allowance cache. A failed read leaves
    /// `need_approval` as it was.
    pub async fn check_approval(&self, force: bool) {
        let (seq, token, owner, router) = {
            let mut st = self.lock().await;
            let address = match st.session.swap_from.as_ref() {
                Some(from) => from.address,
                None => return,
            };
            let Some(token) = address else {
                st.session.need_approval = false;
                st.session.checking_approval = false;
                self.publish(&st);
                return;
            };

            st.approval_seq += 1;
            st.session.checking_approval = true;
            self.publish(&st);
            (st.approval_seq, token, st.account, st.network.router)
        };

        let result = timed_request(
            "allowance source",
            self.inner.chain.allowance(token, owner, router, force),
        )
        .await;

        let mut guard = self.lock().await;
        let st = &mut *guard;
        if st.approval_seq != seq {
            tracing::debug!("Discarding superseded allowance result for {}", token);
            return;
        }
        st.session.checking_approval = false;

        let current = st
            .session
            .swap_from
            .as_ref()
            .filter(|t| t.address == Some(token))
            .map(|t| t.decimals);
        let unchanged = st.account == owner && st.network.router == router;

        match (current, result) {
            (Some(decimals), Ok(allowance)) if unchanged => {
                // allowance does not depend on the amount; compare against the
                // amount entered now
                let required =
                    parse_amount(&st.session.swap_from_amount, decimals).unwrap_or(U256::ZERO);
                st.session.need_approval = allowance < required;
                tracing::debug!(
                    "Allowance of {} for router {}: {} (need {}, approval required: {})",
                    token,
                    router,
                    allowance,
                    required,
                    st.session.need_approval
                );
            }
            (Some(_), Err(e)) if unchanged => {
                tracing::warn!("Allowance check for {} failed: {}", token, e);
            }
            _ => {
                tracing::debug!("Source token or account changed during allowance check");
            }
        }

        self.publish(st);
    }

    /// Build the ERC20 `approve(router, amount)` call for the current source
    /// token and amount. `None` for the native asset or an unparsable amount.
    pub async fn build_approve_tx(&self) -> Option<TxRequest> {
        let st = self.lock().await;
        approve_request(&st).map(|(_, tx)| tx)
    }

    /// Ask the signer to approve the router for the current amount.
    ///
    /// On a returned hash the transaction is tracked until it settles; a
    /// rejection returns `None` and changes nothing.
    pub async fn approve(&self) -> Option<TxHash> {
        let (kind, tx) = {
            let st = self.lock().await;
            approve_request(&st)?
        };

        tracing::info!("Requesting approval: {} -> router {}", tx.to, tx.data_hex());
        let hash = self.request_signature(kind, tx).await?;

        tracing::info!("Approval submitted: {}", hash);
        self.enqueue_tx(hash).await;
        Some(hash)
    }
}

fn approve_request(st: &EngineState) -> Option<(RequestKind, TxRequest)> {
    let from = st.session.swap_from.as_ref()?;
    let token_address = from.address?;

    let amount = match parse_amount(&st.session.swap_from_amount, from.decimals) {
        Ok(amount) => amount,
        Err(e) => {
            tracing::debug!("Not approving {}: {}", from.symbol, e);
            return None;
        }
    };

    let tx = TxRequest {
        from: st.account,
        to: token_address,
        data: build_approve_data(st.network.router, amount),
        value: U256::ZERO,
        chain_id: st.network.chain_id,
    };

    Some((
        RequestKind::Approve {
            token: from.clone(),
            amount,
        },
        tx,
    ))
}
