//! Swap Executor
//!
//! Turns the current quote into an `exchange_multiple` router call and hands
//! it to the signer.

use swap_core::{TxHash, TxRequest};

use curve::{build_exchange_call, parse_amount, ExchangeCall, ExchangeRequest};

use crate::engine::{EngineState, SwapEngine};
use crate::signing::RequestKind;

impl SwapEngine {
    /// Encode the router call for the current quote.
    ///
    /// `None` without a non-empty route, without a positive amount, or when
    /// the route does not fit the router's call shape.
    pub async fn build_swap_payload(&self) -> Option<ExchangeCall> {
        let st = self.lock().await;
        swap_call(&st)
    }

    /// Submit the current quote for signing.
    ///
    /// A returned hash is tracked until it settles and the amount is cleared
    /// for the next swap. A rejection changes nothing.
    pub async fn swap(&self) -> Option<TxHash> {
        let (kind, tx) = {
            let st = self.lock().await;
            let call = swap_call(&st)?;
            let from = st.session.swap_from.clone()?;
            let to = st.session.swap_to.clone()?;

            let tx = TxRequest {
                from: st.account,
                to: st.network.router,
                data: call.data,
                value: call.value,
                chain_id: st.network.chain_id,
            };
            (
                RequestKind::Swap {
                    from,
                    to,
                    summary: call.summary,
                },
                tx,
            )
        };

        tracing::info!("Requesting swap via router {}", tx.to);
        let hash = self.request_signature(kind, tx).await?;

        tracing::info!("Swap submitted: {}", hash);
        self.enqueue_tx(hash).await;
        self.set_swap_amount("").await;
        Some(hash)
    }
}

fn swap_call(st: &EngineState) -> Option<ExchangeCall> {
    let session = &st.session;
    let from = session.swap_from.as_ref()?;
    let to = session.swap_to.as_ref()?;
    let route = session.route.as_ref().filter(|r| !r.is_empty())?;

    if !session.is_valid_from_amount() {
        return None;
    }

    let parsed = parse_amount(&session.swap_from_amount, from.decimals).and_then(|amount_in| {
        parse_amount(&session.swap_to_amount, to.decimals).map(|out| (amount_in, out))
    });
    let (amount_in, expected_out) = match parsed {
        Ok(amounts) => amounts,
        Err(e) => {
            tracing::debug!("Swap not buildable: {}", e);
            return None;
        }
    };

    let request = ExchangeRequest {
        source: from.address,
        route: route.clone(),
        amount_in,
        expected_out,
        slippage: session.slippage,
    };

    match build_exchange_call(&request) {
        Ok(call) => Some(call),
        Err(e) => {
            tracing::warn!("Swap build aborted: {}", e);
            None
        }
    }
}
