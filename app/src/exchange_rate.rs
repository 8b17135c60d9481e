//! Exchange Rate Calculator
//!
//! Amount entry is debounced; once it settles the route oracle is queried for
//! the current pair. A quote is only applied if the pair, amount and network
//! are unchanged since the query started.

use std::time::Duration;

use swap_client::timed_request;
use swap_core::ClientError;

use curve::{amounts_equal, exchange_rate, is_zero_or_empty, router_token_address};

use crate::engine::SwapEngine;

impl SwapEngine {
    /// Set the amount to sell.
    ///
    /// Zero, blank or non-numeric input clears the amount and the quote. An
    /// amount numerically equal to the current one is ignored. Anything else
    /// drops the quote and (re)starts the debounce.
    pub async fn set_swap_amount(&self, amount: &str) {
        let schedule = {
            let mut st = self.lock().await;
            if is_zero_or_empty(amount) {
                self.inner.rate_timer.cancel();
                st.session.swap_from_amount.clear();
                st.invalidate_quote();
                self.publish(&st);
                false
            } else if amounts_equal(amount, &st.session.swap_from_amount) {
                false
            } else {
                st.session.swap_from_amount = amount.to_string();
                st.invalidate_quote();
                st.session.calculating = true;
                self.publish(&st);
                true
            }
        };

        if schedule {
            self.schedule_rate_calc();
        }
    }

    /// Arm the debounce timer for a rate calculation
    pub(crate) fn schedule_rate_calc(&self) {
        if self.is_shut_down() {
            return;
        }

        let weak = self.downgrade();
        let delay = Duration::from_millis(self.inner.config.debounce_ms);
        tracing::debug!("Exchange rate calculation in {}ms", delay.as_millis());

        self.inner.rate_timer.schedule(delay, move || async move {
            if let Some(engine) = SwapEngine::upgrade(&weak) {
                engine.calc_exchange_rate().await;
            }
        });
    }

    /// Restart the debounce for the current amount after the pair changed
    pub(crate) async fn reschedule_rate_calc(&self) {
        let armed = {
            let mut st = self.lock().await;
            let ready = st.session.has_amount()
                && st.session.swap_from.is_some()
                && st.session.swap_to.is_some();
            if ready {
                st.session.calculating = true;
                self.publish(&st);
            }
            ready
        };

        if armed {
            self.schedule_rate_calc();
        }
    }

    /// Query the route oracle for the current pair and amount.
    ///
    /// Failures clear the quote; they are never propagated.
    pub async fn calc_exchange_rate(&self) {
        let key = {
            let mut st = self.lock().await;
            let ready = st.session.has_amount()
                && st.session.swap_from.is_some()
                && st.session.swap_to.is_some();
            if !ready {
                st.session.calculating = false;
                self.publish(&st);
                return;
            }
            st.session.calculating = true;
            self.publish(&st);
            st.quote_key()
        };

        self.spawn_task(|engine| async move { engine.check_approval(false).await });

        let token_in = router_token_address(key.from);
        let token_out = router_token_address(key.to);
        let result = timed_request(
            "route oracle",
            self.inner
                .oracle
                .best_route_and_output(token_in, token_out, &key.amount),
        )
        .await;

        let mut st = self.lock().await;
        if st.quote_key() != key {
            tracing::debug!(
                "Discarding quote for {} {} -> {}: request superseded",
                key.amount,
                token_in,
                token_out
            );
            return;
        }

        match result {
            Ok(quote) if !quote.route.is_empty() => {
                let rate = exchange_rate(&quote.output, &key.amount);
                tracing::debug!(
                    "Quote {} -> {} over {} hop(s), rate {}",
                    key.amount,
                    quote.output,
                    quote.route.len(),
                    rate
                );
                st.session.route = Some(quote.route);
                st.session.swap_to_amount = quote.output;
                st.session.exchange_rate = rate;
            }
            Ok(_) => {
                tracing::debug!("Route oracle returned an empty route");
                st.session.clear_quote();
            }
            Err(ClientError::NoRouteFound) => {
                tracing::debug!("No route for {} -> {}", token_in, token_out);
                st.session.clear_quote();
            }
            Err(e) => {
                tracing::warn!("Route oracle failed: {}", e);
                st.session.clear_quote();
            }
        }

        st.session.calculating = false;
        self.publish(&st);
    }
}
