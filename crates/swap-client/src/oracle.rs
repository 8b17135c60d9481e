//! Route oracle interface
//!
//! The quoting service is opaque: it takes a pair and an amount and answers
//! with the best multi-hop route and its expected output, or fails.

use async_trait::async_trait;
use swap_core::{Address, RouteQuote};

use crate::Result;

/// Best-route oracle for the multi-pool router
#[async_trait]
pub trait RouteOracle: Send + Sync {
    /// Best route from `token_in` to `token_out` for `amount_in` (decimal
    /// string in `token_in` units). The native asset is passed as the router's
    /// native placeholder address.
    ///
    /// Fails with `ClientError::NoRouteFound` when no route exists and
    /// `ClientError::Unreachable` when the service cannot be reached.
    async fn best_route_and_output(
        &self,
        token_in: Address,
        token_out: Address,
        amount_in: &str,
    ) -> Result<RouteQuote>;
}
