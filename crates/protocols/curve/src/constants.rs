//! Curve Router Constants
//!
//! Fixed shape of the `exchange_multiple` call and the router's sentinel
//! addresses.

use alloy_primitives::{address, Address};

/// Address the router uses for the chain's native asset
pub const NATIVE_PLACEHOLDER: Address = address!("EeeeeEeeeEeEeeEeEeEeeEEEeeeeEeeeeeeeEEeE");

/// Padding for unused route, pool and factory slots
pub const ZERO_ADDRESS: Address = Address::ZERO;

/// Router call layout
pub mod layout {
    /// Entries in the `_route` path: source + (pool, coin) per hop
    pub const ROUTE_LEN: usize = 9;

    /// Maximum hops per call (`_swap_params` and `_pools` length)
    pub const MAX_HOPS: usize = 4;

    /// Values per `_swap_params` triple: (i, j, swap_type)
    pub const SWAP_PARAM_LEN: usize = 3;
}

/// Slippage arithmetic
pub mod slippage {
    /// Basis-point denominator for the minimum-output computation
    pub const BPS_DENOMINATOR: u64 = 10_000;

    /// Basis points per percent
    pub const BPS_PER_PERCENT: f64 = 100.0;
}
