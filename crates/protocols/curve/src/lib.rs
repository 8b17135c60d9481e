//! Curve Router Integration
//!
//! Pure logic for swapping through the Curve multi-pool router: amount and
//! slippage math, fixed-shape route arrays and call encoding. Nothing here
//! performs I/O.

pub mod calculator;
pub mod constants;
pub mod state;
pub mod tx_builder;

// Re-exports
pub use calculator::{
    amounts_equal, exchange_rate, is_positive_amount, is_zero_or_empty, min_output,
    normalize_slippage, numeric_value, parse_amount, parse_slippage, slippage_bps,
};
pub use constants::{layout, slippage, NATIVE_PLACEHOLDER, ZERO_ADDRESS};
pub use state::{ExchangeArrays, ExchangeCall, ExchangeRequest, SwapTxSummary};
pub use tx_builder::{
    build_approve_data, build_exchange_call, build_route_arrays, router_token_address,
};
