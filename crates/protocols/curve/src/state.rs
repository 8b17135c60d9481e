//! Curve Router State Types
//!
//! Inputs and outputs of the `exchange_multiple` call builder.

use std::fmt;

use alloy_primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};
use swap_core::RouteStep;

use crate::constants::layout::{MAX_HOPS, ROUTE_LEN, SWAP_PARAM_LEN};

/// Everything needed to encode one router swap.
///
/// Amounts are already in the smallest unit of their token.
#[derive(Debug, Clone)]
pub struct ExchangeRequest {
    /// Source token; `None` is the native asset
    pub source: Option<Address>,
    pub route: Vec<RouteStep>,
    pub amount_in: U256,
    /// Quoted output before slippage
    pub expected_out: U256,
    /// Percent, clamped into `[0, 99]` when applied
    pub slippage: f64,
}

/// The three fixed-size arrays of an `exchange_multiple` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeArrays {
    /// Source, then (pool, output coin) per hop, zero padded
    pub route: [Address; ROUTE_LEN],
    /// (i, j, swap_type) per hop, zero padded
    pub swap_params: [[U256; SWAP_PARAM_LEN]; MAX_HOPS],
    /// Factory swap address per hop, zero padded
    pub pools: [Address; MAX_HOPS],
}

impl ExchangeArrays {
    /// Route entries before the padding
    pub fn natural_len(&self) -> usize {
        self.route
            .iter()
            .rposition(|a| *a != Address::ZERO)
            .map(|i| i + 1)
            .unwrap_or(0)
    }
}

/// Encoded router call
#[derive(Debug, Clone)]
pub struct ExchangeCall {
    pub data: Bytes,
    /// Native value attached to the call
    pub value: U256,
    pub summary: SwapTxSummary,
}

/// Summary of the swap call for glue layers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapTxSummary {
    pub hops: usize,
    pub amount_in: U256,
    pub expected_out: U256,
    pub min_output: U256,
    pub slippage_bps: u64,
    pub native_in: bool,
}

impl fmt::Display for SwapTxSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} hop(s) | in: {}{} | out >= {} ({} bps)",
            self.hops,
            self.amount_in,
            if self.native_in { " (native)" } else { "" },
            self.min_output,
            self.slippage_bps
        )
    }
}
