//! Router Call Builder
//!
//! Encodes calls against the Curve multi-pool router and ERC20 allowances.
//!
//! # Call Layout
//!
//! `exchange_multiple(address[9],uint256[3][4],uint256,uint256,address[4])`
//!
//! - `route`: source token, then `(pool, output coin)` per hop, zero padded to 9
//! - `swap_params`: `(i, j, swap_type)` per hop, zero padded to 4 triples
//! - `amount`: input in the source token's smallest unit
//! - `expected`: minimum output after slippage
//! - `pools`: factory swap address per hop, zero padded to 4

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{sol, SolCall};
use swap_core::{BuildError, RouteStep};

use crate::calculator::{min_output, slippage_bps};
use crate::constants::layout::{MAX_HOPS, ROUTE_LEN, SWAP_PARAM_LEN};
use crate::constants::{NATIVE_PLACEHOLDER, ZERO_ADDRESS};
use crate::state::{ExchangeArrays, ExchangeCall, ExchangeRequest, SwapTxSummary};

sol! {
    interface ICurveRouter {
        function exchange_multiple(
            address[9] route,
            uint256[3][4] swap_params,
            uint256 amount,
            uint256 expected,
            address[4] pools
        ) external payable returns (uint256);
    }

    interface IERC20 {
        function approve(address spender, uint256 amount) external returns (bool);
    }
}

// =============================================================================
// Route Arrays
// =============================================================================

/// Router address for a source token (`None` is the native asset)
pub fn router_token_address(token: Option<Address>) -> Address {
    token.unwrap_or(NATIVE_PLACEHOLDER)
}

/// Build the fixed-size route, swap parameter and pool arrays.
///
/// Fails with `NoRoute` for an empty route and `TooManyHops` when the path
/// would not fit into the router's 9 slots.
pub fn build_route_arrays(
    source: Option<Address>,
    route: &[RouteStep],
) -> Result<ExchangeArrays, BuildError> {
    if route.is_empty() {
        return Err(BuildError::NoRoute);
    }

    let path_len = 1 + 2 * route.len();
    if path_len > ROUTE_LEN || route.len() > MAX_HOPS {
        return Err(BuildError::TooManyHops { hops: route.len() });
    }

    let mut path = [ZERO_ADDRESS; ROUTE_LEN];
    let mut swap_params = [[U256::ZERO; SWAP_PARAM_LEN]; MAX_HOPS];
    let mut pools = [ZERO_ADDRESS; MAX_HOPS];

    path[0] = router_token_address(source);
    for (hop, step) in route.iter().enumerate() {
        path[1 + 2 * hop] = step.pool_address;
        path[2 + 2 * hop] = step.output_coin_address;
        swap_params[hop] = [
            U256::from(step.input_index),
            U256::from(step.output_index),
            U256::from(step.swap_type),
        ];
        pools[hop] = step.swap_address;
    }

    Ok(ExchangeArrays {
        route: path,
        swap_params,
        pools,
    })
}

// =============================================================================
// Call Encoding
// =============================================================================

/// Encode `exchange_multiple` for a computed route.
///
/// The attached value is the input amount when the source is the native
/// asset, zero otherwise.
pub fn build_exchange_call(request: &ExchangeRequest) -> Result<ExchangeCall, BuildError> {
    if request.amount_in.is_zero() {
        return Err(BuildError::InvalidAmount {
            message: "input amount is zero".to_string(),
        });
    }

    let arrays = build_route_arrays(request.source, &request.route)?;
    let min_out = min_output(request.expected_out, request.slippage);
    let native_in = request.source.is_none();

    let call = ICurveRouter::exchange_multipleCall {
        route: arrays.route,
        swap_params: arrays.swap_params,
        amount: request.amount_in,
        expected: min_out,
        pools: arrays.pools,
    };

    let summary = SwapTxSummary {
        hops: request.route.len(),
        amount_in: request.amount_in,
        expected_out: request.expected_out,
        min_output: min_out,
        slippage_bps: slippage_bps(request.slippage),
        native_in,
    };

    tracing::debug!("Built exchange_multiple call: {}", summary);

    Ok(ExchangeCall {
        data: Bytes::from(call.abi_encode()),
        value: if native_in { request.amount_in } else { U256::ZERO },
        summary,
    })
}

/// Encode ERC20 `approve(spender, amount)`
pub fn build_approve_data(spender: Address, amount: U256) -> Bytes {
    Bytes::from(IERC20::approveCall { spender, amount }.abi_encode())
}
