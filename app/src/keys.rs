//! Preference keys

use swap_core::ChainId;

pub const SELECTED_NETWORK: &str = "exchange-userSelectedNetwork";

pub const SELECTED_ACCOUNT: &str = "exchange-userSelectedAccount";

/// Customised token list of a network (JSON array of token entries)
pub fn user_tokens(chain_id: ChainId) -> String {
    format!("{}-exchange-userTokens", chain_id)
}

/// Selected source token (`""` for the native asset)
pub fn swap_from(chain_id: ChainId) -> String {
    format!("{}-exchange-from", chain_id)
}

/// Selected destination token (`""` for the native asset)
pub fn swap_to(chain_id: ChainId) -> String {
    format!("{}-exchange-to", chain_id)
}

pub fn slippage(chain_id: ChainId) -> String {
    format!("{}-exchange-slippage", chain_id)
}
