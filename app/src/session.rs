//! Swap Session state and its published snapshot

use serde::Serialize;
use swap_core::{Address, ChainId, RouteStep, Token, TxHash};

use curve::{is_positive_amount, is_zero_or_empty};

use crate::tx_watcher::SettledTx;

/// Mutable state of one exchange interaction.
///
/// `exchange_rate`, `swap_to_amount` and `route` always belong to the latest
/// successful quote for the current pair and amount; any change to those
/// inputs resets them.
#[derive(Debug, Clone)]
pub struct SwapSession {
    pub swap_from: Option<Token>,
    pub swap_to: Option<Token>,
    pub swap_from_amount: String,
    pub swap_to_amount: String,
    pub exchange_rate: f64,
    pub route: Option<Vec<RouteStep>>,
    pub need_approval: bool,
    pub calculating: bool,
    pub checking_approval: bool,
    pub slippage: f64,
}

impl SwapSession {
    pub fn new(slippage: f64) -> Self {
        Self {
            swap_from: None,
            swap_to: None,
            swap_from_amount: String::new(),
            swap_to_amount: String::new(),
            exchange_rate: 0.0,
            route: None,
            need_approval: false,
            calculating: false,
            checking_approval: false,
            slippage,
        }
    }

    /// Drop the current quote
    pub(crate) fn clear_quote(&mut self) {
        self.swap_to_amount.clear();
        self.exchange_rate = 0.0;
        self.route = None;
        self.calculating = false;
    }

    pub fn has_amount(&self) -> bool {
        !is_zero_or_empty(&self.swap_from_amount)
    }

    pub fn is_valid_from_amount(&self) -> bool {
        self.swap_from
            .as_ref()
            .map(|t| is_positive_amount(&self.swap_from_amount, t.decimals))
            .unwrap_or(false)
    }

    pub fn is_valid_output_amount(&self) -> bool {
        self.swap_to
            .as_ref()
            .map(|t| is_positive_amount(&self.swap_to_amount, t.decimals))
            .unwrap_or(false)
    }
}

/// Parameters a rate computation was started with
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct QuoteKey {
    pub generation: u64,
    pub chain_id: ChainId,
    pub from: Option<Address>,
    pub to: Option<Address>,
    pub amount: String,
}

/// Everything a presentation layer needs, published after every change
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapSnapshot {
    pub chain_id: ChainId,
    pub account: Address,
    pub tokens: Vec<Token>,
    pub swap_from: Option<Token>,
    pub swap_to: Option<Token>,
    pub swap_from_amount: String,
    pub swap_to_amount: String,
    pub exchange_rate: f64,
    pub route: Option<Vec<RouteStep>>,
    pub need_approval: bool,
    pub calculating: bool,
    pub checking_approval: bool,
    pub slippage: f64,
    pub is_valid_from_amount: bool,
    pub is_valid_output_amount: bool,
    pub pending_txs: Vec<TxHash>,
    pub settled_txs: Vec<SettledTx>,
}

impl Default for SwapSnapshot {
    fn default() -> Self {
        Self {
            chain_id: 0,
            account: Address::ZERO,
            tokens: Vec::new(),
            swap_from: None,
            swap_to: None,
            swap_from_amount: String::new(),
            swap_to_amount: String::new(),
            exchange_rate: 0.0,
            route: None,
            need_approval: false,
            calculating: false,
            checking_approval: false,
            slippage: swap_core::constants::DEFAULT_SLIPPAGE,
            is_valid_from_amount: false,
            is_valid_output_amount: false,
            pending_txs: Vec::new(),
            settled_txs: Vec::new(),
        }
    }
}
