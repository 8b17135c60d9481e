//! Core type definitions for the swap engine

use std::fmt;

use serde::{Deserialize, Serialize};

pub use alloy_primitives::{Address, Bytes, TxHash, U256};

/// EIP-155 chain id
pub type ChainId = u64;

/// Token entry as stored in a network's default or user-customised list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub address: Address,
    pub symbol: String,
    pub decimals: u8,
}

impl TokenInfo {
    pub fn new(address: Address, symbol: impl Into<String>, decimals: u8) -> Self {
        Self {
            address,
            symbol: symbol.into(),
            decimals,
        }
    }
}

/// A swappable token bound to an owner.
///
/// Identity is `(address, chain_id)`; `address == None` is the chain's native
/// asset. `balance` is refreshed from the chain and may be stale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub address: Option<Address>,
    pub symbol: String,
    pub decimals: u8,
    pub chain_id: ChainId,
    pub owner: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<U256>,
}

impl Token {
    /// The chain's native asset (never needs an approval)
    pub fn native(chain_id: ChainId, symbol: impl Into<String>, owner: Address) -> Self {
        Self {
            address: None,
            symbol: symbol.into(),
            decimals: constants::NATIVE_DECIMALS,
            chain_id,
            owner,
            balance: None,
        }
    }

    /// An ERC20 token from a token list entry
    pub fn erc20(info: &TokenInfo, chain_id: ChainId, owner: Address) -> Self {
        Self {
            address: Some(info.address),
            symbol: info.symbol.clone(),
            decimals: info.decimals,
            chain_id,
            owner,
            balance: None,
        }
    }

    pub fn is_native(&self) -> bool {
        self.address.is_none()
    }

    /// Rebind the balance-query identity; the cached balance belongs to the
    /// previous owner and is dropped.
    pub fn set_owner(&mut self, owner: Address) {
        if self.owner != owner {
            self.owner = owner;
            self.balance = None;
        }
    }

    /// Same token on the same chain, ignoring owner and balance
    pub fn same_asset(&self, other: &Token) -> bool {
        self.address == other.address && self.chain_id == other.chain_id
    }

    /// Key used when persisting a token selection (empty for the native asset)
    pub fn storage_id(&self) -> String {
        self.address.map(|a| a.to_string()).unwrap_or_default()
    }

    /// Token list entry for a non-native token
    pub fn info(&self) -> Option<TokenInfo> {
        self.address
            .map(|address| TokenInfo::new(address, self.symbol.clone(), self.decimals))
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.address {
            Some(address) => write!(f, "{} ({})", self.symbol, address),
            None => write!(f, "{} (native)", self.symbol),
        }
    }
}

/// A network the engine can swap on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub chain_id: ChainId,
    pub name: String,
    /// Native asset symbol
    pub symbol: String,
    /// Multi-pool router contract
    pub router: Address,
    #[serde(default)]
    pub default_tokens: Vec<TokenInfo>,
}

/// One hop of a router path.
///
/// Field aliases accept the route oracle's `i`/`j` naming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteStep {
    pub pool_address: Address,
    #[serde(alias = "i")]
    pub input_index: u64,
    #[serde(alias = "j")]
    pub output_index: u64,
    pub swap_type: u64,
    pub output_coin_address: Address,
    pub swap_address: Address,
}

/// Best route and expected output returned by the route oracle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteQuote {
    pub route: Vec<RouteStep>,
    /// Expected output as a decimal string in the output token's units
    pub output: String,
}

/// Unsigned call handed to the signing collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxRequest {
    pub from: Address,
    pub to: Address,
    pub data: Bytes,
    pub value: U256,
    pub chain_id: ChainId,
}

impl TxRequest {
    /// Calldata as a 0x-prefixed hex string
    pub fn data_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.data))
    }
}

/// Final status of a transaction once it left the pending pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    Success,
    Reverted,
    /// The pool cannot tell (receipt not available)
    Unknown,
}

impl TxStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Reverted => "reverted",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Constants
pub mod constants {
    use super::ChainId;

    /// Chain id that lists the native asset in front of its tokens
    pub const MAINNET_CHAIN_ID: ChainId = 1;

    /// Decimals of the native asset
    pub const NATIVE_DECIMALS: u8 = 18;

    /// Slippage used when none (or a non-numeric value) is set, in percent
    pub const DEFAULT_SLIPPAGE: f64 = 0.5;

    /// Upper bound for slippage, in percent
    pub const MAX_SLIPPAGE: f64 = 99.0;
}
