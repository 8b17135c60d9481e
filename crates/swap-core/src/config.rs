//! Configuration types for the swap engine

use alloy_primitives::address;
use serde::{Deserialize, Serialize};

use crate::{constants, ChainId, NetworkConfig, TokenInfo};

/// dApp descriptor attached to every signing request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppInfo {
    pub name: String,
    pub icon: String,
    #[serde(default)]
    pub verified: bool,
}

impl Default for AppInfo {
    fn default() -> Self {
        Self {
            name: "Wallet 3 Swap".to_string(),
            icon: "https://wallet3.io/favicon.ico".to_string(),
            verified: true,
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Networks the router is deployed on
    #[serde(default = "default_networks")]
    pub networks: Vec<NetworkConfig>,

    /// Network used when no selection has been persisted
    #[serde(default = "default_chain_id")]
    pub default_chain_id: ChainId,

    /// Amount-entry debounce (milliseconds)
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Pending transaction poll interval (milliseconds)
    #[serde(default = "default_pending_poll_ms")]
    pub pending_poll_ms: u64,

    /// Slippage (percent) used when none has been persisted
    #[serde(default = "default_slippage")]
    pub default_slippage: f64,

    /// Allowance cache lifetime; `force` reads bypass it
    #[serde(default = "default_allowance_cache_ttl_secs")]
    pub allowance_cache_ttl_secs: u64,

    #[serde(default)]
    pub app: AppInfo,
}

fn default_networks() -> Vec<NetworkConfig> {
    vec![ethereum_mainnet()]
}

fn default_chain_id() -> ChainId {
    constants::MAINNET_CHAIN_ID
}

fn default_debounce_ms() -> u64 {
    500
}

fn default_pending_poll_ms() -> u64 {
    1000
}

fn default_slippage() -> f64 {
    constants::DEFAULT_SLIPPAGE
}

fn default_allowance_cache_ttl_secs() -> u64 {
    15
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            networks: default_networks(),
            default_chain_id: default_chain_id(),
            debounce_ms: default_debounce_ms(),
            pending_poll_ms: default_pending_poll_ms(),
            default_slippage: default_slippage(),
            allowance_cache_ttl_secs: default_allowance_cache_ttl_secs(),
            app: AppInfo::default(),
        }
    }
}

impl EngineConfig {
    /// Look up a configured network
    pub fn network(&self, chain_id: ChainId) -> Option<&NetworkConfig> {
        self.networks.iter().find(|n| n.chain_id == chain_id)
    }

    /// Parse a JSON configuration document
    pub fn from_json(json: &str) -> crate::Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| crate::Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> crate::Result<()> {
        if self.networks.is_empty() {
            return Err(crate::Error::Config("no networks configured".to_string()));
        }
        if self.network(self.default_chain_id).is_none() {
            return Err(crate::Error::Config(format!(
                "default chain {} is not among the configured networks",
                self.default_chain_id
            )));
        }
        Ok(())
    }
}

/// Ethereum mainnet with the Curve `exchange_multiple` router
pub fn ethereum_mainnet() -> NetworkConfig {
    NetworkConfig {
        chain_id: constants::MAINNET_CHAIN_ID,
        name: "Ethereum".to_string(),
        symbol: "ETH".to_string(),
        router: address!("fA9a30350048B2BF66865ee20363067c66f67e58"),
        default_tokens: vec![
            TokenInfo::new(address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"), "USDC", 6),
            TokenInfo::new(address!("dAC17F958D2ee523a2206206994597C13D831ec7"), "USDT", 6),
            TokenInfo::new(address!("6B175474E89094C44Da98b954EedeAC495271d0F"), "DAI", 18),
            TokenInfo::new(address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"), "WETH", 18),
            TokenInfo::new(address!("2260FAC5E5542a773Aa44fBCfeDf7C193bc2C599"), "WBTC", 8),
            TokenInfo::new(address!("D533a949740bb3306d119CC777fa900bA034cd52"), "CRV", 18),
            TokenInfo::new(address!("ae7ab96520DE3A18E5e111B5EaAb095312D7fE84"), "stETH", 18),
        ],
    }
}
