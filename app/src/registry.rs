//! Token Registry
//!
//! Swappable tokens of the active network: the user's customised list (or the
//! network defaults), with the native asset in front on mainnet.

use std::str::FromStr;

use swap_core::constants::MAINNET_CHAIN_ID;
use swap_core::{Address, ChainId, NetworkConfig, Token, TokenInfo, U256};

#[derive(Debug, Clone, Default)]
pub struct TokenRegistry {
    chain_id: ChainId,
    tokens: Vec<Token>,
}

impl TokenRegistry {
    /// Build the token list for `network`.
    ///
    /// `saved` is the persisted customised list; a missing, empty or malformed
    /// list falls back to the network defaults.
    pub fn load(network: &NetworkConfig, owner: Address, saved: Option<&str>) -> Self {
        let custom = saved.and_then(|raw| match serde_json::from_str::<Vec<TokenInfo>>(raw) {
            Ok(list) => Some(list),
            Err(e) => {
                tracing::warn!(
                    "Ignoring malformed token list for chain {}: {}",
                    network.chain_id,
                    e
                );
                None
            }
        });

        let infos = match custom {
            Some(list) if !list.is_empty() => list,
            _ => network.default_tokens.clone(),
        };

        let mut tokens = Vec::with_capacity(infos.len() + 1);
        if network.chain_id == MAINNET_CHAIN_ID {
            tokens.push(Token::native(network.chain_id, &network.symbol, owner));
        }
        for info in &infos {
            if tokens.iter().any(|t| t.address == Some(info.address)) {
                continue;
            }
            tokens.push(Token::erc20(info, network.chain_id, owner));
        }

        tracing::debug!("Loaded {} tokens for chain {}", tokens.len(), network.chain_id);

        Self {
            chain_id: network.chain_id,
            tokens,
        }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index)
    }

    /// Rebind every token to `owner`. Balances are not refreshed.
    pub fn set_owner(&mut self, owner: Address) {
        for token in &mut self.tokens {
            token.set_owner(owner);
        }
    }

    /// Lookup by contract address (`None` is the native asset)
    pub fn find(&self, address: Option<Address>) -> Option<&Token> {
        self.tokens.iter().find(|t| t.address == address)
    }

    /// Lookup by persisted id: `""` is the native asset, anything else a
    /// contract address in any casing.
    pub fn find_by_storage_id(&self, id: &str) -> Option<&Token> {
        let id = id.trim();
        if id.is_empty() {
            return self.find(None);
        }
        Address::from_str(id).ok().and_then(|a| self.find(Some(a)))
    }

    /// First token that is not the same asset as `token`
    pub fn first_other(&self, token: &Token) -> Option<&Token> {
        self.tokens.iter().find(|t| !t.same_asset(token))
    }

    /// Case-insensitive symbol filter; an empty query matches everything
    pub fn filter(&self, query: &str) -> Vec<Token> {
        let query = query.trim().to_lowercase();
        self.tokens
            .iter()
            .filter(|t| query.is_empty() || t.symbol.to_lowercase().contains(&query))
            .cloned()
            .collect()
    }

    /// Append a token unless it is already listed; returns the listed entry
    pub fn add_custom(&mut self, info: &TokenInfo, owner: Address) -> Token {
        if let Some(existing) = self.find(Some(info.address)) {
            return existing.clone();
        }
        let token = Token::erc20(info, self.chain_id, owner);
        self.tokens.push(token.clone());
        token
    }

    /// Record a fresh balance on the matching entry
    pub fn set_balance(&mut self, token: &Token, balance: U256) {
        if let Some(entry) = self
            .tokens
            .iter_mut()
            .find(|t| t.same_asset(token) && t.owner == token.owner)
        {
            entry.balance = Some(balance);
        }
    }

    /// Non-native entries as the persisted JSON list
    pub fn custom_list_json(&self) -> swap_core::Result<String> {
        let infos: Vec<TokenInfo> = self.tokens.iter().filter_map(Token::info).collect();
        serde_json::to_string(&infos).map_err(|e| swap_core::Error::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swap_core::config::ethereum_mainnet;

    const OWNER: Address = Address::repeat_byte(0xaa);

    fn polygon() -> NetworkConfig {
        NetworkConfig {
            chain_id: 137,
            name: "Polygon".to_string(),
            symbol: "MATIC".to_string(),
            router: Address::repeat_byte(0x01),
            default_tokens: vec![
                TokenInfo::new(Address::repeat_byte(0x11), "USDC", 6),
                TokenInfo::new(Address::repeat_byte(0x12), "DAI", 18),
            ],
        }
    }

    #[test]
    fn test_mainnet_prepends_native() {
        let registry = TokenRegistry::load(&ethereum_mainnet(), OWNER, None);
        assert_eq!(registry.len(), 8);
        assert!(registry.get(0).unwrap().is_native());
        assert_eq!(registry.get(0).unwrap().symbol, "ETH");
        assert_eq!(registry.get(1).unwrap().symbol, "USDC");
        assert!(registry.tokens().iter().all(|t| t.owner == OWNER));
    }

    #[test]
    fn test_other_networks_have_no_native_entry() {
        let registry = TokenRegistry::load(&polygon(), OWNER, None);
        assert_eq!(registry.len(), 2);
        assert!(registry.tokens().iter().all(|t| !t.is_native()));
    }

    #[test]
    fn test_network_without_tokens_is_empty() {
        let mut network = polygon();
        network.default_tokens.clear();
        let registry = TokenRegistry::load(&network, OWNER, None);
        assert!(registry.is_empty());
        assert!(registry.get(0).is_none());
    }

    #[test]
    fn test_saved_list_replaces_defaults() {
        let saved = serde_json::to_string(&vec![TokenInfo::new(
            Address::repeat_byte(0x33),
            "FOO",
            9,
        )])
        .unwrap();
        let registry = TokenRegistry::load(&polygon(), OWNER, Some(&saved));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(0).unwrap().symbol, "FOO");
        assert_eq!(registry.get(0).unwrap().decimals, 9);
    }

    #[test]
    fn test_malformed_or_empty_saved_list_falls_back() {
        let registry = TokenRegistry::load(&polygon(), OWNER, Some("not json"));
        assert_eq!(registry.len(), 2);

        let registry = TokenRegistry::load(&polygon(), OWNER, Some("[]"));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_set_owner() {
        let mut registry = TokenRegistry::load(&polygon(), OWNER, None);
        let other = Address::repeat_byte(0xbb);
        registry.set_owner(other);
        assert!(registry.tokens().iter().all(|t| t.owner == other));
    }

    #[test]
    fn test_find_by_storage_id() {
        let registry = TokenRegistry::load(&ethereum_mainnet(), OWNER, None);
        assert!(registry.find_by_storage_id("").unwrap().is_native());
        let usdc = registry
            .find_by_storage_id("0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48")
            .unwrap();
        assert_eq!(usdc.symbol, "USDC");
        assert!(registry.find_by_storage_id("garbage").is_none());

        let polygon = TokenRegistry::load(&polygon(), OWNER, None);
        assert!(polygon.find_by_storage_id("").is_none());
    }

    #[test]
    fn test_filter_by_symbol() {
        let registry = TokenRegistry::load(&ethereum_mainnet(), OWNER, None);
        let hits: Vec<String> = registry.filter("us").into_iter().map(|t| t.symbol).collect();
        assert_eq!(hits, vec!["USDC", "USDT"]);
        assert_eq!(registry.filter("  ").len(), registry.len());
        assert_eq!(registry.filter("eth").len(), 3); // ETH, WETH, stETH
    }

    #[test]
    fn test_add_custom_and_persisted_list() {
        let mut registry = TokenRegistry::load(&ethereum_mainnet(), OWNER, None);
        let info = TokenInfo::new(Address::repeat_byte(0x44), "NEW", 12);

        let token = registry.add_custom(&info, OWNER);
        assert_eq!(token.chain_id, 1);
        assert_eq!(registry.len(), 9);

        // no duplicates
        registry.add_custom(&info, OWNER);
        assert_eq!(registry.len(), 9);

        let json = registry.custom_list_json().unwrap();
        let saved: Vec<TokenInfo> = serde_json::from_str(&json).unwrap();
        assert_eq!(saved.len(), 8);
        assert_eq!(saved.last().unwrap(), &info);

        let reloaded = TokenRegistry::load(&ethereum_mainnet(), OWNER, Some(&json));
        assert_eq!(reloaded.len(), 9);
        assert!(reloaded.get(0).unwrap().is_native());
    }

    #[test]
    fn test_set_balance() {
        let mut registry = TokenRegistry::load(&polygon(), OWNER, None);
        let usdc = registry.get(0).unwrap().clone();
        registry.set_balance(&usdc, U256::from(7u64));
        assert_eq!(registry.get(0).unwrap().balance, Some(U256::from(7u64)));

        let mut stale = usdc.clone();
        stale.owner = Address::repeat_byte(0xcc);
        registry.set_balance(&stale, U256::from(9u64));
        assert_eq!(registry.get(0).unwrap().balance, Some(U256::from(7u64)));
    }
}
