//! Scripted collaborators for engine tests

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use swap_client::{ChainReader, MemoryPreferences, PendingPool, PreferenceStore, RouteOracle};
use swap_core::{
    Address, ChainId, ClientError, EngineConfig, RouteQuote, RouteStep, Token, TokenInfo, TxHash,
    TxStatus, U256,
};

use crate::engine::{Collaborators, SwapEngine};
use crate::signing::SigningRequests;

type Result<T> = std::result::Result<T, ClientError>;

pub const ACCOUNT: Address = Address::repeat_byte(0xac);

pub fn hash(n: u8) -> TxHash {
    TxHash::repeat_byte(n)
}

pub fn step(n: u8) -> RouteStep {
    RouteStep {
        pool_address: Address::repeat_byte(0x10 + n),
        input_index: 0,
        output_index: 1,
        swap_type: 1,
        output_coin_address: Address::repeat_byte(0x20 + n),
        swap_address: Address::ZERO,
    }
}

/// Let timers and spawned work run to completion
pub async fn settle() {
    tokio::time::sleep(Duration::from_secs(1)).await;
}

fn locked<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap()
}

// =============================================================================
// Route oracle
// =============================================================================

#[derive(Default)]
pub struct ScriptedOracle {
    quote: Mutex<Option<RouteQuote>>,
    delay: Mutex<Duration>,
    calls: Mutex<Vec<(Address, Address, String)>>,
}

impl ScriptedOracle {
    pub fn set_quote(&self, route: Vec<RouteStep>, output: &str) {
        *locked(&self.quote) = Some(RouteQuote {
            route,
            output: output.to_string(),
        });
    }

    pub fn set_no_route(&self) {
        *locked(&self.quote) = None;
    }

    pub fn set_delay(&self, delay: Duration) {
        *locked(&self.delay) = delay;
    }

    pub fn calls(&self) -> Vec<(Address, Address, String)> {
        locked(&self.calls).clone()
    }
}

#[async_trait]
impl RouteOracle for ScriptedOracle {
    async fn best_route_and_output(
        &self,
        token_in: Address,
        token_out: Address,
        amount_in: &str,
    ) -> Result<RouteQuote> {
        locked(&self.calls).push((token_in, token_out, amount_in.to_string()));
        let reply = locked(&self.quote).clone();
        let delay = *locked(&self.delay);

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        reply.ok_or(ClientError::NoRouteFound)
    }
}

// =============================================================================
// Chain reads
// =============================================================================

#[derive(Default)]
pub struct MockChain {
    allowance: Mutex<U256>,
    balance: Mutex<U256>,
    token_infos: Mutex<HashMap<Address, TokenInfo>>,
    allowance_delay: Mutex<Duration>,
    fail_allowance: AtomicBool,
    pub allowance_calls: AtomicUsize,
    pub forced_allowance_calls: AtomicUsize,
}

impl MockChain {
    pub fn set_allowance(&self, value: U256) {
        *locked(&self.allowance) = value;
    }

    pub fn set_balance(&self, value: U256) {
        *locked(&self.balance) = value;
    }

    pub fn add_token_info(&self, info: TokenInfo) {
        locked(&self.token_infos).insert(info.address, info);
    }

    pub fn set_allowance_delay(&self, delay: Duration) {
        *locked(&self.allowance_delay) = delay;
    }

    pub fn fail_allowance(&self, fail: bool) {
        self.fail_allowance.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ChainReader for MockChain {
    async fn balance(&self, _token: &Token) -> Result<U256> {
        Ok(*locked(&self.balance))
    }

    async fn allowance(
        &self,
        _token: Address,
        _owner: Address,
        _spender: Address,
        force: bool,
    ) -> Result<U256> {
        self.allowance_calls.fetch_add(1, Ordering::SeqCst);
        if force {
            self.forced_allowance_calls.fetch_add(1, Ordering::SeqCst);
        }
        let delay = *locked(&self.allowance_delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.fail_allowance.load(Ordering::SeqCst) {
            return Err(ClientError::Unreachable {
                service: "rpc".to_string(),
            });
        }
        Ok(*locked(&self.allowance))
    }

    async fn token_info(&self, _chain_id: ChainId, address: Address) -> Result<TokenInfo> {
        locked(&self.token_infos)
            .get(&address)
            .cloned()
            .ok_or_else(|| ClientError::ApiError {
                message: format!("{} is not an ERC20", address),
            })
    }
}

// =============================================================================
// Pending pool
// =============================================================================

#[derive(Default)]
pub struct MockPool {
    pending: Mutex<HashSet<TxHash>>,
    statuses: Mutex<HashMap<TxHash, TxStatus>>,
    fail: AtomicBool,
    pub list_calls: AtomicUsize,
}

impl MockPool {
    pub fn set_pending(&self, hashes: &[TxHash]) {
        *locked(&self.pending) = hashes.iter().copied().collect();
    }

    pub fn set_status(&self, hash: TxHash, status: TxStatus) {
        locked(&self.statuses).insert(hash, status);
    }

    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl PendingPool for MockPool {
    async fn list_pending(&self) -> Result<HashSet<TxHash>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(ClientError::Unreachable {
                service: "pending pool".to_string(),
            });
        }
        Ok(locked(&self.pending).clone())
    }

    async fn receipt_status(&self, hash: TxHash) -> Result<TxStatus> {
        Ok(locked(&self.statuses)
            .get(&hash)
            .copied()
            .unwrap_or(TxStatus::Unknown))
    }
}

// =============================================================================
// Harness
// =============================================================================

/// Allowance cache disabled so every check reaches the mock
pub fn test_config() -> EngineConfig {
    EngineConfig {
        allowance_cache_ttl_secs: 0,
        ..EngineConfig::default()
    }
}

pub struct Harness {
    pub engine: SwapEngine,
    pub signing: SigningRequests,
    pub oracle: Arc<ScriptedOracle>,
    pub chain: Arc<MockChain>,
    pub pool: Arc<MockPool>,
    pub prefs: Arc<MemoryPreferences>,
}

impl Harness {
    /// Initialised engine on mainnet selling ETH for USDC
    pub async fn new() -> Self {
        Self::with_prefs(MemoryPreferences::new()).await
    }

    pub async fn with_prefs(prefs: MemoryPreferences) -> Self {
        let oracle = Arc::new(ScriptedOracle::default());
        let chain = Arc::new(MockChain::default());
        let pool = Arc::new(MockPool::default());
        let prefs = Arc::new(prefs);

        let (engine, signing) = SwapEngine::new(
            test_config(),
            Collaborators {
                oracle: oracle.clone(),
                chain: chain.clone(),
                pool: pool.clone(),
                prefs: prefs.clone(),
            },
            ACCOUNT,
        )
        .unwrap();

        engine.init().await.unwrap();
        settle().await;

        Self {
            engine,
            signing,
            oracle,
            chain,
            pool,
            prefs,
        }
    }

    /// Registry entry by symbol
    pub fn token(&self, symbol: &str) -> Token {
        self.engine
            .snapshot()
            .tokens
            .into_iter()
            .find(|t| t.symbol == symbol)
            .unwrap()
    }

    pub async fn pref(&self, key: &str) -> Option<String> {
        self.prefs.get(key).await.unwrap()
    }
}
