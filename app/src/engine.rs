//! Swap engine handle
//!
//! [`SwapEngine`] is a cheap `Clone` handle around the engine state and its
//! collaborators. Every public operation takes the state lock for a short
//! critical section and never holds it across a collaborator call, so timer
//! callbacks and user calls interleave without tearing the session.
//!
//! Operations are split by concern:
//! - this module: lifecycle, network/account/token selection, slippage
//! - [`crate::exchange_rate`]: amount entry and quoting
//! - [`crate::approval`]: allowance checks and approvals
//! - [`crate::executor`]: router call construction and submission
//! - [`crate::tx_watcher`]: pending transaction tracking

use std::future::Future;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use swap_client::{
    timed_request, CachedChainReader, ChainReader, PendingPool, PreferenceStore, RouteOracle,
};
use swap_core::{
    Address, ChainId, EngineConfig, Error, NetworkConfig, Result, Token, TxHash, TxRequest,
};
use tokio::sync::{mpsc, watch, Mutex, MutexGuard};

use curve::{normalize_slippage, parse_slippage};

use crate::keys;
use crate::registry::TokenRegistry;
use crate::session::{QuoteKey, SwapSession, SwapSnapshot};
use crate::signing::{
    RequestKind, SigningOutcome, SigningRequest, SigningRequests, SIGNING_QUEUE_CAPACITY,
};
use crate::timer::DeferredTask;
use crate::tx_watcher::PendingTxs;

/// External services the engine drives
#[derive(Clone)]
pub struct Collaborators {
    pub oracle: Arc<dyn RouteOracle>,
    pub chain: Arc<dyn ChainReader>,
    pub pool: Arc<dyn PendingPool>,
    pub prefs: Arc<dyn PreferenceStore>,
}

pub(crate) struct EngineState {
    pub network: NetworkConfig,
    pub account: Address,
    pub registry: TokenRegistry,
    pub session: SwapSession,
    pub pending: PendingTxs,
    /// Bumped whenever the quote inputs change
    pub quote_generation: u64,
    /// Bumped by every allowance check; only the latest may apply its result
    pub approval_seq: u64,
}

impl EngineState {
    pub fn quote_key(&self) -> QuoteKey {
        QuoteKey {
            generation: self.quote_generation,
            chain_id: self.network.chain_id,
            from: self.session.swap_from.as_ref().and_then(|t| t.address),
            to: self.session.swap_to.as_ref().and_then(|t| t.address),
            amount: self.session.swap_from_amount.clone(),
        }
    }

    /// Forget the current quote; in-flight computations become stale
    pub fn invalidate_quote(&mut self) {
        self.quote_generation += 1;
        self.session.clear_quote();
    }

    /// Reset approval flags for a newly selected source token
    pub fn reset_approval(&mut self) {
        let erc20 = self
            .session
            .swap_from
            .as_ref()
            .map(|t| !t.is_native())
            .unwrap_or(false);
        self.session.checking_approval = erc20;
        if !erc20 {
            self.session.need_approval = false;
        }
    }

    pub fn snapshot(&self) -> SwapSnapshot {
        SwapSnapshot {
            chain_id: self.network.chain_id,
            account: self.account,
            tokens: self.registry.tokens().to_vec(),
            swap_from: self.session.swap_from.clone(),
            swap_to: self.session.swap_to.clone(),
            swap_from_amount: self.session.swap_from_amount.clone(),
            swap_to_amount: self.session.swap_to_amount.clone(),
            exchange_rate: self.session.exchange_rate,
            route: self.session.route.clone(),
            need_approval: self.session.need_approval,
            calculating: self.session.calculating,
            checking_approval: self.session.checking_approval,
            slippage: self.session.slippage,
            is_valid_from_amount: self.session.is_valid_from_amount(),
            is_valid_output_amount: self.session.is_valid_output_amount(),
            pending_txs: self.pending.hashes(),
            settled_txs: self.pending.settled(),
        }
    }
}

pub(crate) struct EngineInner {
    pub config: EngineConfig,
    pub oracle: Arc<dyn RouteOracle>,
    pub chain: Arc<dyn ChainReader>,
    pub pool: Arc<dyn PendingPool>,
    pub prefs: Arc<dyn PreferenceStore>,
    pub state: Mutex<EngineState>,
    pub rate_timer: DeferredTask,
    pub poll_timer: DeferredTask,
    snapshots: watch::Sender<SwapSnapshot>,
    signer: mpsc::Sender<SigningRequest>,
    stopped: AtomicBool,
}

/// Token swap engine
#[derive(Clone)]
pub struct SwapEngine {
    pub(crate) inner: Arc<EngineInner>,
}

impl SwapEngine {
    /// Create an engine for `account`.
    ///
    /// Returns the engine and the receiving end of its signing requests. The
    /// engine starts without a network; call [`SwapEngine::init`] or
    /// [`SwapEngine::switch_network`] before use.
    pub fn new(
        config: EngineConfig,
        collaborators: Collaborators,
        account: Address,
    ) -> Result<(Self, SigningRequests)> {
        config.validate()?;
        let network = config
            .network(config.default_chain_id)
            .cloned()
            .ok_or(Error::UnsupportedNetwork {
                chain_id: config.default_chain_id,
            })?;

        let chain: Arc<dyn ChainReader> = Arc::new(CachedChainReader::new(
            collaborators.chain,
            Duration::from_secs(config.allowance_cache_ttl_secs),
        ));

        let state = EngineState {
            network,
            account,
            registry: TokenRegistry::default(),
            session: SwapSession::new(normalize_slippage(config.default_slippage)),
            pending: PendingTxs::default(),
            quote_generation: 0,
            approval_seq: 0,
        };

        let (snapshots, _) = watch::channel(state.snapshot());
        let (signer, requests) = mpsc::channel(SIGNING_QUEUE_CAPACITY);

        let engine = Self {
            inner: Arc::new(EngineInner {
                config,
                oracle: collaborators.oracle,
                chain,
                pool: collaborators.pool,
                prefs: collaborators.prefs,
                state: Mutex::new(state),
                rate_timer: DeferredTask::new("exchange rate"),
                poll_timer: DeferredTask::new("pending tx poll"),
                snapshots,
                signer,
                stopped: AtomicBool::new(false),
            }),
        };

        Ok((engine, requests))
    }

    /// Restore the persisted network and account.
    ///
    /// Unknown or malformed persisted values fall back to the configured
    /// default network and the account given at construction.
    pub async fn init(&self) -> Result<()> {
        let config = &self.inner.config;

        let chain_id = self
            .load_pref(keys::SELECTED_NETWORK)
            .await
            .and_then(|raw| raw.trim().parse::<ChainId>().ok())
            .filter(|id| config.network(*id).is_some())
            .unwrap_or(config.default_chain_id);

        if let Some(account) = self
            .load_pref(keys::SELECTED_ACCOUNT)
            .await
            .and_then(|raw| Address::from_str(raw.trim()).ok())
        {
            self.lock().await.account = account;
        }

        self.switch_network(chain_id).await?;

        let account = self.lock().await.account;
        self.persist(keys::SELECTED_ACCOUNT, &account.to_string())
            .await;
        Ok(())
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// Activate a configured network: reload its tokens, restore its
    /// persisted pair and slippage and drop any quote.
    pub async fn switch_network(&self, chain_id: ChainId) -> Result<()> {
        let network = self
            .inner
            .config
            .network(chain_id)
            .cloned()
            .ok_or(Error::UnsupportedNetwork { chain_id })?;

        self.inner.rate_timer.cancel();

        let saved_tokens = self.load_pref(&keys::user_tokens(chain_id)).await;
        let saved_from = self.load_pref(&keys::swap_from(chain_id)).await;
        let saved_to = self.load_pref(&keys::swap_to(chain_id)).await;
        let saved_slippage = self.load_pref(&keys::slippage(chain_id)).await;

        let (from_id, to_id) = {
            let mut st = self.lock().await;
            let registry = TokenRegistry::load(&network, st.account, saved_tokens.as_deref());

            let from = saved_from
                .as_deref()
                .and_then(|id| registry.find_by_storage_id(id))
                .or_else(|| registry.get(0))
                .cloned();
            let to = saved_to
                .as_deref()
                .and_then(|id| registry.find_by_storage_id(id))
                .or_else(|| registry.get(1))
                .cloned();
            let to = match (&from, to) {
                (Some(from), Some(to)) if from.same_asset(&to) => {
                    registry.first_other(from).cloned()
                }
                (_, to) => to,
            };

            st.session.slippage = match saved_slippage {
                Some(raw) => parse_slippage(&raw),
                None => normalize_slippage(self.inner.config.default_slippage),
            };
            st.network = network;
            st.registry = registry;
            st.session.swap_from = from;
            st.session.swap_to = to;
            st.invalidate_quote();
            st.reset_approval();
            self.publish(&st);

            tracing::info!(
                "Switched to {} (chain {}) with {} tokens",
                st.network.name,
                chain_id,
                st.registry.len()
            );
            if st.registry.is_empty() {
                tracing::warn!("No tokens configured for chain {}", chain_id);
            }
            (storage_id(&st.session.swap_from), storage_id(&st.session.swap_to))
        };

        self.persist(keys::SELECTED_NETWORK, &chain_id.to_string())
            .await;
        if let Some(id) = from_id {
            self.persist(&keys::swap_from(chain_id), &id).await;
        }
        if let Some(id) = to_id {
            self.persist(&keys::swap_to(chain_id), &id).await;
        }

        self.after_pair_change(true).await;
        Ok(())
    }

    /// Rebind every token to `account`
    pub async fn switch_account(&self, account: Address) {
        {
            let mut guard = self.lock().await;
            let st = &mut *guard;
            if st.account == account {
                return;
            }

            self.inner.rate_timer.cancel();
            st.account = account;
            st.registry.set_owner(account);
            for token in [&mut st.session.swap_from, &mut st.session.swap_to]
                .into_iter()
                .flatten()
            {
                token.set_owner(account);
            }
            st.invalidate_quote();
            st.reset_approval();
            self.publish(st);
        }

        tracing::info!("Switched account to {}", account);
        self.persist(keys::SELECTED_ACCOUNT, &account.to_string())
            .await;
        self.after_pair_change(true).await;
    }

    /// Select the source token. Picking the current destination swaps the
    /// two sides.
    pub async fn switch_swap_from(&self, token: Token) {
        self.switch_side(token, Side::From).await;
    }

    /// Select the destination token. Picking the current source swaps the
    /// two sides.
    pub async fn switch_swap_to(&self, token: Token) {
        self.switch_side(token, Side::To).await;
    }

    async fn switch_side(&self, mut token: Token, side: Side) {
        let (chain_id, from_id, to_id, from_changed) = {
            let mut guard = self.lock().await;
            let st = &mut *guard;

            if token.chain_id != st.network.chain_id {
                tracing::warn!(
                    "Ignoring {} from chain {} while on chain {}",
                    token,
                    token.chain_id,
                    st.network.chain_id
                );
                return;
            }
            token.set_owner(st.account);

            let session = &mut st.session;
            let (this, other) = match side {
                Side::From => (&mut session.swap_from, &mut session.swap_to),
                Side::To => (&mut session.swap_to, &mut session.swap_from),
            };
            if this.as_ref().map_or(false, |t| t.same_asset(&token)) {
                return;
            }

            let swapped = other.as_ref().map_or(false, |t| t.same_asset(&token));
            if swapped {
                *other = this.take();
            }
            *this = Some(token);

            self.inner.rate_timer.cancel();
            st.invalidate_quote();
            let from_changed = side == Side::From || swapped;
            if from_changed {
                st.reset_approval();
            }
            self.publish(st);

            (
                st.network.chain_id,
                if from_changed {
                    storage_id(&st.session.swap_from)
                } else {
                    None
                },
                if side == Side::To || swapped {
                    storage_id(&st.session.swap_to)
                } else {
                    None
                },
                from_changed,
            )
        };

        if let Some(id) = from_id {
            self.persist(&keys::swap_from(chain_id), &id).await;
        }
        if let Some(id) = to_id {
            self.persist(&keys::swap_to(chain_id), &id).await;
        }

        self.after_pair_change(from_changed).await;
    }

    /// Follow-up work after the pair, account or network changed
    async fn after_pair_change(&self, from_changed: bool) {
        if from_changed {
            self.spawn_task(|engine| async move { engine.refresh_from_balance().await });
            self.spawn_task(|engine| async move { engine.check_approval(true).await });
        }
        self.reschedule_rate_calc().await;
    }

    /// Set slippage in percent; out-of-range values are clamped into
    /// `[0, 99]` and non-finite values fall back to the default.
    pub async fn set_slippage(&self, slippage: f64) {
        let slippage = normalize_slippage(slippage);
        let chain_id = {
            let mut st = self.lock().await;
            st.session.slippage = slippage;
            self.publish(&st);
            st.network.chain_id
        };
        self.persist(&keys::slippage(chain_id), &slippage.to_string())
            .await;
    }

    /// Set slippage from user input; non-numeric input becomes the default
    pub async fn set_slippage_input(&self, input: &str) {
        self.set_slippage(parse_slippage(input)).await;
    }

    // =========================================================================
    // Token selector
    // =========================================================================

    /// Tokens whose symbol contains `query` (case-insensitive)
    pub async fn search_tokens(&self, query: &str) -> Vec<Token> {
        self.lock().await.registry.filter(query)
    }

    /// Add an ERC20 by contract address to the active network's list.
    ///
    /// Returns `None` when its metadata cannot be read.
    pub async fn add_custom_token(&self, address: Address) -> Option<Token> {
        let chain_id = {
            let st = self.lock().await;
            if let Some(existing) = st.registry.find(Some(address)) {
                return Some(existing.clone());
            }
            st.network.chain_id
        };

        let info = match timed_request(
            "token metadata",
            self.inner.chain.token_info(chain_id, address),
        )
        .await
        {
            Ok(info) => info,
            Err(e) => {
                tracing::warn!("Cannot add token {}: {}", address, e);
                return None;
            }
        };

        let (token, list) = {
            let mut guard = self.lock().await;
            let st = &mut *guard;
            if st.network.chain_id != chain_id {
                tracing::debug!("Network changed while adding token {}", address);
                return None;
            }
            let token = st.registry.add_custom(&info, st.account);
            self.publish(st);
            (token, st.registry.custom_list_json())
        };

        match list {
            Ok(json) => self.persist(&keys::user_tokens(chain_id), &json).await,
            Err(e) => tracing::warn!("Cannot persist token list: {}", e),
        }

        tracing::info!("Added custom token {}", token);
        Some(token)
    }

    // =========================================================================
    // Observation and lifecycle
    // =========================================================================

    /// Receive a snapshot after every state change
    pub fn subscribe(&self) -> watch::Receiver<SwapSnapshot> {
        self.inner.snapshots.subscribe()
    }

    /// Latest published state
    pub fn snapshot(&self) -> SwapSnapshot {
        self.inner.snapshots.borrow().clone()
    }

    /// Cancel the debounce and poll timers; later timer work is skipped
    pub fn shutdown(&self) {
        self.inner.stopped.store(true, Ordering::SeqCst);
        self.inner.rate_timer.cancel();
        self.inner.poll_timer.cancel();
        tracing::debug!("Swap engine shut down");
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.stopped.load(Ordering::SeqCst)
    }

    // =========================================================================
    // Internal helpers
    // =========================================================================

    pub(crate) async fn lock(&self) -> MutexGuard<'_, EngineState> {
        self.inner.state.lock().await
    }

    pub(crate) fn publish(&self, state: &EngineState) {
        self.inner.snapshots.send_replace(state.snapshot());
    }

    pub(crate) fn downgrade(&self) -> Weak<EngineInner> {
        Arc::downgrade(&self.inner)
    }

    /// Engine behind a timer's weak reference, unless it was torn down
    pub(crate) fn upgrade(weak: &Weak<EngineInner>) -> Option<Self> {
        weak.upgrade()
            .map(|inner| Self { inner })
            .filter(|engine| !engine.is_shut_down())
    }

    /// Fire-and-forget work on a clone of the handle
    pub(crate) fn spawn_task<F, Fut>(&self, task: F)
    where
        F: FnOnce(SwapEngine) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        tokio::spawn(task(self.clone()));
    }

    async fn load_pref(&self, key: &str) -> Option<String> {
        match self.inner.prefs.get(key).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Failed to read preference {}: {}", key, e);
                None
            }
        }
    }

    pub(crate) async fn persist(&self, key: &str, value: &str) {
        if let Err(e) = self.inner.prefs.set(key, value).await {
            tracing::warn!("Failed to persist {}: {}", key, e);
        }
    }

    /// Hand a transaction to the signer and wait for its decision
    pub(crate) async fn request_signature(
        &self,
        kind: RequestKind,
        tx: TxRequest,
    ) -> Option<TxHash> {
        let (request, outcome) = SigningRequest::new(kind, tx, self.inner.config.app.clone());
        if self.inner.signer.send(request).await.is_err() {
            tracing::warn!("No signer is listening; transaction not submitted");
            return None;
        }

        match outcome.await {
            Ok(SigningOutcome::Approved(hash)) => Some(hash),
            Ok(SigningOutcome::Rejected) | Err(_) => {
                tracing::info!("Signing request rejected");
                None
            }
        }
    }

    /// Refresh the source token's balance on the session and the registry
    pub(crate) async fn refresh_from_balance(&self) {
        let token = match self.lock().await.session.swap_from.clone() {
            Some(token) => token,
            None => return,
        };

        let balance = match timed_request("balance source", self.inner.chain.balance(&token)).await
        {
            Ok(balance) => balance,
            Err(e) => {
                tracing::warn!("Balance query for {} failed: {}", token, e);
                return;
            }
        };

        let mut guard = self.lock().await;
        let st = &mut *guard;
        if let Some(from) = st
            .session
            .swap_from
            .as_mut()
            .filter(|t| t.same_asset(&token) && t.owner == token.owner)
        {
            from.balance = Some(balance);
        }
        st.registry.set_balance(&token, balance);
        self.publish(st);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    From,
    To,
}

fn storage_id(token: &Option<Token>) -> Option<String> {
    token.as_ref().map(Token::storage_id)
}
