//! Signing request channel
//!
//! Every state-changing call leaves the engine as a [`SigningRequest`] on an
//! mpsc channel. The receiver (wallet glue) resolves each request exactly once
//! by consuming it with [`SigningRequest::approve`] or
//! [`SigningRequest::reject`]. Dropping a request counts as a rejection.

use serde::Serialize;
use swap_core::{Address, AppInfo, ChainId, Token, TxHash, TxRequest, U256};
use tokio::sync::{mpsc, oneshot};

use curve::SwapTxSummary;

/// Receiving end handed out by `SwapEngine::new`
pub type SigningRequests = mpsc::Receiver<SigningRequest>;

/// Requests that can wait for a signer before the engine blocks
pub(crate) const SIGNING_QUEUE_CAPACITY: usize = 16;

/// What the transaction does, for display
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RequestKind {
    /// ERC20 allowance for the router
    Approve { token: Token, amount: U256 },
    /// Router swap
    Swap {
        from: Token,
        to: Token,
        summary: SwapTxSummary,
    },
}

/// Result of a signing request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningOutcome {
    /// Signed and broadcast
    Approved(TxHash),
    /// Declined by the user (or the broadcast failed)
    Rejected,
}

/// A transaction waiting for the user's decision
#[derive(Debug)]
pub struct SigningRequest {
    pub kind: RequestKind,
    pub tx: TxRequest,
    pub chain_id: ChainId,
    pub account: Address,
    pub app: AppInfo,
    responder: oneshot::Sender<SigningOutcome>,
}

impl SigningRequest {
    pub(crate) fn new(
        kind: RequestKind,
        tx: TxRequest,
        app: AppInfo,
    ) -> (Self, oneshot::Receiver<SigningOutcome>) {
        let (responder, outcome) = oneshot::channel();
        let request = Self {
            kind,
            chain_id: tx.chain_id,
            account: tx.from,
            tx,
            app,
            responder,
        };
        (request, outcome)
    }

    /// Report the hash of the broadcast transaction
    pub fn approve(self, hash: TxHash) {
        self.resolve(SigningOutcome::Approved(hash));
    }

    pub fn reject(self) {
        self.resolve(SigningOutcome::Rejected);
    }

    fn resolve(self, outcome: SigningOutcome) {
        if self.responder.send(outcome).is_err() {
            tracing::debug!("Signing request resolved after the engine stopped waiting");
        }
    }
}
