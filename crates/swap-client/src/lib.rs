//! swap-client: Interfaces to the engine's external collaborators
//!
//! The engine never talks to a chain, a quoting service or a storage backend
//! directly. Each of those is an async trait here, together with the
//! in-process implementations the engine ships with:
//! - [`CachedChainReader`]: allowance cache in front of any [`ChainReader`]
//! - [`MemoryPreferences`] / [`JsonFilePreferences`]: preference stores

pub mod chain;
pub mod oracle;
pub mod pool;
pub mod prefs;

use std::time::Duration;

use swap_core::ClientError;

pub use chain::{CachedChainReader, ChainReader};
pub use oracle::RouteOracle;
pub use pool::PendingPool;
pub use prefs::{JsonFilePreferences, MemoryPreferences, PreferenceStore};

/// Result type for collaborator calls
pub type Result<T> = std::result::Result<T, ClientError>;

/// Upper bound for a single collaborator call.
/// A hung quote or RPC read must not keep `calculating` set forever.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Run a collaborator call with [`REQUEST_TIMEOUT`]; a timeout is reported as
/// the service being unreachable.
pub async fn timed_request<T>(
    service: &str,
    fut: impl std::future::Future<Output = Result<T>>,
) -> Result<T> {
    tokio::time::timeout(REQUEST_TIMEOUT, fut)
        .await
        .map_err(|_| ClientError::Unreachable {
            service: format!("{} (timed out after {}s)", service, REQUEST_TIMEOUT.as_secs()),
        })?
}
