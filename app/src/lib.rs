//! Swap engine library
//!
//! Drives a token swap through the Curve multi-pool router: token selection,
//! debounced quoting, allowance checks, router call construction and pending
//! transaction tracking. Hosts supply the route oracle, chain reads, pending
//! pool and preference store, and answer signing requests.

pub mod approval;
pub mod engine;
pub mod exchange_rate;
pub mod executor;
pub mod keys;
pub mod registry;
pub mod session;
pub mod signing;
pub mod timer;
pub mod tx_watcher;

#[cfg(test)]
pub(crate) mod testing;

use std::path::Path;

use anyhow::Context;
use swap_core::EngineConfig;

pub use engine::{Collaborators, SwapEngine};
pub use registry::TokenRegistry;
pub use session::{SwapSession, SwapSnapshot};
pub use signing::{RequestKind, SigningOutcome, SigningRequest, SigningRequests};
pub use timer::DeferredTask;
pub use tx_watcher::SettledTx;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` is honoured; engine logs default to debug. Calling this twice
/// is harmless.
pub fn init_logging() {
    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    for directive in ["swap_engine=debug", "info"] {
        match directive.parse() {
            Ok(d) => filter = filter.add_directive(d),
            Err(e) => eprintln!("Ignoring log directive {}: {}", directive, e),
        }
    }

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Load the engine configuration.
///
/// No path, or a path that does not exist, yields the built-in defaults.
pub async fn load_config(path: Option<&Path>) -> anyhow::Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };

    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        tracing::info!("No config at {}, using defaults", path.display());
        return Ok(EngineConfig::default());
    }

    let json = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading config {}", path.display()))?;
    let config = EngineConfig::from_json(&json)
        .with_context(|| format!("parsing config {}", path.display()))?;

    tracing::info!(
        "Loaded config from {} ({} network(s))",
        path.display(),
        config.networks.len()
    );
    Ok(config)
}
