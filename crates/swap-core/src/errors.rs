//! Error types for the swap engine

use thiserror::Error;

use crate::ChainId;

/// Core errors that can occur in the swap engine
#[derive(Debug, Error)]
pub enum Error {
    #[error("Client error: {0}")]
    Client(#[from] ClientError),

    #[error("Build error: {0}")]
    Build(#[from] BuildError),

    #[error("Network {chain_id} is not supported")]
    UnsupportedNetwork { chain_id: ChainId },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Failures of the external collaborators (route oracle, chain reads,
/// pending pool, preference storage)
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("No route found")]
    NoRouteFound,

    #[error("{service} unreachable")]
    Unreachable { service: String },

    #[error("Service returned error: {message}")]
    ApiError { message: String },

    #[error("Storage error: {0}")]
    Storage(String),
}

/// Transaction building errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("No route computed for the current pair")]
    NoRoute,

    #[error("Route has {hops} hops, the router supports at most 4")]
    TooManyHops { hops: usize },

    #[error("Invalid amount: {message}")]
    InvalidAmount { message: String },
}

/// Result type alias for swap engine operations
pub type Result<T> = std::result::Result<T, Error>;

impl ClientError {
    /// Stable code for glue layers
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NoRouteFound => "no_route_found",
            Self::Unreachable { .. } => "unreachable",
            Self::ApiError { .. } => "api_error",
            Self::Storage(_) => "storage_error",
        }
    }
}

impl BuildError {
    /// Stable code for glue layers
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NoRoute => "no_route",
            Self::TooManyHops { .. } => "too_many_hops",
            Self::InvalidAmount { .. } => "invalid_amount",
        }
    }
}
