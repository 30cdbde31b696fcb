use serde_json::Value;
use thiserror::Error;

/// Adapter errors
///
/// Every backend operation reports failure through this type. Nothing in the
/// adapter layer panics on remote input.
#[derive(Debug, Error)]
pub enum Error {
    /// The node could not be reached (DNS, TLS, connect, timeout, body read)
    #[error("connectivity error: {0}")]
    Connectivity(#[source] Box<dyn std::error::Error + Send + Sync>),
    /// The node answered with an error payload, passed through unmodified
    #[error("remote error: {0}")]
    Remote(Value),
    /// The node answered with something that is not usable JSON
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    /// The application request cannot be expressed in the node's terms
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    /// The configured endpoint does not form a valid URL
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

impl Error {
    /// Wrap a transport-level failure
    pub fn connectivity<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Connectivity(Box::new(err))
    }

    /// Whether this is a transport-level failure, as opposed to a semantic one
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Error::Connectivity(_))
    }
}

/// Adapter result
pub type Result<T> = std::result::Result<T, Error>;
