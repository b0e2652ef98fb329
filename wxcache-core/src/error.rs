use thiserror::Error as ThisError;

/// Errors produced by the wxcache core.
///
/// Only `Provider` and `ProviderUnreachable` terminate a lookup; store
/// failures are absorbed by the cache pipeline (lookup degrades to a miss,
/// insert failures are logged and dropped).
#[derive(Debug, ThisError)]
pub enum Error {
    /// The provider answered but reported a non-success code
    /// (e.g. "city not found"). Carries the provider's own message.
    #[error("weather provider error: {message}")]
    Provider { message: String },

    /// The provider could not be reached, or the request timed out.
    #[error("weather provider unreachable: {0}")]
    ProviderUnreachable(#[source] reqwest::Error),

    /// A store lookup or insert failed.
    #[error("observation store unavailable: {message}")]
    Store { message: String },

    /// Anything else.
    #[error("unexpected failure: {0}")]
    Unexpected(#[from] anyhow::Error),
}

impl Error {
    pub fn provider(message: impl Into<String>) -> Self {
        Error::Provider { message: message.into() }
    }

    pub fn store(message: impl Into<String>) -> Self {
        Error::Store { message: message.into() }
    }
}
