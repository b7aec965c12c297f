//! Error taxonomy shared across the bot.
//!
//! Handlers match on these variants to decide between "reply and continue"
//! and "skip silently"; the raw cause goes to the logs, never to the user.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HikariError {
    /// Non-2xx status, transport failure, or a payload the decoder could not
    /// make sense of.
    #[error("upstream error: {0}")]
    Upstream(String),

    /// A required field was missing from the caller's side.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Caller is not on the allow-list.
    #[error("access denied for user {0}")]
    AccessDenied(u64),

    /// Callback index no longer matches the cached list for that chat.
    #[error("stale selection: index {index} out of {len} cached entries")]
    StaleSelection { index: usize, len: usize },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for HikariError {
    fn from(err: reqwest::Error) -> Self {
        Self::Upstream(err.to_string())
    }
}

impl From<serde_json::Error> for HikariError {
    fn from(err: serde_json::Error) -> Self {
        Self::Upstream(format!("malformed payload: {err}"))
    }
}
