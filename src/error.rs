// ============================================================================
// File: src/error.rs
// Client error taxonomy
// ============================================================================

use thiserror::Error;

/// Result type for answer-service operations.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Failures surfaced by the query/follow-up client.
///
/// None of these are retried automatically; the user re-submits.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Backend unreachable or misconfigured
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Backend answered with a non-2xx status
    #[error("Upstream error (HTTP {status}): {message}")]
    Upstream { status: u16, message: String },

    /// Backend answered 2xx but the body encodes an error
    #[error("{0}")]
    Response(String),

    /// Follow-up attempted before any search or chat turn
    #[error("No active search session. Please perform a search first.")]
    NoActiveSession,

    /// Empty query or message, rejected before any request is built
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl ClientError {
    pub fn is_no_active_session(&self) -> bool {
        matches!(self, ClientError::NoActiveSession)
    }
}
