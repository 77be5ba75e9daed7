//! Error types for the laxbot domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant; the HTTP boundary maps
//! the taxonomy onto status codes (validation 400, auth 401/403, not-found
//! 404, conflict 409, upstream 500).

use thiserror::Error;

/// The top-level error type for all laxbot operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or missing request fields. Reported as 400 with detail.
    #[error("Validation error: {message}")]
    Validation { message: String },

    // --- Authorization errors ---
    #[error("Authorization error: {0}")]
    Auth(#[from] AuthError),

    /// A delete against an empty prefix, or a point read that must hit.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Duplicate registration and the like. Out of the core's write paths,
    /// kept so the boundary can map 409 uniformly.
    #[error("Conflict: {0}")]
    Conflict(String),

    // --- Store errors ---
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Shorthand for a validation failure.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Authorization failures. The boundary distinguishes 401 (credential
/// problems) from 403 (scope problems) but leaks no further detail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Missing credentials")]
    MissingCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    Expired,

    #[error("Forbidden")]
    Forbidden,
}

impl AuthError {
    /// Whether this failure is a credential problem (401) rather than a
    /// scope problem (403).
    pub fn is_unauthenticated(&self) -> bool {
        !matches!(self, AuthError::Forbidden)
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Batch of {requested} items exceeds the per-request limit of {limit}")]
    BatchTooLarge { requested: usize, limit: usize },

    #[error("Migration failed: {0}")]
    MigrationFailed(String),
}

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),

    #[error("Tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },
}
