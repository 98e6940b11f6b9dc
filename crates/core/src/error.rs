//! Error types for the vimai domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all vimai operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Role resolution ---
    #[error("Role `{0}` not found")]
    RoleNotFound(String),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Include errors ---
    #[error("Include error: {0}")]
    Include(#[from] IncludeError),

    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum IncludeError {
    #[error("cannot read {path}: {reason}")]
    Unreadable { path: String, reason: String },

    #[error("invalid include pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("Operation not supported by provider '{provider}': {operation}")]
    Unsupported { provider: String, operation: String },

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),
}
