//! Core error type shared across the workspace.

/// Errors produced by domain rules and stored-data conversions.
///
/// Business outcomes with a wire code of their own are not errors at this
/// level; they are expressed with [`crate::codes::ErrorCode`] by the API
/// layer.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Input failed a domain validation rule.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Stored data violated an invariant the database is supposed to
    /// uphold, e.g. a status column holding an unknown value.
    #[error("internal error: {0}")]
    Internal(String),
}
