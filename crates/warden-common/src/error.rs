//! Centralized error types for Warden.
//!
//! One enum covers both the caller-contract failures of the permission math and the
//! remote failure classes the fetch layer distinguishes when deciding whether to retry.

use std::time::Duration;

use uuid::Uuid;

/// Core error type used across all Warden crates.
#[derive(Debug, thiserror::Error)]
pub enum WardenError {
    // === Caller contract errors ===
    #[error("Validation failed: {message}")]
    Validation { message: String },

    #[error("Role mapping for guild {guild_id} has no everyone role")]
    MissingEveryoneRole { guild_id: Uuid },

    // === Retryable remote errors ===
    #[error("Rate limited. Retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    #[error("Remote server error {status}: {message}")]
    TransientServer { status: u16, message: String },

    // === Fatal remote errors ===
    #[error("{resource} not found")]
    NotFound { resource: String },

    #[error("Remote error {status}: {message}")]
    Remote { status: u16, message: String },

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl WardenError {
    /// Error code string for programmatic handling by callers.
    pub fn error_code(&self) -> &str {
        match self {
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::MissingEveryoneRole { .. } => "MISSING_EVERYONE_ROLE",
            Self::RateLimited { .. } => "RATE_LIMITED",
            Self::TransientServer { .. } => "TRANSIENT_SERVER_ERROR",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Remote { .. } => "REMOTE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether the retry driver may absorb this error and try again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::TransientServer { .. })
    }

    /// Server-suggested wait before the next attempt, for rate limits.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after_ms } => Some(Duration::from_millis(*retry_after_ms)),
            _ => None,
        }
    }
}

/// Convenience type alias for Results using WardenError.
pub type WardenResult<T> = Result<T, WardenError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classes() {
        assert!(WardenError::RateLimited { retry_after_ms: 10 }.is_retryable());
        assert!(WardenError::TransientServer { status: 503, message: "unavailable".into() }.is_retryable());
        assert!(!WardenError::Remote { status: 403, message: "forbidden".into() }.is_retryable());
        assert!(!WardenError::Validation { message: "x".into() }.is_retryable());
    }

    #[test]
    fn test_retry_after_only_for_rate_limits() {
        let err = WardenError::RateLimited { retry_after_ms: 3_000 };
        assert_eq!(err.retry_after(), Some(Duration::from_secs(3)));
        let transient = WardenError::TransientServer { status: 500, message: "boom".into() };
        assert_eq!(transient.retry_after(), None);
    }
}
