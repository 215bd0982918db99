//! Error types for the resolver cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the resolver cache.
///
/// Cache operations themselves never fail once they start; the only runtime
/// errors come from a caller context that was already done on entry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// The caller's context was cancelled before the operation started
    #[error("context canceled")]
    Canceled,

    /// The caller's context deadline had already passed
    #[error("context deadline exceeded")]
    DeadlineExceeded,

    /// Configuration rejected by validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

// == Result Type Alias ==
/// Convenience Result type for the resolver cache.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(CacheError::Canceled.to_string(), "context canceled");
        assert_eq!(
            CacheError::DeadlineExceeded.to_string(),
            "context deadline exceeded"
        );
        assert_eq!(
            CacheError::InvalidConfig("shard_count must be > 0".to_string()).to_string(),
            "Invalid configuration: shard_count must be > 0"
        );
    }
}
