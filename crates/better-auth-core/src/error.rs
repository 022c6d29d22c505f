// Internal (non-HTTP) error type shared by every adapter.

/// Error raised by better-auth internals and database adapters.
#[derive(Debug, thiserror::Error)]
pub enum BetterAuthError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("{0}")]
    Other(String),
}

impl BetterAuthError {
    /// Whether the error originated in a storage backend.
    pub fn is_database(&self) -> bool {
        matches!(self, Self::Database(_))
    }
}

/// Unified result type for better-auth operations.
pub type Result<T> = std::result::Result<T, BetterAuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = BetterAuthError::Database("connection refused".into());
        assert_eq!(err.to_string(), "Database error: connection refused");
        assert!(err.is_database());
        assert!(!BetterAuthError::Config("x".into()).is_database());
    }
}
