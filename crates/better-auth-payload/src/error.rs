// Errors raised while translating requests or talking to Payload.
//
// None of these cross the `Adapter` boundary directly: the facade logs them and
// applies its `ErrorPolicy`, converting to `BetterAuthError::Database` when
// errors are propagated.

use better_auth_core::db::adapter::Operator;
use better_auth_core::error::BetterAuthError;

/// Result type for Payload API and translation calls.
pub type PayloadResult<T> = std::result::Result<T, PayloadError>;

#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    /// The model has no mapped collection, or the collection is not registered.
    #[error(
        "Collection {model} does not exist. Please check your payload collection slugs match the better auth schema"
    )]
    CollectionNotFound { model: String },

    /// The operator cannot be expressed against the given value.
    #[error("Unsupported operator `{operator}` on field `{field}`: {reason}")]
    UnsupportedOperator {
        field: String,
        operator: Operator,
        reason: String,
    },

    #[error("Payload request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid Payload URL: {0}")]
    Url(#[from] url::ParseError),

    /// Payload answered with a non-success status.
    #[error("Payload API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Unexpected Payload response: {0}")]
    InvalidResponse(String),

    #[error("Document {id} not found in collection {collection}")]
    NotFound { collection: String, id: String },
}

impl PayloadError {
    pub fn collection_not_found(model: &str) -> Self {
        Self::CollectionNotFound {
            model: model.to_string(),
        }
    }

    pub fn unsupported(field: &str, operator: Operator, reason: impl Into<String>) -> Self {
        Self::UnsupportedOperator {
            field: field.to_string(),
            operator,
            reason: reason.into(),
        }
    }
}

impl From<PayloadError> for BetterAuthError {
    fn from(err: PayloadError) -> Self {
        BetterAuthError::Database(err.to_string())
    }
}
