// Adapter and REST client configuration.

use better_auth_core::error::BetterAuthError;

use crate::id::IdType;

/// What the adapter does when a storage call fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Log the failure and return the operation's empty value
    /// (`None`, `[]`, `0`). Keeps the auth flow running.
    #[default]
    Swallow,
    /// Log the failure and return `BetterAuthError::Database`.
    Propagate,
}

/// Configuration for the Payload adapter.
#[derive(Debug, Clone)]
pub struct PayloadAdapterConfig {
    /// Enable debug logs for every adapter call.
    ///
    /// Default: false
    pub enable_debug_logs: bool,

    /// Pluralize collection slugs (`user` → `users`) for models that are not
    /// explicitly renamed in the schema.
    ///
    /// Default: false
    pub use_plural: bool,

    /// Id representation of the Payload collections.
    ///
    /// Default: `IdType::Text`
    pub id_type: IdType,

    /// Keep caller-supplied ids on create instead of letting Payload assign them.
    ///
    /// Default: false
    pub preserve_ids: bool,

    /// Failure handling at the adapter boundary.
    ///
    /// Default: `ErrorPolicy::Swallow`
    pub error_policy: ErrorPolicy,

    /// Point lookups in flight at once when `find_many` resolves to a list of ids.
    /// Results keep the order of the requested ids.
    ///
    /// Default: 1 (sequential)
    pub max_concurrent_lookups: usize,
}

impl Default for PayloadAdapterConfig {
    fn default() -> Self {
        Self {
            enable_debug_logs: false,
            use_plural: false,
            id_type: IdType::Text,
            preserve_ids: false,
            error_policy: ErrorPolicy::Swallow,
            max_concurrent_lookups: 1,
        }
    }
}

/// Connection settings for Payload's REST API.
#[derive(Debug, Clone)]
pub struct PayloadRestConfig {
    /// Server origin, e.g. `http://localhost:3000`.
    pub base_url: String,

    /// Route prefix of the REST API.
    ///
    /// Default: `/api`
    pub api_route: String,

    /// API key of an auth-enabled collection user.
    pub api_key: Option<String>,

    /// Slug of the auth-enabled collection the API key belongs to.
    ///
    /// Default: `users`
    pub auth_collection: String,

    /// Collection slugs registered in the Payload config.
    pub collections: Vec<String>,
}

impl Default for PayloadRestConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            api_route: "/api".to_string(),
            api_key: None,
            auth_collection: "users".to_string(),
            collections: Vec::new(),
        }
    }
}

impl PayloadRestConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_collections<I, S>(mut self, collections: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.collections = collections.into_iter().map(Into::into).collect();
        self
    }

    /// Read `PAYLOAD_URL` (required), `PAYLOAD_API_KEY`, `PAYLOAD_API_ROUTE`,
    /// `PAYLOAD_AUTH_COLLECTION` and `PAYLOAD_COLLECTIONS` (comma separated).
    pub fn from_env() -> Result<Self, BetterAuthError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, BetterAuthError> {
        let base_url = lookup("PAYLOAD_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| BetterAuthError::Config("PAYLOAD_URL is not set".to_string()))?;

        let defaults = Self::default();
        Ok(Self {
            base_url,
            api_route: lookup("PAYLOAD_API_ROUTE").unwrap_or(defaults.api_route),
            api_key: lookup("PAYLOAD_API_KEY").filter(|v| !v.is_empty()),
            auth_collection: lookup("PAYLOAD_AUTH_COLLECTION").unwrap_or(defaults.auth_collection),
            collections: lookup("PAYLOAD_COLLECTIONS")
                .map(|list| {
                    list.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = PayloadAdapterConfig::default();
        assert!(!config.enable_debug_logs);
        assert!(!config.use_plural);
        assert!(!config.preserve_ids);
        assert_eq!(config.id_type, IdType::Text);
        assert_eq!(config.error_policy, ErrorPolicy::Swallow);
        assert_eq!(config.max_concurrent_lookups, 1);
    }

    #[test]
    fn test_rest_config_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("PAYLOAD_URL", "https://cms.example.com"),
            ("PAYLOAD_API_KEY", "secret"),
            ("PAYLOAD_COLLECTIONS", "users, sessions,,accounts"),
        ]
        .into_iter()
        .collect();
        let config =
            PayloadRestConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.base_url, "https://cms.example.com");
        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert_eq!(config.api_route, "/api");
        assert_eq!(config.auth_collection, "users");
        assert_eq!(config.collections, vec!["users", "sessions", "accounts"]);
    }

    #[test]
    fn test_rest_config_requires_url() {
        let err = PayloadRestConfig::from_lookup(|_| None).unwrap_err();
        assert!(matches!(err, BetterAuthError::Config(_)));
    }
}
