//! Error types for model selection and invocation.

use thiserror::Error;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during model operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Model name or alias is not configured in the catalog.
    #[error("unknown model: {0}")]
    UnknownModel(String),

    /// The catalog has no models to choose from.
    #[error("model catalog is empty")]
    EmptyCatalog,

    /// Credentials not found for provider.
    #[error("credentials not found for provider: {0}")]
    CredentialsNotFound(String),

    /// Invalid API key format.
    #[error("invalid API key format")]
    InvalidApiKey,

    /// Provider rejected the request because of rate limits or spend quota.
    #[error("provider quota exceeded: {0}")]
    Quota(String),

    /// The provider did not answer in time.
    #[error("provider request timed out: {0}")]
    Timeout(String),

    /// Provider API error.
    #[error("provider API error: {0}")]
    ProviderApi(String),

    /// Request failed before a response was received.
    #[error("request failed: {0}")]
    Request(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether retrying the same request later could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Quota(_) | Error::Timeout(_) | Error::Request(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formats_correctly() {
        let err = Error::UnknownModel("gpt-5".to_string());
        assert_eq!(err.to_string(), "unknown model: gpt-5");
    }

    #[test]
    fn error_from_serde_json() {
        let json_err: serde_json::Error = serde_json::from_str::<String>("invalid").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[test]
    fn quota_and_timeout_are_transient() {
        assert!(Error::Quota("429".into()).is_transient());
        assert!(Error::Timeout("30s".into()).is_transient());
        assert!(!Error::UnknownModel("x".into()).is_transient());
        assert!(!Error::InvalidApiKey.is_transient());
    }
}
