//! Credential lookup for API keys.
//!
//! Keys come from the provider's environment variable first and then from a
//! `.env` file, if one is configured. Either way the key is held as a
//! [`SecretString`] and never printed.
//!
//! # Example
//!
//! ```ignore
//! use thor_models::auth::CredentialStore;
//!
//! let store = CredentialStore::new().with_env_file(".env");
//! let key = store.get("anthropic")?;
//! ```

use std::env;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::{Error, Result};

/// Provider API key.
///
/// `Debug` prints a placeholder; the raw value is only reachable through
/// [`ApiKey::expose_secret`], which the provider calls when building the
/// request headers.
#[derive(Clone)]
pub struct ApiKey(SecretString);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(SecretString::from(key.into()))
    }

    pub fn expose_secret(&self) -> &str {
        self.0.expose_secret()
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

impl From<&str> for ApiKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

const ENV_VARS: &[(&str, &str)] = &[("anthropic", "ANTHROPIC_API_KEY")];

fn env_var_for_provider(provider: &str) -> Option<&'static str> {
    ENV_VARS
        .iter()
        .find(|(p, _)| *p == provider)
        .map(|(_, v)| *v)
}

/// Where a credential was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// Process environment.
    Environment,
    /// A dotenv file.
    EnvFile,
}

/// Read-only credential lookup over the environment and an optional `.env` file.
#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    env_file: Option<PathBuf>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also search this dotenv file when the variable is not set.
    pub fn with_env_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.env_file = Some(path.into());
        self
    }

    /// Key for `provider`, or `Error::CredentialsNotFound` when neither
    /// source has a non-empty value.
    pub fn get(&self, provider: &str) -> Result<ApiKey> {
        self.lookup(provider)
            .map(|(key, _)| key)
            .ok_or_else(|| Error::CredentialsNotFound(provider.to_string()))
    }

    pub fn has(&self, provider: &str) -> bool {
        self.lookup(provider).is_some()
    }

    /// Get the source of a credential.
    pub fn credential_source(&self, provider: &str) -> Option<CredentialSource> {
        self.lookup(provider).map(|(_, source)| source)
    }

    fn lookup(&self, provider: &str) -> Option<(ApiKey, CredentialSource)> {
        let var = env_var_for_provider(provider)?;

        if let Ok(value) = env::var(var)
            && !value.trim().is_empty()
        {
            debug!(provider, "retrieved API key from environment");
            return Some((ApiKey::new(value.trim()), CredentialSource::Environment));
        }

        if let Some(path) = &self.env_file
            && let Some(value) = read_env_file(path, var)
        {
            debug!(provider, path = %path.display(), "retrieved API key from env file");
            return Some((ApiKey::new(value), CredentialSource::EnvFile));
        }

        None
    }
}

fn read_env_file(path: &Path, var: &str) -> Option<String> {
    let iter = dotenvy::from_path_iter(path).ok()?;
    iter.filter_map(|item| item.ok())
        .find(|(key, value)| key == var && !value.trim().is_empty())
        .map(|(_, value)| value.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    fn env_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn key_never_shows_in_debug_output() {
        let key = ApiKey::from("sk-ant-abc123");
        let printed = format!("{key:?} {:?}", Some(key.clone()));
        assert!(!printed.contains("abc123"));
        assert_eq!(key.expose_secret(), "sk-ant-abc123");
    }

    #[test]
    fn only_anthropic_has_a_variable() {
        assert_eq!(env_var_for_provider("anthropic"), Some("ANTHROPIC_API_KEY"));
        assert!(env_var_for_provider("openai").is_none());
    }

    #[test]
    #[serial]
    fn environment_wins_over_env_file() {
        let file = env_file("ANTHROPIC_API_KEY=from-file\n");
        // SAFETY: env-mutating tests are serialized
        unsafe { env::set_var("ANTHROPIC_API_KEY", "from-env") };

        let store = CredentialStore::new().with_env_file(file.path());
        let key = store.get("anthropic");
        let source = store.credential_source("anthropic");

        // SAFETY: env-mutating tests are serialized
        unsafe { env::remove_var("ANTHROPIC_API_KEY") };

        assert_eq!(key.unwrap().expose_secret(), "from-env");
        assert_eq!(source, Some(CredentialSource::Environment));
    }

    #[test]
    #[serial]
    fn env_file_used_when_variable_unset() {
        // SAFETY: env-mutating tests are serialized
        unsafe { env::remove_var("ANTHROPIC_API_KEY") };
        let file = env_file("# comment\nOTHER=1\nANTHROPIC_API_KEY=\"sk-ant-file\"\n");

        let store = CredentialStore::new().with_env_file(file.path());
        assert_eq!(store.get("anthropic").unwrap().expose_secret(), "sk-ant-file");
        assert_eq!(
            store.credential_source("anthropic"),
            Some(CredentialSource::EnvFile)
        );
    }

    #[test]
    #[serial]
    fn blank_variable_is_ignored() {
        // SAFETY: env-mutating tests are serialized
        unsafe { env::set_var("ANTHROPIC_API_KEY", "   ") };
        let store = CredentialStore::new();
        let has = store.has("anthropic");
        // SAFETY: env-mutating tests are serialized
        unsafe { env::remove_var("ANTHROPIC_API_KEY") };
        assert!(!has);
    }

    #[test]
    #[serial]
    fn missing_credentials_is_error() {
        // SAFETY: env-mutating tests are serialized
        unsafe { env::remove_var("ANTHROPIC_API_KEY") };
        let store = CredentialStore::new().with_env_file("/nonexistent/.env");
        let err = store.get("anthropic").unwrap_err();
        assert!(matches!(err, Error::CredentialsNotFound(p) if p == "anthropic"));
    }

    #[test]
    fn unknown_provider_is_error() {
        let err = CredentialStore::new().get("unknown-provider").unwrap_err();
        assert!(matches!(err, Error::CredentialsNotFound(_)));
    }
}
