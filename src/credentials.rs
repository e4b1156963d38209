//! Resolution of model credential references to secrets.
//!
//! A model only stores the *name* of its key (typically an environment
//! variable such as `OPENROUTER_API_KEY`). The resolver looks that name up in
//! a caller-supplied [`SecretSource`] right before a request goes out. Values
//! are never logged or written anywhere.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CredentialError {
    #[error("Model has no credential reference configured")]
    EmptyReference,

    #[error("No value found for credential '{0}'; set it in the environment or the .env file")]
    Missing(String),

    #[error(
        "Credential reference '{0}' looks like a model identifier; it must name a variable such as OPENROUTER_API_KEY"
    )]
    LooksLikeModelName(String),
}

/// An API key. Formatting never reveals the value.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

/// External key/value lookup backing the resolver.
pub trait SecretSource: Send + Sync {
    fn lookup(&self, key: &str) -> Option<String>;
}

/// Reads secrets from the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSource;

impl EnvSource {
    /// Loads a `.env` file into the process environment, then returns the
    /// source. A missing file is not an error; variables already set win.
    pub fn with_dotenv(path: Option<&Path>) -> Self {
        let loaded = match path {
            Some(path) => dotenvy::from_path(path).map(|()| path.to_path_buf()),
            None => dotenvy::dotenv(),
        };

        match loaded {
            Ok(path) => debug!("Loaded environment from {}", path.display()),
            Err(e) if e.not_found() => debug!("No .env file found"),
            Err(e) => warn!("Failed to load .env file: {e}"),
        }

        Self
    }
}

impl SecretSource for EnvSource {
    fn lookup(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Fixed in-memory secrets, for embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct MapSource {
    values: HashMap<String, String>,
}

impl MapSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }
}

impl<K, V> FromIterator<(K, V)> for MapSource
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl SecretSource for MapSource {
    fn lookup(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

#[derive(Clone)]
pub struct CredentialResolver {
    source: Arc<dyn SecretSource>,
}

impl CredentialResolver {
    pub fn new(source: impl SecretSource + 'static) -> Self {
        Self {
            source: Arc::new(source),
        }
    }

    #[must_use]
    pub fn from_arc(source: Arc<dyn SecretSource>) -> Self {
        Self { source }
    }

    pub fn resolve(&self, credential_ref: &str) -> Result<Secret, CredentialError> {
        let key = credential_ref.trim();
        if key.is_empty() {
            return Err(CredentialError::EmptyReference);
        }

        match self.source.lookup(key) {
            Some(value) if !value.trim().is_empty() => Ok(Secret::new(value.trim())),
            _ if key.contains('/') || key.contains('\\') => {
                Err(CredentialError::LooksLikeModelName(key.to_string()))
            }
            _ => Err(CredentialError::Missing(key.to_string())),
        }
    }
}

impl fmt::Debug for CredentialResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialResolver").finish_non_exhaustive()
    }
}
