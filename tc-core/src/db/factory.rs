use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;

use super::repository::{RepositoryError, TransactionRepository};

/// Backend-agnostic connection configuration.
///
/// `backend` must match the [`RepositoryFactory::backend_name`] of a
/// registered factory. `connection_string` and `options` are passed through
/// to that factory unchanged; their meaning is backend-specific.
///
/// | backend   | connection_string examples            | options                        |
/// |-----------|---------------------------------------|--------------------------------|
/// | `sqlite`  | `transactions.db`, `:memory:`         | none                           |
/// | `hosted`  | `https://api.airtable.com/v0/appXYZ`  | `api_key`, `table`, `field_map`, `storage_url`, `storage_key` |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    /// Lowercase identifier matching a registered factory (e.g. `"sqlite"`).
    pub backend: String,
    /// Opaque value forwarded to the factory's `create` method.
    pub connection_string: String,
    /// Backend-specific settings such as credentials.
    pub options: BTreeMap<String, String>,
}

impl DbConfig {
    pub fn new(
        backend: impl Into<String>,
        connection_string: impl Into<String>,
    ) -> Self {
        Self {
            backend: backend.into(),
            connection_string: connection_string.into(),
            options: BTreeMap::new(),
        }
    }

    pub fn with_option(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Look up an option; blank values count as missing.
    pub fn option(
        &self,
        key: &str,
    ) -> Option<&str> {
        self.options
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    /// Like [`DbConfig::option`] but missing values are a configuration
    /// error naming the key.
    pub fn require_option(
        &self,
        key: &str,
    ) -> Result<&str, RepositoryError> {
        self.option(key).ok_or_else(|| {
            RepositoryError::Configuration(format!(
                "backend '{}' requires option '{key}'",
                self.backend
            ))
        })
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self::new("sqlite", ":memory:")
    }
}

/// One implementation per storage backend. Each backend crate exports a
/// single unit struct that implements this trait and is registered with a
/// [`RepositoryRegistry`] at startup.
#[async_trait]
pub trait RepositoryFactory: Send + Sync {
    /// Unique, lowercase identifier for this backend.
    fn backend_name(&self) -> &'static str;

    /// Open (or create) a connection and return a ready-to-use repository.
    /// Implementations may run migrations or warm connection pools here.
    async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn TransactionRepository>, RepositoryError>;
}

/// Registry of [`RepositoryFactory`] instances, keyed by backend name.
///
/// Typical lifetime:
/// 1. Create with `RepositoryRegistry::new()`.
/// 2. Call `register` once per known backend.
/// 3. Call `create` whenever a new repository is needed.
pub struct RepositoryRegistry {
    factories: HashMap<&'static str, Box<dyn RepositoryFactory>>,
}

impl RepositoryRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a backend factory. A factory with the same name is replaced.
    pub fn register(
        &mut self,
        factory: Box<dyn RepositoryFactory>,
    ) {
        self.factories.insert(factory.backend_name(), factory);
    }

    /// Names of every registered backend, sorted alphabetically.
    pub fn available_backends(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Dispatch to the factory that matches `config.backend`.
    ///
    /// # Errors
    /// * [`RepositoryError::Configuration`] when no factory is registered
    ///   for the requested backend name.
    /// * Any error the chosen factory itself returns.
    pub async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn TransactionRepository>, RepositoryError> {
        let factory = self
            .factories
            .get(config.backend.as_str())
            .ok_or_else(|| {
                RepositoryError::Configuration(format!(
                    "unknown backend '{}'; available: {:?}",
                    config.backend,
                    self.available_backends()
                ))
            })?;

        factory.create(config).await
    }
}

impl Default for RepositoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}
