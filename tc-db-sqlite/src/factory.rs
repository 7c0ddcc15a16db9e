use async_trait::async_trait;

use tc_core::db::{DbConfig, RepositoryFactory};
use tc_core::{RepositoryError, TransactionRepository};

use crate::repository::SqliteRepository;

/// [`RepositoryFactory`] for SQLite.
///
/// Register this with a [`tc_core::db::RepositoryRegistry`] to make the
/// `"sqlite"` backend available:
///
/// ```rust,no_run
/// use tc_core::db::RepositoryRegistry;
/// use tc_db_sqlite::SqliteRepositoryFactory;
///
/// let mut registry = RepositoryRegistry::new();
/// registry.register(Box::new(SqliteRepositoryFactory));
/// ```
pub struct SqliteRepositoryFactory;

#[async_trait]
impl RepositoryFactory for SqliteRepositoryFactory {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    /// Open the database described by `config.connection_string`.
    ///
    /// Accepted connection-string values:
    /// * A bare file path such as `"transactions.db"`. The file is created
    ///   if it does not exist.
    /// * A sqlx URL such as `"sqlite:data/tc.db?mode=rwc"`.
    /// * `":memory:"` for an ephemeral database (useful for tests).
    ///
    /// Migrations are embedded and run on every open.
    async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn TransactionRepository>, RepositoryError> {
        let repo = SqliteRepository::new(&config.connection_string).await?;
        repo.run_migrations().await?;
        Ok(Box::new(repo))
    }
}
