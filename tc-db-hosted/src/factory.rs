use std::path::Path;

use async_trait::async_trait;
use tc_core::db::{DbConfig, RepositoryFactory};
use tc_core::{RepositoryError, TransactionRepository};
use tracing::{info, warn};

use crate::field_map::FieldMap;
use crate::repository::HostedRepository;
use crate::storage::StorageClient;

pub const DEFAULT_TABLE: &str = "Transactions";
pub const DEFAULT_BUCKET: &str = "transaction-pdfs";

/// [`RepositoryFactory`] for the hosted record store.
///
/// `connection_string` is the base url (`https://api.airtable.com/v0/appXYZ`).
/// Options:
/// * `api_key` (required)
/// * `field_map`: path to the TOML field map (required)
/// * `table`: defaults to `Transactions`
/// * `storage_url`, `storage_key`, `storage_bucket`: object storage for
///   cover sheets. Without them documents cannot be stored.
pub struct HostedRepositoryFactory;

impl HostedRepositoryFactory {
    fn storage(
        http: &reqwest::Client,
        config: &DbConfig,
    ) -> Option<StorageClient> {
        match (config.option("storage_url"), config.option("storage_key")) {
            (Some(url), Some(key)) => Some(StorageClient::new(
                http.clone(),
                url,
                config.option("storage_bucket").unwrap_or(DEFAULT_BUCKET),
                key,
            )),
            _ => {
                warn!("file storage not configured, cover sheets cannot be attached");
                None
            }
        }
    }
}

#[async_trait]
impl RepositoryFactory for HostedRepositoryFactory {
    fn backend_name(&self) -> &'static str {
        "hosted"
    }

    async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn TransactionRepository>, RepositoryError> {
        let api_key = config.require_option("api_key")?;
        let map_path = config.require_option("field_map")?;
        let fields = FieldMap::load(Path::new(map_path))
            .map_err(|e| RepositoryError::Configuration(e.to_string()))?;
        let table = config.option("table").unwrap_or(DEFAULT_TABLE);

        let http = reqwest::Client::new();
        let storage = Self::storage(&http, config);
        let repo = HostedRepository::new(
            http,
            &config.connection_string,
            table,
            api_key,
            fields,
            storage,
        )?;

        info!(table, "hosted repository configured");
        Ok(Box::new(repo))
    }
}
