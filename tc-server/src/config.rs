//! Settings read from the environment.
//!
//! Every lookup goes through a closure so tests can supply a map instead of
//! mutating the process environment.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tc_core::db::DbConfig;

pub const DEFAULT_SMTP_PORT: u16 = 587;
pub const DEFAULT_RECORD_STORE_URL: &str = "https://api.airtable.com/v0";
pub const DEFAULT_SQLITE_PATH: &str = "transactions.db";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmailSettings {
    pub host: Option<String>,
    pub port: u16,
    /// Implicit TLS when true, STARTTLS otherwise.
    pub secure: bool,
    pub user: Option<String>,
    pub password: Option<String>,
    pub from: String,
    pub recipients: Vec<String>,
}

impl EmailSettings {
    pub fn is_complete(&self) -> bool {
        self.host.is_some() && self.user.is_some() && self.password.is_some() && !self.from.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordStoreSettings {
    pub url: String,
    pub api_key: Option<String>,
    pub base_id: Option<String>,
    pub table: Option<String>,
    pub field_map: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageSettings {
    pub url: Option<String>,
    pub key: Option<String>,
    pub bucket: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerConfig {
    pub email: EmailSettings,
    pub record_store: RecordStoreSettings,
    pub storage: StorageSettings,
    pub auth_secret: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| non_blank(lookup(key));

        let secure = get("EMAIL_SECURE").is_some_and(|v| parse_flag(&v));
        let port = match get("EMAIL_PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .with_context(|| format!("EMAIL_PORT must be a port number, got '{raw}'"))?,
            None if secure => 465,
            None => DEFAULT_SMTP_PORT,
        };
        let user = get("EMAIL_USER");
        let from = get("EMAIL_FROM").or_else(|| user.clone()).unwrap_or_default();
        let recipients = get("EMAIL_RECIPIENT")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            email: EmailSettings {
                host: get("EMAIL_HOST"),
                port,
                secure,
                user,
                password: get("EMAIL_PASSWORD"),
                from,
                recipients,
            },
            record_store: RecordStoreSettings {
                url: get("RECORD_STORE_URL").unwrap_or_else(|| DEFAULT_RECORD_STORE_URL.to_string()),
                api_key: get("RECORD_STORE_API_KEY"),
                base_id: get("RECORD_STORE_BASE_ID"),
                table: get("RECORD_STORE_TABLE"),
                field_map: get("RECORD_STORE_FIELD_MAP"),
            },
            storage: StorageSettings {
                url: get("STORAGE_URL"),
                key: get("STORAGE_KEY"),
                bucket: get("STORAGE_BUCKET"),
            },
            auth_secret: get("AUTH_SECRET"),
        })
    }

    /// Connection settings for `backend`. `connection` overrides the
    /// default connection string.
    pub fn db_config(
        &self,
        backend: &str,
        connection: Option<&str>,
    ) -> Result<DbConfig> {
        match backend {
            "hosted" => {
                let base_url = match (connection, &self.record_store.base_id) {
                    (Some(url), _) => url.to_string(),
                    (None, Some(base_id)) => {
                        format!("{}/{}", self.record_store.url.trim_end_matches('/'), base_id)
                    }
                    (None, None) => {
                        bail!("hosted backend needs RECORD_STORE_BASE_ID or --db")
                    }
                };

                let mut config = DbConfig::new(backend, base_url);
                let options = [
                    ("api_key", &self.record_store.api_key),
                    ("table", &self.record_store.table),
                    ("field_map", &self.record_store.field_map),
                    ("storage_url", &self.storage.url),
                    ("storage_key", &self.storage.key),
                    ("storage_bucket", &self.storage.bucket),
                ];
                for (key, value) in options {
                    if let Some(value) = value {
                        config = config.with_option(key, value.as_str());
                    }
                }
                Ok(config)
            }
            _ => Ok(DbConfig::new(backend, connection.unwrap_or(DEFAULT_SQLITE_PATH))),
        }
    }
}

/// Resolve the cover-sheet template directory: an explicit path wins, then
/// `./templates`, then the templates shipped next to this crate.
pub fn templates_dir(explicit: Option<&Path>) -> PathBuf {
    if let Some(dir) = explicit {
        return dir.to_path_buf();
    }
    let local = PathBuf::from("templates");
    if local.is_dir() {
        return local;
    }
    Path::new(env!("CARGO_MANIFEST_DIR")).join("templates")
}
