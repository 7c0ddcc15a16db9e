use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::FromRow;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tc_core::db::StoredDocument;
use tc_core::{Attachment, RepositoryError, TransactionFormData, TransactionRecord, TransactionRepository};
use tracing::{debug, info};
use uuid::Uuid;

/// Documents stored here are served by the HTTP layer under this path.
pub const DOCUMENT_URL_PREFIX: &str = "/api/documents/";

pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Open a database. Accepts `:memory:`, a sqlx URL (`sqlite:...`) or a
    /// bare file path, which is created if missing.
    pub async fn new(database_url: &str) -> Result<Self, RepositoryError> {
        let connection_error = |e: sqlx::Error| RepositoryError::Connection(e.to_string());

        let pool = if database_url == ":memory:" || database_url == "sqlite::memory:" {
            // Every in-memory connection is its own database, so keep exactly one.
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect("sqlite::memory:")
                .await
                .map_err(connection_error)?
        } else {
            let options = if database_url.starts_with("sqlite:") {
                SqliteConnectOptions::from_str(database_url).map_err(connection_error)?
            } else {
                SqliteConnectOptions::new().filename(database_url)
            }
            .create_if_missing(true)
            .foreign_keys(true);

            SqlitePoolOptions::new()
                .connect_with(options)
                .await
                .map_err(connection_error)?
        };

        info!(database = database_url, "sqlite pool opened");
        Ok(Self { pool })
    }

    pub async fn new_with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> Result<(), RepositoryError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn attachments_for(
        &self,
        id: &str,
    ) -> Result<Vec<Attachment>, RepositoryError> {
        let rows: Vec<AttachmentRow> = sqlx::query_as(
            "SELECT transaction_id, url, filename
             FROM transaction_attachments
             WHERE transaction_id = ?
             ORDER BY id",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(rows.into_iter().map(Attachment::from).collect())
    }
}

#[derive(FromRow)]
struct TransactionRow {
    id: String,
    form_json: String,
    created_at: String,
    updated_at: String,
}

impl TransactionRow {
    fn into_record(
        self,
        attachments: Vec<Attachment>,
    ) -> Result<TransactionRecord, RepositoryError> {
        let form: TransactionFormData = serde_json::from_str(&self.form_json).map_err(|e| {
            RepositoryError::Database(format!("Invalid form JSON for '{}': {}", self.id, e))
        })?;
        Ok(TransactionRecord {
            id: self.id,
            form,
            attachments,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

#[derive(FromRow)]
struct AttachmentRow {
    transaction_id: String,
    url: String,
    filename: String,
}

impl From<AttachmentRow> for Attachment {
    fn from(row: AttachmentRow) -> Self {
        Attachment {
            url: row.url,
            filename: row.filename,
        }
    }
}

#[derive(FromRow)]
struct DocumentRow {
    filename: String,
    content: Vec<u8>,
}

fn db_error(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Database(e.to_string())
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|naive| naive.and_utc())
        })
        .map_err(|e| RepositoryError::Database(format!("Failed to parse datetime '{}': {}", s, e)))
}

fn form_json(form: &TransactionFormData) -> Result<String, RepositoryError> {
    serde_json::to_string(form).map_err(|e| RepositoryError::Database(e.to_string()))
}

#[async_trait]
impl TransactionRepository for SqliteRepository {
    async fn create_transaction(
        &self,
        form: &TransactionFormData,
    ) -> Result<TransactionRecord, RepositoryError> {
        let id = Uuid::new_v4().to_string();
        let now = timestamp(Utc::now());

        sqlx::query(
            "INSERT INTO transactions (id, agent_role, property_address, form_json, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(form.role().map(|r| r.as_str()))
        .bind(&form.property_data.address)
        .bind(form_json(form)?)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        debug!(transaction_id = %id, "transaction inserted");
        self.get_transaction(&id).await
    }

    async fn get_transaction(
        &self,
        id: &str,
    ) -> Result<TransactionRecord, RepositoryError> {
        let row: TransactionRow = sqlx::query_as(
            "SELECT id, form_json, created_at, updated_at FROM transactions WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .ok_or(RepositoryError::NotFound)?;

        let attachments = self.attachments_for(id).await?;
        row.into_record(attachments)
    }

    async fn update_transaction(
        &self,
        id: &str,
        form: &TransactionFormData,
    ) -> Result<TransactionRecord, RepositoryError> {
        let result = sqlx::query(
            "UPDATE transactions SET
                agent_role = ?, property_address = ?, form_json = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(form.role().map(|r| r.as_str()))
        .bind(&form.property_data.address)
        .bind(form_json(form)?)
        .bind(timestamp(Utc::now()))
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        self.get_transaction(id).await
    }

    async fn delete_transaction(
        &self,
        id: &str,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        sqlx::query("DELETE FROM transaction_attachments WHERE transaction_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

        let result = sqlx::query("DELETE FROM transactions WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        tx.commit().await.map_err(db_error)?;
        Ok(())
    }

    async fn list_transactions(&self) -> Result<Vec<TransactionRecord>, RepositoryError> {
        let rows: Vec<TransactionRow> = sqlx::query_as(
            "SELECT id, form_json, created_at, updated_at
             FROM transactions ORDER BY created_at DESC, rowid DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        let attachment_rows: Vec<AttachmentRow> = sqlx::query_as(
            "SELECT transaction_id, url, filename FROM transaction_attachments ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        let mut attachments: HashMap<String, Vec<Attachment>> = HashMap::new();
        for row in attachment_rows {
            attachments
                .entry(row.transaction_id.clone())
                .or_default()
                .push(row.into());
        }

        rows.into_iter()
            .map(|row| {
                let linked = attachments.remove(&row.id).unwrap_or_default();
                row.into_record(linked)
            })
            .collect()
    }

    async fn store_document(
        &self,
        filename: &str,
        pdf: &[u8],
    ) -> Result<Attachment, RepositoryError> {
        let id = Uuid::new_v4().to_string();

        sqlx::query("INSERT INTO documents (id, filename, content, created_at) VALUES (?, ?, ?, ?)")
            .bind(&id)
            .bind(filename)
            .bind(pdf)
            .bind(timestamp(Utc::now()))
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        debug!(document_id = %id, bytes = pdf.len(), "document stored");
        Ok(Attachment {
            url: format!("{DOCUMENT_URL_PREFIX}{id}"),
            filename: filename.to_string(),
        })
    }

    async fn link_attachment(
        &self,
        id: &str,
        attachment: &Attachment,
    ) -> Result<(), RepositoryError> {
        let exists: Option<(String,)> = sqlx::query_as("SELECT id FROM transactions WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;
        if exists.is_none() {
            return Err(RepositoryError::NotFound);
        }

        sqlx::query(
            "INSERT INTO transaction_attachments (transaction_id, url, filename, created_at)
             VALUES (?, ?, ?, ?)",
        )
        .bind(id)
        .bind(&attachment.url)
        .bind(&attachment.filename)
        .bind(timestamp(Utc::now()))
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(())
    }

    async fn fetch_document(
        &self,
        document_id: &str,
    ) -> Result<StoredDocument, RepositoryError> {
        let row: DocumentRow = sqlx::query_as("SELECT filename, content FROM documents WHERE id = ?")
            .bind(document_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?
            .ok_or(RepositoryError::NotFound)?;

        Ok(StoredDocument {
            filename: row.filename,
            bytes: row.content,
        })
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::Connection(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tc_core::AgentRole;

    use super::*;

    async fn setup_test_db() -> SqliteRepository {
        let repo = SqliteRepository::new(":memory:")
            .await
            .expect("Failed to create in-memory database");
        repo.run_migrations().await.expect("Failed to run migrations");
        repo
    }

    fn sample_form() -> TransactionFormData {
        let mut form = TransactionFormData::new();
        form.agent_data.role = Some(AgentRole::ListingAgent);
        form.property_data.address = "123 Main St, Philadelphia, PA 19103".to_string();
        form.property_data.sale_price = "450000".to_string();
        form.clients[0].name = "Alice Seller".to_string();
        form
    }

    #[tokio::test]
    async fn test_create_and_get_transaction() {
        let repo = setup_test_db().await;
        let form = sample_form();

        let created = repo.create_transaction(&form).await.expect("Should create transaction");

        assert!(!created.id.is_empty());
        assert_eq!(created.form, form);
        assert!(created.attachments.is_empty());

        let fetched = repo.get_transaction(&created.id).await.expect("Should fetch transaction");
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_get_transaction_not_found() {
        let repo = setup_test_db().await;

        let result = repo.get_transaction("missing").await;

        assert!(matches!(result, Err(RepositoryError::NotFound)));
    }

    #[tokio::test]
    async fn test_update_transaction() {
        let repo = setup_test_db().await;
        let created = repo.create_transaction(&sample_form()).await.unwrap();

        let mut form = created.form.clone();
        form.title_company_data.title_company_name = "Liberty Title".to_string();
        let updated = repo
            .update_transaction(&created.id, &form)
            .await
            .expect("Should update transaction");

        assert_eq!(updated.form.title_company_data.title_company_name, "Liberty Title");
        assert!(updated.updated_at >= created.updated_at);
        assert_eq!(updated.created_at, created.created_at);
    }

    #[tokio::test]
    async fn test_update_missing_transaction() {
        let repo = setup_test_db().await;

        let result = repo.update_transaction("missing", &sample_form()).await;

        assert!(matches!(result, Err(RepositoryError::NotFound)));
    }

    #[tokio::test]
    async fn test_delete_transaction_removes_attachments() {
        let repo = setup_test_db().await;
        let created = repo.create_transaction(&sample_form()).await.unwrap();
        repo.attach_cover_sheet(&created.id, "cover.pdf", b"%PDF-1.4")
            .await
            .unwrap();

        repo.delete_transaction(&created.id).await.expect("Should delete transaction");

        assert!(matches!(
            repo.get_transaction(&created.id).await,
            Err(RepositoryError::NotFound)
        ));
        assert!(matches!(
            repo.delete_transaction(&created.id).await,
            Err(RepositoryError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_list_transactions_newest_first() {
        let repo = setup_test_db().await;
        let first = repo.create_transaction(&sample_form()).await.unwrap();
        let second = repo.create_transaction(&sample_form()).await.unwrap();

        let all = repo.list_transactions().await.expect("Should list transactions");

        let ids: Vec<&str> = all.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec![second.id.as_str(), first.id.as_str()]);
    }

    #[tokio::test]
    async fn test_attach_cover_sheet_round_trip() {
        let repo = setup_test_db().await;
        let created = repo.create_transaction(&sample_form()).await.unwrap();

        let attachment = repo
            .attach_cover_sheet(&created.id, "cover.pdf", b"%PDF-1.4 test")
            .await
            .expect("Should attach");

        assert_eq!(attachment.filename, "cover.pdf");
        assert!(attachment.url.starts_with(DOCUMENT_URL_PREFIX));

        let fetched = repo.get_transaction(&created.id).await.unwrap();
        assert_eq!(fetched.attachments, vec![attachment.clone()]);

        let listed = repo.list_transactions().await.unwrap();
        assert_eq!(listed[0].attachments, vec![attachment.clone()]);

        let document_id = attachment.url.trim_start_matches(DOCUMENT_URL_PREFIX);
        let document = repo.fetch_document(document_id).await.unwrap();
        assert_eq!(document.filename, "cover.pdf");
        assert_eq!(document.bytes, b"%PDF-1.4 test".to_vec());
    }

    #[tokio::test]
    async fn test_attach_to_missing_transaction() {
        let repo = setup_test_db().await;

        let result = repo.attach_cover_sheet("missing", "cover.pdf", b"%PDF").await;

        assert!(matches!(result, Err(RepositoryError::NotFound)));
    }

    #[tokio::test]
    async fn test_ping() {
        let repo = setup_test_db().await;
        assert!(repo.ping().await.is_ok());
    }

    #[tokio::test]
    async fn test_file_database_persists_across_pools() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("transactions.db");
        let path = path.to_str().unwrap();

        let id = {
            let repo = SqliteRepository::new(path).await.unwrap();
            repo.run_migrations().await.unwrap();
            repo.create_transaction(&sample_form()).await.unwrap().id
        };

        let reopened = SqliteRepository::new(path).await.unwrap();
        reopened.run_migrations().await.unwrap();
        assert!(reopened.get_transaction(&id).await.is_ok());
    }
}
