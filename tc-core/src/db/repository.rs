use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Attachment, TransactionFormData, TransactionRecord};

/// Raw bytes of a stored document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDocument {
    pub filename: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Record not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

#[async_trait]
pub trait TransactionRepository: Send + Sync {
    /// Store a new transaction and return it with its generated id.
    async fn create_transaction(
        &self,
        form: &TransactionFormData,
    ) -> Result<TransactionRecord, RepositoryError>;

    async fn get_transaction(
        &self,
        id: &str,
    ) -> Result<TransactionRecord, RepositoryError>;

    async fn update_transaction(
        &self,
        id: &str,
        form: &TransactionFormData,
    ) -> Result<TransactionRecord, RepositoryError>;

    async fn delete_transaction(
        &self,
        id: &str,
    ) -> Result<(), RepositoryError>;

    /// Newest first.
    async fn list_transactions(&self) -> Result<Vec<TransactionRecord>, RepositoryError>;

    // Documents
    /// Store a PDF without linking it to a transaction.
    async fn store_document(
        &self,
        filename: &str,
        pdf: &[u8],
    ) -> Result<Attachment, RepositoryError>;

    /// Record an already stored document against a transaction.
    async fn link_attachment(
        &self,
        id: &str,
        attachment: &Attachment,
    ) -> Result<(), RepositoryError>;

    /// Fetch a document this backend serves itself. Backends whose
    /// attachment urls point elsewhere keep the default.
    async fn fetch_document(
        &self,
        _document_id: &str,
    ) -> Result<StoredDocument, RepositoryError> {
        Err(RepositoryError::NotFound)
    }

    /// Store a cover-sheet PDF and link it to an existing transaction.
    /// Returns [`RepositoryError::NotFound`] before uploading anything when
    /// the transaction does not exist.
    async fn attach_cover_sheet(
        &self,
        id: &str,
        filename: &str,
        pdf: &[u8],
    ) -> Result<Attachment, RepositoryError> {
        self.get_transaction(id).await?;
        let attachment = self.store_document(filename, pdf).await?;
        self.link_attachment(id, &attachment).await?;
        Ok(attachment)
    }

    /// Cheap round trip used by the health check.
    async fn ping(&self) -> Result<(), RepositoryError>;
}
