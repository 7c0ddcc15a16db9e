//! Shared fixtures for unit tests.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::db::{RepositoryError, TransactionRepository};
use crate::models::{
    AgentRole, Attachment, Client, ClientType, TransactionFormData, TransactionRecord,
};
use crate::submission::{DeliveryError, EmailMessage, EmailSender, PdfRenderer, RenderError};
use crate::template::{CoverSheetTemplate, TemplateError, TemplateSource};

/// A complete dual-agent submission that passes every step.
pub fn valid_dual_agent_form() -> TransactionFormData {
    let mut form = TransactionFormData::new();

    form.agent_data.role = Some(AgentRole::DualAgent);
    form.agent_data.name = "John Doe".to_string();
    form.agent_data.email = "john.doe@example.com".to_string();
    form.agent_data.phone = "215-555-0100".to_string();

    form.property_data.mls_number = "123456".to_string();
    form.property_data.address = "123 Main St, Philadelphia, PA 19103".to_string();
    form.property_data.sale_price = "450000".to_string();
    form.property_data.status = "VACANT".to_string();
    form.property_data.county = "Philadelphia".to_string();
    form.property_data.property_type = "Single Family".to_string();
    form.property_data.closing_date = "2025-06-30".to_string();

    form.clients = vec![Client {
        id: "client-1".to_string(),
        name: "Alice Buyer".to_string(),
        email: "alice@example.com".to_string(),
        phone: "(215) 555-0199".to_string(),
        address: "9 Elm St, Philadelphia, PA 19104".to_string(),
        marital_status: "SINGLE".to_string(),
        client_type: Some(ClientType::Buyer),
    }];

    form.commission_data.total_commission_percentage = "5".to_string();
    form.commission_data.listing_agent_percentage = "2.5".to_string();
    form.commission_data.buyers_agent_percentage = "2.5".to_string();

    form.title_company_data.title_company_name = "Liberty Title".to_string();
    form.documents_data.confirm_documents = true;

    form.signature_data.signature = "John Doe".to_string();
    form.signature_data.agent_name = "John Doe".to_string();
    form.signature_data.terms_accepted = true;
    form.signature_data.info_confirmed = true;

    form
}

// =============================================================================
// in-memory collaborators
// =============================================================================

#[derive(Default)]
struct MemoryState {
    records: BTreeMap<String, TransactionRecord>,
    next_id: u32,
    create_error: Option<RepositoryError>,
    failing_stores: u32,
    store_calls: u32,
    failing_links: u32,
    link_calls: u32,
}

/// Record store kept in a map, with knobs for injecting failures.
#[derive(Default)]
pub struct MemoryRepository {
    state: Mutex<MemoryState>,
}

impl MemoryRepository {
    pub fn fail_creates(
        &self,
        err: RepositoryError,
    ) {
        self.state.lock().unwrap().create_error = Some(err);
    }

    /// Fail the next `n` document uploads.
    pub fn fail_attaches(
        &self,
        n: u32,
    ) {
        self.state.lock().unwrap().failing_stores = n;
    }

    pub fn attach_calls(&self) -> u32 {
        self.state.lock().unwrap().store_calls
    }

    /// Fail the next `n` attempts to link a stored document.
    pub fn fail_links(
        &self,
        n: u32,
    ) {
        self.state.lock().unwrap().failing_links = n;
    }

    pub fn link_calls(&self) -> u32 {
        self.state.lock().unwrap().link_calls
    }

    pub fn count(&self) -> usize {
        self.state.lock().unwrap().records.len()
    }

    pub fn record(
        &self,
        id: &str,
    ) -> Option<TransactionRecord> {
        self.state.lock().unwrap().records.get(id).cloned()
    }
}

#[async_trait]
impl TransactionRepository for MemoryRepository {
    async fn create_transaction(
        &self,
        form: &TransactionFormData,
    ) -> Result<TransactionRecord, RepositoryError> {
        let mut state = self.state.lock().unwrap();
        if let Some(err) = state.create_error.clone() {
            return Err(err);
        }
        state.next_id += 1;
        let now = Utc::now();
        let record = TransactionRecord {
            id: format!("rec{}", state.next_id),
            form: form.clone(),
            attachments: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        state.records.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn get_transaction(
        &self,
        id: &str,
    ) -> Result<TransactionRecord, RepositoryError> {
        self.record(id).ok_or(RepositoryError::NotFound)
    }

    async fn update_transaction(
        &self,
        id: &str,
        form: &TransactionFormData,
    ) -> Result<TransactionRecord, RepositoryError> {
        let mut state = self.state.lock().unwrap();
        let record = state.records.get_mut(id).ok_or(RepositoryError::NotFound)?;
        record.form = form.clone();
        record.updated_at = Utc::now();
        Ok(record.clone())
    }

    async fn delete_transaction(
        &self,
        id: &str,
    ) -> Result<(), RepositoryError> {
        self.state
            .lock()
            .unwrap()
            .records
            .remove(id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    async fn list_transactions(&self) -> Result<Vec<TransactionRecord>, RepositoryError> {
        Ok(self.state.lock().unwrap().records.values().rev().cloned().collect())
    }

    async fn store_document(
        &self,
        filename: &str,
        _pdf: &[u8],
    ) -> Result<Attachment, RepositoryError> {
        let mut state = self.state.lock().unwrap();
        state.store_calls += 1;
        if state.failing_stores > 0 {
            state.failing_stores -= 1;
            return Err(RepositoryError::Connection("upload timed out".to_string()));
        }
        Ok(Attachment {
            url: format!("memory://{filename}"),
            filename: filename.to_string(),
        })
    }

    async fn link_attachment(
        &self,
        id: &str,
        attachment: &Attachment,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().unwrap();
        state.link_calls += 1;
        if state.failing_links > 0 {
            state.failing_links -= 1;
            return Err(RepositoryError::Connection("record update timed out".to_string()));
        }
        let record = state.records.get_mut(id).ok_or(RepositoryError::NotFound)?;
        record.attachments.push(attachment.clone());
        Ok(())
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

/// Serves the same HTML for every template and remembers what was asked for.
pub struct StaticTemplates {
    html: String,
    loaded: Mutex<Vec<CoverSheetTemplate>>,
}

impl StaticTemplates {
    pub fn all(html: &str) -> Self {
        Self {
            html: html.to_string(),
            loaded: Mutex::new(Vec::new()),
        }
    }

    pub fn loaded(&self) -> Vec<CoverSheetTemplate> {
        self.loaded.lock().unwrap().clone()
    }
}

#[async_trait]
impl TemplateSource for StaticTemplates {
    async fn load(
        &self,
        template: CoverSheetTemplate,
    ) -> Result<String, TemplateError> {
        self.loaded.lock().unwrap().push(template);
        Ok(self.html.clone())
    }
}

/// Returns the HTML bytes as the "PDF".
#[derive(Default)]
pub struct StubRenderer {
    rendered: Mutex<Vec<String>>,
    error: Mutex<Option<RenderError>>,
}

impl StubRenderer {
    pub fn fail_with(
        &self,
        err: RenderError,
    ) {
        *self.error.lock().unwrap() = Some(err);
    }

    pub fn rendered(&self) -> Vec<String> {
        self.rendered.lock().unwrap().clone()
    }
}

#[async_trait]
impl PdfRenderer for StubRenderer {
    async fn render_pdf(
        &self,
        html: &str,
    ) -> Result<Vec<u8>, RenderError> {
        if let Some(err) = self.error.lock().unwrap().clone() {
            return Err(err);
        }
        self.rendered.lock().unwrap().push(html.to_string());
        Ok(html.as_bytes().to_vec())
    }
}

#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<EmailMessage>>,
    error: Mutex<Option<DeliveryError>>,
}

impl RecordingMailer {
    pub fn fail_with(
        &self,
        err: DeliveryError,
    ) {
        *self.error.lock().unwrap() = Some(err);
    }

    pub fn recover(&self) {
        *self.error.lock().unwrap() = None;
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmailSender for RecordingMailer {
    async fn send(
        &self,
        message: EmailMessage,
    ) -> Result<(), DeliveryError> {
        if let Some(err) = self.error.lock().unwrap().clone() {
            return Err(err);
        }
        self.sent.lock().unwrap().push(message);
        Ok(())
    }
}
