use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::db::{RepositoryError, TransactionRepository};
use crate::models::{Attachment, TransactionFormData};
use crate::template::{CoverSheetTemplate, TemplateError, TemplateSource, flatten, render};
use crate::validation::{FieldErrors, validate_all};

use super::collaborators::{
    DeliveryError, EmailMessage, EmailSender, PdfAttachment, PdfRenderer, RenderError,
};
use super::outcome::{Stage, StageStatus, SubmissionOutcome, SubmissionStep};
use super::retry::retry_fixed;

const EMAIL_BODY: &str = r#"<h2>New Transaction Submission</h2>
<p><strong>Transaction ID:</strong> {{transactionId}}</p>
<p><strong>Agent:</strong> {{agentName}} ({{agentRole}})</p>
<p><strong>Property:</strong> {{propertyAddress}}</p>
<p><strong>Sale price:</strong> {{salePrice}}</p>
<p><strong>Closing date:</strong> {{closingDate}}</p>
<p><strong>Clients:</strong> {{clientNames}}</p>
<p>The cover sheet is attached.</p>"#;

#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}

#[derive(Debug, Clone)]
pub struct SubmissionConfig {
    pub email_from: String,
    pub email_recipients: Vec<String>,
    /// Total tries for the attach stage, including the first.
    pub attach_attempts: u32,
    pub attach_retry_delay: Duration,
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            email_from: String::new(),
            email_recipients: Vec::new(),
            attach_attempts: 3,
            attach_retry_delay: Duration::from_millis(500),
        }
    }
}

/// Progress trace for one submission. Every stage starts pending.
struct Trace {
    steps: Vec<SubmissionStep>,
}

impl Trace {
    fn new() -> Self {
        Self {
            steps: Stage::ALL.into_iter().map(SubmissionStep::pending).collect(),
        }
    }

    fn set(
        &mut self,
        stage: Stage,
        status: StageStatus,
        message: Option<String>,
    ) {
        if let Some(step) = self.steps.iter_mut().find(|s| s.id == stage.id()) {
            step.status = status;
            step.message = message;
        }
    }

    fn start(
        &mut self,
        stage: Stage,
    ) {
        info!(stage = stage.id(), "stage started");
        self.set(stage, StageStatus::Loading, None);
    }

    fn complete(
        &mut self,
        stage: Stage,
        message: impl Into<String>,
    ) {
        self.set(stage, StageStatus::Complete, Some(message.into()));
    }

    fn fail(
        &mut self,
        stage: Stage,
        err: &SubmissionError,
    ) {
        if stage.is_required() {
            error!(stage = stage.id(), error = %err, "required stage failed");
        } else {
            warn!(stage = stage.id(), error = %err, "optional stage failed");
        }
        self.set(stage, StageStatus::Error, Some(err.to_string()));
    }

    fn into_steps(self) -> Vec<SubmissionStep> {
        self.steps
    }
}

/// `Transaction_123_Main_St.pdf` from the property address.
pub fn cover_sheet_filename(data: &TransactionFormData) -> String {
    let slug: Vec<String> = data
        .property_data
        .address
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect();
    if slug.is_empty() {
        "Transaction_Cover_Sheet.pdf".to_string()
    } else {
        format!("Transaction_{}.pdf", slug.join("_"))
    }
}

fn attach_is_retryable(err: &RepositoryError) -> bool {
    !matches!(err, RepositoryError::Configuration(_))
}

/// Runs a validated form through record creation, cover-sheet rendering,
/// attachment and email.
///
/// Stages run strictly in order. A failed required stage stops the run; a
/// failed optional stage is recorded and the run continues. Nothing is sent
/// anywhere until the whole form validates.
pub struct SubmissionOrchestrator {
    repository: Arc<dyn TransactionRepository>,
    templates: Arc<dyn TemplateSource>,
    renderer: Arc<dyn PdfRenderer>,
    mailer: Arc<dyn EmailSender>,
    config: SubmissionConfig,
}

impl SubmissionOrchestrator {
    pub fn new(
        repository: Arc<dyn TransactionRepository>,
        templates: Arc<dyn TemplateSource>,
        renderer: Arc<dyn PdfRenderer>,
        mailer: Arc<dyn EmailSender>,
        config: SubmissionConfig,
    ) -> Self {
        Self {
            repository,
            templates,
            renderer,
            mailer,
            config,
        }
    }

    pub fn repository(&self) -> &Arc<dyn TransactionRepository> {
        &self.repository
    }

    pub fn templates(&self) -> &Arc<dyn TemplateSource> {
        &self.templates
    }

    pub fn renderer(&self) -> &Arc<dyn PdfRenderer> {
        &self.renderer
    }

    pub fn mailer(&self) -> &Arc<dyn EmailSender> {
        &self.mailer
    }

    pub fn config(&self) -> &SubmissionConfig {
        &self.config
    }

    /// Load, fill and render one cover sheet.
    pub async fn render_cover_sheet(
        &self,
        template: CoverSheetTemplate,
        data: &TransactionFormData,
    ) -> Result<Vec<u8>, SubmissionError> {
        let html = self.templates.load(template).await?;
        let html = render(&html, &flatten(data))?;
        let pdf = self.renderer.render_pdf(&html).await?;
        info!(template = template.name(), bytes = pdf.len(), "cover sheet rendered");
        Ok(pdf)
    }

    /// Send the notification email with `pdf` attached.
    pub async fn send_notification(
        &self,
        data: &TransactionFormData,
        transaction_id: Option<&str>,
        pdf: Vec<u8>,
    ) -> Result<(), SubmissionError> {
        if self.config.email_recipients.is_empty() {
            return Err(DeliveryError::Configuration("no recipient configured".to_string()).into());
        }

        let mut values = flatten(data);
        values.insert(
            "transactionId".to_string(),
            transaction_id.unwrap_or("not saved").to_string(),
        );

        let address = data.property_data.address.trim();
        let subject = if address.is_empty() {
            "New Transaction Submission".to_string()
        } else {
            format!("New Transaction: {address}")
        };

        let html_body = render(EMAIL_BODY, &values)?;
        let message = EmailMessage {
            from: self.config.email_from.clone(),
            to: self.config.email_recipients.clone(),
            subject,
            html_body,
            attachment: Some(PdfAttachment {
                filename: cover_sheet_filename(data),
                bytes: pdf,
            }),
        };

        self.mailer.send(message).await?;
        info!(transaction_id = transaction_id.unwrap_or("-"), "notification email sent");
        Ok(())
    }

    /// Render the cover sheet for the form's role and email it without
    /// touching the record store.
    pub async fn email_cover_sheet(
        &self,
        data: &TransactionFormData,
    ) -> Result<(), SubmissionError> {
        let role = data
            .role()
            .ok_or_else(|| TemplateError::UnknownRole(String::new()))?;
        let pdf = self
            .render_cover_sheet(CoverSheetTemplate::from_role(role), data)
            .await?;
        self.send_notification(data, None, pdf).await
    }

    /// Upload the cover sheet, then link it to the record. Each half is
    /// retried on its own so a failed link never uploads the PDF again.
    async fn attach_with_retry(
        &self,
        id: &str,
        filename: &str,
        pdf: &[u8],
    ) -> Result<Attachment, RepositoryError> {
        let attachment = retry_fixed(
            self.config.attach_attempts,
            self.config.attach_retry_delay,
            Stage::AttachPdf.id(),
            attach_is_retryable,
            || self.repository.store_document(filename, pdf),
        )
        .await?;

        retry_fixed(
            self.config.attach_attempts,
            self.config.attach_retry_delay,
            Stage::AttachPdf.id(),
            attach_is_retryable,
            || self.repository.link_attachment(id, &attachment),
        )
        .await?;
        Ok(attachment)
    }

    fn abort(
        trace: Trace,
        transaction_id: Option<String>,
        stage: Stage,
        err: &SubmissionError,
    ) -> SubmissionOutcome {
        SubmissionOutcome::failed(transaction_id, trace.into_steps(), stage, &err.to_string())
    }

    /// Validate the whole form and run every stage.
    pub async fn submit(
        &self,
        data: &TransactionFormData,
    ) -> SubmissionOutcome {
        let errors = validate_all(data);
        if !errors.is_empty() {
            warn!(fields = errors.len(), "submission rejected by validation");
            return SubmissionOutcome::invalid(errors);
        }
        let Some(role) = data.role() else {
            let mut errors = FieldErrors::new();
            errors.add("role", "Please select your role");
            return SubmissionOutcome::invalid(errors);
        };
        let template = CoverSheetTemplate::from_role(role);

        let mut form = data.clone();
        form.signature_data.date_submitted.get_or_insert_with(Utc::now);
        let mut trace = Trace::new();

        trace.start(Stage::CreateRecord);
        let id = match self.repository.create_transaction(&form).await {
            Ok(record) => record.id,
            Err(e) => {
                let err = SubmissionError::from(e);
                trace.fail(Stage::CreateRecord, &err);
                return Self::abort(trace, None, Stage::CreateRecord, &err);
            }
        };
        trace.complete(Stage::CreateRecord, format!("Saved as {id}"));

        trace.start(Stage::RenderPdf);
        let pdf = match self.render_cover_sheet(template, &form).await {
            Ok(pdf) => pdf,
            Err(err) => {
                trace.fail(Stage::RenderPdf, &err);
                return Self::abort(trace, Some(id), Stage::RenderPdf, &err);
            }
        };
        trace.complete(Stage::RenderPdf, "Cover sheet generated");

        trace.start(Stage::AttachPdf);
        let filename = cover_sheet_filename(&form);
        let mut problems = Vec::new();
        match self.attach_with_retry(&id, &filename, &pdf).await {
            Ok(attachment) => {
                trace.complete(Stage::AttachPdf, format!("Attached {}", attachment.filename))
            }
            Err(e) => {
                let err = SubmissionError::from(e);
                trace.fail(Stage::AttachPdf, &err);
                problems.push(format!("the cover sheet could not be attached: {err}"));
            }
        }

        trace.start(Stage::SendEmail);
        let email_sent = match self.send_notification(&form, Some(&id), pdf).await {
            Ok(()) => {
                trace.complete(Stage::SendEmail, "Notification sent");
                true
            }
            Err(err) => {
                trace.fail(Stage::SendEmail, &err);
                problems.push(format!("the notification email could not be sent: {err}"));
                false
            }
        };

        if problems.is_empty() {
            info!(transaction_id = %id, "submission complete");
            SubmissionOutcome::complete(id, trace.into_steps())
        } else {
            warn!(transaction_id = %id, failed = problems.len(), "submission saved with errors");
            SubmissionOutcome::saved(id, trace.into_steps(), email_sent, &problems.join("; "))
        }
    }

    /// Re-run only the email stage for a stored transaction.
    ///
    /// Errors only when the transaction cannot be read; render and delivery
    /// failures come back as an errored step.
    pub async fn retry_email(
        &self,
        transaction_id: &str,
        data: &TransactionFormData,
    ) -> Result<SubmissionStep, SubmissionError> {
        self.repository.get_transaction(transaction_id).await?;

        let mut trace = Trace::new();
        trace.start(Stage::SendEmail);

        let result = match data.role() {
            Some(role) => {
                match self
                    .render_cover_sheet(CoverSheetTemplate::from_role(role), data)
                    .await
                {
                    Ok(pdf) => self.send_notification(data, Some(transaction_id), pdf).await,
                    Err(err) => Err(err),
                }
            }
            None => Err(TemplateError::UnknownRole(String::new()).into()),
        };

        match result {
            Ok(()) => trace.complete(Stage::SendEmail, "Notification sent"),
            Err(err) => trace.fail(Stage::SendEmail, &err),
        }

        let step = trace
            .into_steps()
            .into_iter()
            .find(|s| s.id == Stage::SendEmail.id())
            .unwrap_or_else(|| SubmissionStep::pending(Stage::SendEmail));
        Ok(step)
    }
}
