use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RenderError {
    #[error("PDF renderer unavailable: {0}")]
    Unavailable(String),

    #[error("PDF rendering failed: {0}")]
    Failed(String),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("Email is not configured: {0}")]
    Configuration(String),

    #[error("Invalid email message: {0}")]
    InvalidMessage(String),

    #[error("Email transport error: {0}")]
    Transport(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfAttachment {
    pub filename: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html_body: String,
    pub attachment: Option<PdfAttachment>,
}

/// Turns rendered cover-sheet HTML into a Letter-size PDF.
#[async_trait]
pub trait PdfRenderer: Send + Sync {
    async fn render_pdf(
        &self,
        html: &str,
    ) -> Result<Vec<u8>, RenderError>;

    async fn is_available(&self) -> bool {
        true
    }
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(
        &self,
        message: EmailMessage,
    ) -> Result<(), DeliveryError>;

    /// False when credentials are missing; sending would fail with
    /// [`DeliveryError::Configuration`].
    fn is_configured(&self) -> bool {
        true
    }
}
