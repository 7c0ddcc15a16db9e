use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tc_core::submission::{DeliveryError, EmailMessage, EmailSender};
use tracing::{debug, warn};

use crate::config::EmailSettings;

/// SMTP delivery through lettre. Without complete settings every send fails
/// with [`DeliveryError::Configuration`].
pub struct SmtpMailer {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
}

impl SmtpMailer {
    pub fn new(settings: &EmailSettings) -> Self {
        let transport = match Self::build_transport(settings) {
            Ok(transport) => transport,
            Err(e) => {
                warn!(error = %e, "SMTP transport could not be built");
                None
            }
        };
        Self { transport }
    }

    fn build_transport(
        settings: &EmailSettings,
    ) -> Result<Option<AsyncSmtpTransport<Tokio1Executor>>, lettre::transport::smtp::Error> {
        let (Some(host), Some(user), Some(password)) =
            (&settings.host, &settings.user, &settings.password)
        else {
            return Ok(None);
        };

        let builder = if settings.secure {
            AsyncSmtpTransport::<Tokio1Executor>::relay(host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)?
        };
        let transport = builder
            .port(settings.port)
            .credentials(Credentials::new(user.clone(), password.clone()))
            .build();
        Ok(Some(transport))
    }
}

fn mailbox(address: &str) -> Result<Mailbox, DeliveryError> {
    address
        .parse()
        .map_err(|e| DeliveryError::InvalidMessage(format!("bad address '{address}': {e}")))
}

/// Build the MIME message: an HTML body plus the optional PDF.
pub fn build_message(message: EmailMessage) -> Result<Message, DeliveryError> {
    if message.to.is_empty() {
        return Err(DeliveryError::InvalidMessage("no recipients".to_string()));
    }

    let mut builder = Message::builder()
        .from(mailbox(&message.from)?)
        .subject(message.subject);
    for to in &message.to {
        builder = builder.to(mailbox(to)?);
    }

    let mut body = MultiPart::mixed().singlepart(SinglePart::html(message.html_body));
    if let Some(pdf) = message.attachment {
        let content_type = ContentType::parse("application/pdf")
            .map_err(|e| DeliveryError::InvalidMessage(e.to_string()))?;
        body = body.singlepart(Attachment::new(pdf.filename).body(pdf.bytes, content_type));
    }

    builder
        .multipart(body)
        .map_err(|e| DeliveryError::InvalidMessage(e.to_string()))
}

#[async_trait]
impl EmailSender for SmtpMailer {
    async fn send(
        &self,
        message: EmailMessage,
    ) -> Result<(), DeliveryError> {
        let transport = self.transport.as_ref().ok_or_else(|| {
            DeliveryError::Configuration("EMAIL_HOST, EMAIL_USER and EMAIL_PASSWORD must be set".to_string())
        })?;

        let recipients = message.to.len();
        let email = build_message(message)?;
        transport
            .send(email)
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;

        debug!(recipients, "email delivered");
        Ok(())
    }

    fn is_configured(&self) -> bool {
        self.transport.is_some()
    }
}
