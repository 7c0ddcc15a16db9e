//! The submit pipeline: validate, store the record, render and attach the
//! cover sheet, send the notification email.

mod collaborators;
mod orchestrator;
mod outcome;
mod retry;

pub use collaborators::{
    DeliveryError, EmailMessage, EmailSender, PdfAttachment, PdfRenderer, RenderError,
};
pub use orchestrator::{
    SubmissionConfig, SubmissionError, SubmissionOrchestrator, cover_sheet_filename,
};
pub use outcome::{Stage, StageStatus, SubmissionOutcome, SubmissionStatus, SubmissionStep};
pub use retry::retry_fixed;
