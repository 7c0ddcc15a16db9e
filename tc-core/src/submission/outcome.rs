use serde::{Deserialize, Serialize};

use crate::validation::FieldErrors;

/// The ordered stages of a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    CreateRecord,
    RenderPdf,
    AttachPdf,
    SendEmail,
}

impl Stage {
    pub const ALL: [Stage; 4] = [
        Self::CreateRecord,
        Self::RenderPdf,
        Self::AttachPdf,
        Self::SendEmail,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Self::CreateRecord => "create-record",
            Self::RenderPdf => "render-pdf",
            Self::AttachPdf => "attach-pdf",
            Self::SendEmail => "send-email",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::CreateRecord => "Saving transaction",
            Self::RenderPdf => "Generating cover sheet",
            Self::AttachPdf => "Attaching cover sheet",
            Self::SendEmail => "Sending notification email",
        }
    }

    /// A failed required stage ends the submission; optional stages only
    /// mark themselves as errored.
    pub fn is_required(&self) -> bool {
        matches!(self, Self::CreateRecord | Self::RenderPdf)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    Pending,
    Loading,
    Complete,
    Error,
}

/// One row of the progress trace shown while a submission runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionStep {
    pub id: String,
    pub label: String,
    pub status: StageStatus,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub message: Option<String>,
}

impl SubmissionStep {
    pub fn pending(stage: Stage) -> Self {
        Self {
            id: stage.id().to_string(),
            label: stage.label().to_string(),
            status: StageStatus::Pending,
            message: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    /// Every stage finished.
    Complete,
    /// The record exists but a later optional stage failed.
    Saved,
    /// Validation failed; nothing was sent anywhere.
    Invalid,
    /// A required stage failed.
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionOutcome {
    pub success: bool,
    pub status: SubmissionStatus,
    pub transaction_id: Option<String>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub errors: Option<FieldErrors>,
    pub steps: Vec<SubmissionStep>,
    pub email_sent: bool,
}

impl SubmissionOutcome {
    pub fn complete(
        transaction_id: String,
        steps: Vec<SubmissionStep>,
    ) -> Self {
        Self {
            success: true,
            status: SubmissionStatus::Complete,
            transaction_id: Some(transaction_id),
            message: "Transaction submitted successfully".to_string(),
            errors: None,
            steps,
            email_sent: true,
        }
    }

    pub fn saved(
        transaction_id: String,
        steps: Vec<SubmissionStep>,
        email_sent: bool,
        reason: &str,
    ) -> Self {
        Self {
            success: true,
            status: SubmissionStatus::Saved,
            transaction_id: Some(transaction_id),
            message: format!("Your transaction was saved, but {reason}"),
            errors: None,
            steps,
            email_sent,
        }
    }

    pub fn invalid(errors: FieldErrors) -> Self {
        Self {
            success: false,
            status: SubmissionStatus::Invalid,
            transaction_id: None,
            message: "Please fix the highlighted fields before submitting".to_string(),
            errors: Some(errors),
            steps: Vec::new(),
            email_sent: false,
        }
    }

    pub fn failed(
        transaction_id: Option<String>,
        steps: Vec<SubmissionStep>,
        stage: Stage,
        reason: &str,
    ) -> Self {
        Self {
            success: false,
            status: SubmissionStatus::Failed,
            transaction_id,
            message: format!("{} failed: {reason}", stage.label()),
            errors: None,
            steps,
            email_sent: false,
        }
    }

    pub fn step(
        &self,
        stage: Stage,
    ) -> Option<&SubmissionStep> {
        self.steps.iter().find(|s| s.id == stage.id())
    }
}
