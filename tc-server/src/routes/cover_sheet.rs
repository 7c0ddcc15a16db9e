//! Cover-sheet rendering and the stand-alone notification email.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::header,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tc_core::TransactionFormData;
use tc_core::submission::cover_sheet_filename;
use tc_core::template::CoverSheetTemplate;
use tracing::{debug, info, warn};

use super::error::ApiResult;
use crate::app::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendEmailRequest {
    pub form_data: TransactionFormData,
}

#[derive(Debug, Serialize)]
pub struct SendEmailResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverSheetRequest {
    #[serde(default)]
    pub table_id: Option<String>,
    #[serde(default)]
    pub record_id: Option<String>,
    pub role: String,
    pub data: TransactionFormData,
    #[serde(default)]
    pub send_email: bool,
}

/// POST /api/send-transaction-email
pub async fn send_transaction_email(
    State(state): State<AppState>,
    payload: Result<Json<SendEmailRequest>, JsonRejection>,
) -> ApiResult<Json<SendEmailResponse>> {
    let Json(req) = payload?;

    state.orchestrator.email_cover_sheet(&req.form_data).await?;

    Ok(Json(SendEmailResponse {
        success: true,
        message: "Email sent".to_string(),
    }))
}

/// POST /api/generateCoverSheet
///
/// Returns the PDF. Attaching to `recordId` and emailing are best effort:
/// their failures are logged and the PDF is still returned.
pub async fn generate_cover_sheet(
    State(state): State<AppState>,
    payload: Result<Json<CoverSheetRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(req) = payload?;

    let template = CoverSheetTemplate::for_role(&req.role)?;
    if let Some(table) = &req.table_id {
        debug!(table, "table id supplied; records go to the configured store");
    }

    let orchestrator = &state.orchestrator;
    let pdf = orchestrator.render_cover_sheet(template, &req.data).await?;
    let filename = cover_sheet_filename(&req.data);

    if let Some(record_id) = &req.record_id {
        match orchestrator
            .repository()
            .attach_cover_sheet(record_id, &filename, &pdf)
            .await
        {
            Ok(attachment) => info!(record_id, url = %attachment.url, "cover sheet attached"),
            Err(e) => warn!(record_id, error = %e, "cover sheet not attached"),
        }
    }

    if req.send_email {
        if let Err(e) = orchestrator
            .send_notification(&req.data, req.record_id.as_deref(), pdf.clone())
            .await
        {
            warn!(error = %e, "cover sheet email not sent");
        }
    }

    let disposition = format!("attachment; filename=\"{filename}\"");
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        pdf,
    )
        .into_response())
}
