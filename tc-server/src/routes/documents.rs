use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::header,
    response::{IntoResponse, Response},
};
use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::error::{ApiError, ApiResult};
use crate::app::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    pub pdf_base64: String,
    pub file_name: String,
    #[serde(default)]
    pub record_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub url: String,
    pub file_name: String,
}

/// Decode a base64 PDF, with or without a `data:` url prefix.
pub fn decode_pdf(encoded: &str) -> Result<Vec<u8>, ApiError> {
    let payload = match encoded.split_once(";base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => encoded,
    };
    let compact: String = payload.split_whitespace().collect();
    if compact.is_empty() {
        return Err(ApiError::BadRequest("pdfBase64 is empty".to_string()));
    }
    STANDARD
        .decode(compact)
        .map_err(|e| ApiError::BadRequest(format!("pdfBase64 is not valid base64: {e}")))
}

/// POST /api/supabase-pdf-upload
pub async fn upload_pdf(
    State(state): State<AppState>,
    payload: Result<Json<UploadRequest>, JsonRejection>,
) -> ApiResult<Json<UploadResponse>> {
    let Json(req) = payload?;
    if req.file_name.trim().is_empty() {
        return Err(ApiError::BadRequest("fileName is required".to_string()));
    }
    let pdf = decode_pdf(&req.pdf_base64)?;

    let repository = state.orchestrator.repository();
    let attachment = match &req.record_id {
        Some(record_id) => {
            repository
                .attach_cover_sheet(record_id, &req.file_name, &pdf)
                .await?
        }
        None => repository.store_document(&req.file_name, &pdf).await?,
    };
    info!(
        record_id = req.record_id.as_deref().unwrap_or("-"),
        url = %attachment.url,
        "pdf uploaded"
    );

    Ok(Json(UploadResponse {
        success: true,
        url: attachment.url,
        file_name: attachment.filename,
    }))
}

/// GET /api/documents/:id
pub async fn get_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let document = state.orchestrator.repository().fetch_document(&id).await?;

    let disposition = format!("inline; filename=\"{}\"", document.filename);
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        document.bytes,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn decodes_plain_and_data_url_payloads() {
        assert_eq!(decode_pdf("JVBERi0=").unwrap(), b"%PDF-".to_vec());
        assert_eq!(
            decode_pdf("data:application/pdf;base64,JVBE\nRi0=").unwrap(),
            b"%PDF-".to_vec()
        );
    }

    #[test]
    fn rejects_empty_and_garbage() {
        assert!(matches!(decode_pdf(""), Err(ApiError::BadRequest(_))));
        assert!(matches!(decode_pdf("@@@"), Err(ApiError::BadRequest(_))));
    }
}
