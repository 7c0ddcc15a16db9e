//! Form validation, submission and stored-transaction endpoints.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tc_core::submission::{SubmissionOutcome, SubmissionStatus, SubmissionStep};
use tc_core::{FieldErrors, FormStep, TransactionFormData, TransactionRecord, validate_all, validate_step};
use tracing::{debug, info};

use super::error::{ApiError, ApiResult};
use crate::app::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateRequest {
    #[serde(default)]
    pub step: Option<u8>,
    pub form_data: TransactionFormData,
}

#[derive(Debug, Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
    pub errors: FieldErrors,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryEmailRequest {
    /// Form to render; the stored copy is used when omitted.
    #[serde(default)]
    pub form_data: Option<TransactionFormData>,
}

/// POST /api/transactions/validate
pub async fn validate(payload: Result<Json<ValidateRequest>, JsonRejection>) -> ApiResult<Json<ValidateResponse>> {
    let Json(req) = payload?;

    let errors = match req.step {
        Some(step) => {
            if FormStep::from_number(step).is_none() {
                return Err(ApiError::BadRequest(format!("Unknown form step {step}")));
            }
            validate_step(step, &req.form_data)
        }
        None => validate_all(&req.form_data),
    };
    debug!(step = ?req.step, errors = errors.len(), "form validated");

    Ok(Json(ValidateResponse {
        valid: errors.is_empty(),
        errors,
    }))
}

fn outcome_status(outcome: &SubmissionOutcome) -> StatusCode {
    match outcome.status {
        SubmissionStatus::Complete | SubmissionStatus::Saved => StatusCode::OK,
        SubmissionStatus::Invalid => StatusCode::UNPROCESSABLE_ENTITY,
        SubmissionStatus::Failed => StatusCode::BAD_GATEWAY,
    }
}

/// POST /api/transactions
pub async fn submit(
    State(state): State<AppState>,
    payload: Result<Json<TransactionFormData>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SubmissionOutcome>)> {
    let Json(form) = payload?;

    let outcome = state.orchestrator.submit(&form).await;
    info!(
        status = ?outcome.status,
        transaction_id = outcome.transaction_id.as_deref().unwrap_or("-"),
        "submission finished"
    );

    Ok((outcome_status(&outcome), Json(outcome)))
}

/// GET /api/transactions/:id
pub async fn get_transaction(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<TransactionRecord>> {
    let record = state.orchestrator.repository().get_transaction(&id).await?;
    Ok(Json(record))
}

/// POST /api/transactions/:id/retry-email
pub async fn retry_email(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<RetryEmailRequest>, JsonRejection>,
) -> ApiResult<Json<SubmissionStep>> {
    let Json(req) = payload?;

    let form = match req.form_data {
        Some(form) => form,
        None => state.orchestrator.repository().get_transaction(&id).await?.form,
    };
    let step = state.orchestrator.retry_email(&id, &form).await?;

    info!(transaction_id = %id, status = ?step.status, "email retried");
    Ok(Json(step))
}
