use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::app::AppState;

#[derive(Debug, Serialize)]
pub struct Check {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl Check {
    fn from_flag(
        ok: bool,
        missing: &str,
    ) -> Self {
        Self {
            ok,
            detail: (!ok).then(|| missing.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Checks {
    pub templates: Check,
    pub record_store: Check,
    pub pdf_renderer: Check,
    pub email: Check,
    pub auth_secret: Check,
}

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub checks: Checks,
}

/// GET|POST /api/health-check
///
/// 503 when templates or the record store are unusable. Email, PDF renderer
/// and auth secret are reported but do not fail the check.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthReport>) {
    let orchestrator = &state.orchestrator;

    let templates = Check::from_flag(
        orchestrator.templates().is_available().await,
        "cover-sheet templates missing",
    );
    let record_store = match orchestrator.repository().ping().await {
        Ok(()) => Check { ok: true, detail: None },
        Err(e) => Check {
            ok: false,
            detail: Some(e.to_string()),
        },
    };
    let pdf_renderer = Check::from_flag(
        orchestrator.renderer().is_available().await,
        "PDF renderer not available",
    );
    let email = Check::from_flag(
        orchestrator.mailer().is_configured() && !orchestrator.config().email_recipients.is_empty(),
        "email credentials or recipient missing",
    );
    let auth_secret = Check::from_flag(state.auth_secret_configured, "AUTH_SECRET not set");

    let healthy = templates.ok && record_store.ok;
    let status = if healthy { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };

    (
        status,
        Json(HealthReport {
            status: if healthy { "ok" } else { "degraded" },
            timestamp: Utc::now(),
            checks: Checks {
                templates,
                record_store,
                pdf_renderer,
                email,
                auth_secret,
            },
        }),
    )
}
