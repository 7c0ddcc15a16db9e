use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tc_core::db::RepositoryRegistry;
use tc_core::submission::SubmissionOrchestrator;
use tc_db_hosted::HostedRepositoryFactory;
use tc_db_sqlite::SqliteRepositoryFactory;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::routes;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<SubmissionOrchestrator>,
    pub auth_secret_configured: bool,
}

impl AppState {
    pub fn new(
        orchestrator: SubmissionOrchestrator,
        auth_secret_configured: bool,
    ) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            auth_secret_configured,
        }
    }
}

/// Every backend this binary can talk to.
pub fn build_registry() -> RepositoryRegistry {
    let mut registry = RepositoryRegistry::new();
    registry.register(Box::new(SqliteRepositoryFactory));
    registry.register(Box::new(HostedRepositoryFactory));
    registry
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/transactions", post(routes::transactions::submit))
        .route("/api/transactions/validate", post(routes::transactions::validate))
        .route("/api/transactions/:id", get(routes::transactions::get_transaction))
        .route(
            "/api/transactions/:id/retry-email",
            post(routes::transactions::retry_email),
        )
        .route(
            "/api/send-transaction-email",
            post(routes::cover_sheet::send_transaction_email),
        )
        .route(
            "/api/generateCoverSheet",
            post(routes::cover_sheet::generate_cover_sheet),
        )
        .route(
            "/api/supabase-pdf-upload",
            post(routes::documents::upload_pdf),
        )
        .route("/api/documents/:id", get(routes::documents::get_document))
        .route(
            "/api/health-check",
            get(routes::health::health_check).post(routes::health::health_check),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn registry_knows_both_backends() {
        let registry = build_registry();

        let mut backends = registry.available_backends();
        backends.sort_unstable();
        assert_eq!(backends, vec!["hosted", "sqlite"]);
    }
}
