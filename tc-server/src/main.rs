use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{info, warn};

use tc_core::submission::{EmailSender, SubmissionConfig, SubmissionOrchestrator};
use tc_core::template::DirTemplateSource;
use tc_server::app::{self, AppState};
use tc_server::config::{ServerConfig, templates_dir};
use tc_server::email::SmtpMailer;
use tc_server::logging::init_logging;
use tc_server::pdf::ChromiumRenderer;

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Transaction coordination service.
///
/// Validates transaction forms, stores them, renders the cover sheet and
/// emails it to the coordination team. Credentials come from the
/// environment (a `.env` file is read when present).
#[derive(Debug, Parser)]
#[command(version)]
struct Cli {
    /// Address to listen on.
    #[arg(long, env = "TC_BIND", default_value = "127.0.0.1:3000")]
    bind: String,

    /// Record store backend: `sqlite` or `hosted`.
    #[arg(long, env = "TC_BACKEND", default_value = "sqlite")]
    backend: String,

    /// Connection string. A file path or `:memory:` for SQLite, the base url
    /// for the hosted store.
    #[arg(long, env = "TC_DATABASE")]
    db: Option<String>,

    /// Directory holding Seller.html, Buyer.html and DualAgent.html.
    #[arg(long, env = "TC_TEMPLATES_DIR")]
    templates: Option<PathBuf>,

    /// Chromium (or Chrome) binary used to print PDFs.
    #[arg(long, env = "CHROMIUM_PATH", default_value = "chromium")]
    chromium: PathBuf,

    /// Append log output to this file.
    #[arg(long, env = "TC_LOG_FILE")]
    log_file: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `info,tc_core=trace`. Defaults to RUST_LOG.
    #[arg(long, env = "TC_LOG_LEVEL")]
    log_level: Option<String>,
}

// ─── entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is normal in production.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref(), cli.log_file.as_deref())?;

    let config = ServerConfig::from_env()?;
    let db_config = config.db_config(&cli.backend, cli.db.as_deref())?;

    info!(backend = %db_config.backend, "opening record store");
    let repository = app::build_registry()
        .create(&db_config)
        .await
        .with_context(|| format!("failed to open '{}' record store", db_config.backend))?;

    let templates = templates_dir(cli.templates.as_deref());
    info!(dir = %templates.display(), "cover-sheet templates");

    let mailer = SmtpMailer::new(&config.email);
    if !mailer.is_configured() {
        warn!("email is not configured; submissions will be saved without notification");
    }

    let orchestrator = SubmissionOrchestrator::new(
        Arc::from(repository),
        Arc::new(DirTemplateSource::new(templates)),
        Arc::new(ChromiumRenderer::new(cli.chromium)),
        Arc::new(mailer),
        SubmissionConfig {
            email_from: config.email.from.clone(),
            email_recipients: config.email.recipients.clone(),
            ..SubmissionConfig::default()
        },
    );
    let state = AppState::new(orchestrator, config.auth_secret.is_some());

    let listener = TcpListener::bind(&cli.bind)
        .await
        .with_context(|| format!("failed to bind to {}", cli.bind))?;
    info!("listening on {}", cli.bind);

    axum::serve(listener, app::router(state))
        .await
        .context("server error")?;
    Ok(())
}
