use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tc_core::submission::{PdfRenderer, RenderError};
use tokio::process::Command;
use tracing::debug;

/// Page setup prepended to every document so the output is Letter size
/// with fixed margins and printed backgrounds.
const PRINT_STYLE: &str = "<style>@page { size: Letter; margin: 0.5in; } \
html { -webkit-print-color-adjust: exact; print-color-adjust: exact; }</style>";

/// Renders HTML to PDF with a headless Chromium binary.
#[derive(Debug, Clone)]
pub struct ChromiumRenderer {
    binary: PathBuf,
    timeout: Duration,
}

impl ChromiumRenderer {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_timeout(
        mut self,
        timeout: Duration,
    ) -> Self {
        self.timeout = timeout;
        self
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

/// Insert the print style after `<head>` when present, else in front.
fn with_print_style(html: &str) -> String {
    match html.find("<head>") {
        Some(pos) => {
            let at = pos + "<head>".len();
            format!("{}{PRINT_STYLE}{}", &html[..at], &html[at..])
        }
        None => format!("{PRINT_STYLE}{html}"),
    }
}

#[async_trait]
impl PdfRenderer for ChromiumRenderer {
    async fn render_pdf(
        &self,
        html: &str,
    ) -> Result<Vec<u8>, RenderError> {
        let workdir = tempfile::tempdir()
            .map_err(|e| RenderError::Failed(format!("cannot create work dir: {e}")))?;
        let input = workdir.path().join("cover.html");
        let output = workdir.path().join("cover.pdf");

        tokio::fs::write(&input, with_print_style(html))
            .await
            .map_err(|e| RenderError::Failed(format!("cannot write html: {e}")))?;

        let mut cmd = self.command();
        cmd.arg("--headless")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--no-pdf-header-footer")
            .arg(format!("--print-to-pdf={}", output.display()))
            .arg(format!("file://{}", input.display()));

        let child = cmd.spawn().map_err(|e| {
            RenderError::Unavailable(format!("cannot start {}: {e}", self.binary.display()))
        })?;
        let result = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| RenderError::Failed(format!("timed out after {:?}", self.timeout)))?
            .map_err(|e| RenderError::Failed(e.to_string()))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(RenderError::Failed(format!(
                "{} exited with {}: {}",
                self.binary.display(),
                result.status,
                stderr.trim()
            )));
        }

        let pdf = tokio::fs::read(&output)
            .await
            .map_err(|e| RenderError::Failed(format!("no PDF produced: {e}")))?;
        debug!(bytes = pdf.len(), "chromium rendered pdf");
        Ok(pdf)
    }

    async fn is_available(&self) -> bool {
        let mut cmd = self.command();
        cmd.arg("--version");
        matches!(
            tokio::time::timeout(Duration::from_secs(5), cmd.status()).await,
            Ok(Ok(status)) if status.success()
        )
    }
}
