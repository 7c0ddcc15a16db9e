use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::{CoverSheetTemplate, TemplateError};

/// Where cover-sheet HTML comes from.
#[async_trait]
pub trait TemplateSource: Send + Sync {
    async fn load(
        &self,
        template: CoverSheetTemplate,
    ) -> Result<String, TemplateError>;

    /// Whether every template can currently be loaded.
    async fn is_available(&self) -> bool {
        for template in CoverSheetTemplate::ALL {
            if self.load(template).await.is_err() {
                return false;
            }
        }
        true
    }
}

/// Templates stored as `<Name>.html` files in one directory.
#[derive(Debug, Clone)]
pub struct DirTemplateSource {
    dir: PathBuf,
}

impl DirTemplateSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl TemplateSource for DirTemplateSource {
    async fn load(
        &self,
        template: CoverSheetTemplate,
    ) -> Result<String, TemplateError> {
        let path = self.dir.join(template.file_name());
        tokio::fs::read_to_string(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => TemplateError::NotFound {
                name: template.file_name(),
                dir: self.dir.display().to_string(),
            },
            _ => TemplateError::Io {
                name: template.file_name(),
                reason: e.to_string(),
            },
        })
    }
}
