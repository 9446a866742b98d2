use std::path::PathBuf;

use anyhow::Context;

use crate::foundation::error::{ComposerError, ComposerResult};

/// Receives exported files.
#[async_trait::async_trait]
pub trait Downloader: Send + Sync {
    async fn download(&self, file_name: &str, bytes: &[u8]) -> ComposerResult<()>;
}

/// Writes downloads into a directory, creating it on demand.
#[derive(Clone, Debug)]
pub struct DirDownloader {
    dir: PathBuf,
}

impl DirDownloader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

/// Reject names that would escape the download directory.
fn check_file_name(name: &str) -> ComposerResult<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(ComposerError::validation(format!(
            "invalid download file name: {name:?}"
        )));
    }
    Ok(())
}

#[async_trait::async_trait]
impl Downloader for DirDownloader {
    async fn download(&self, file_name: &str, bytes: &[u8]) -> ComposerResult<()> {
        check_file_name(file_name)?;
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("create download dir {}", self.dir.display()))?;
        let path = self.dir.join(file_name);
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("write {}", path.display()))?;
        tracing::info!(path = %path.display(), bytes = bytes.len(), "downloaded");
        Ok(())
    }
}
