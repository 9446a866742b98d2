use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::assets::decode::decode_data_uri;
use crate::foundation::error::{ComposerError, ComposerResult};

/// Fetches the encoded bytes behind an image layer's `source`.
#[async_trait::async_trait]
pub trait ImageLoader: Send + Sync {
    async fn load(&self, source: &str) -> ComposerResult<Vec<u8>>;
}

/// Resolves `data:` URIs inline and relative paths under an optional assets root.
#[derive(Clone, Debug, Default)]
pub struct SourceLoader {
    root: Option<PathBuf>,
}

impl SourceLoader {
    /// Loader that only accepts `data:` URIs.
    pub fn data_uris_only() -> Self {
        Self { root: None }
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }
}

#[async_trait::async_trait]
impl ImageLoader for SourceLoader {
    async fn load(&self, source: &str) -> ComposerResult<Vec<u8>> {
        if source.starts_with("data:") {
            return decode_data_uri(source).map(|(_, bytes)| bytes);
        }
        if source.contains("://") {
            return Err(ComposerError::validation(format!(
                "unsupported image source scheme: {source}"
            )));
        }
        let root = self.root.as_deref().ok_or_else(|| {
            ComposerError::validation("file image sources need an assets root")
        })?;
        let rel = normalize_rel_path(source)?;
        let path = root.join(&rel);
        let bytes = tokio::fs::read(&path)
            .await
            .with_context(|| format!("read image {}", path.display()))?;
        Ok(bytes)
    }
}

/// Normalize a relative asset path to `/` separators, rejecting absolute paths and `..`.
pub(crate) fn normalize_rel_path(source: &str) -> ComposerResult<String> {
    let s = source.replace('\\', "/");
    if s.starts_with('/') {
        return Err(ComposerError::validation("asset paths must be relative"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(ComposerError::validation("asset paths must not contain '..'"));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(ComposerError::validation("asset path must contain a file name"));
    }
    Ok(out.join("/"))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/loader.rs"]
mod tests;
