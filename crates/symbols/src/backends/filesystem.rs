//! Local filesystem symbol store.

use crate::error::{SourceError, SourceResult};
use crate::source::SymbolSource;
use async_trait::async_trait;
use quarry_core::SymbolRef;
use std::path::{Path, PathBuf};
use tokio::fs;

/// A symbol store on local disk.
///
/// Existence is checked against `<root>/<symbol>/<debugid>/<filename>`.
/// The redirect URL is built from `public_base_url`, under which a separate
/// static file server exposes the same tree.
pub struct FilesystemSource {
    name: String,
    root: PathBuf,
    public_base_url: String,
}

impl FilesystemSource {
    /// Create a new filesystem source.
    pub fn new(root: impl AsRef<Path>, public_base_url: impl Into<String>) -> Self {
        let root = root.as_ref().to_path_buf();
        let mut public_base_url = public_base_url.into();
        if !public_base_url.ends_with('/') {
            public_base_url.push('/');
        }
        Self {
            name: format!("file:{}", root.display()),
            root,
            public_base_url,
        }
    }

    /// On-disk path of the artifact, with path traversal protection.
    ///
    /// Reference fields come percent-decoded off the request path and may
    /// contain separators or dot segments.
    fn artifact_path(&self, reference: &SymbolRef) -> SourceResult<PathBuf> {
        let mut path = self.root.clone();
        for segment in [
            reference.symbol.as_str(),
            reference.debugid.as_str(),
            reference.filename.as_str(),
        ] {
            if segment.is_empty()
                || segment == "."
                || segment == ".."
                || segment.contains('/')
                || segment.contains('\\')
            {
                return Err(SourceError::InvalidPath(format!(
                    "unsafe path segment in {reference}"
                )));
            }
            path.push(segment);
        }
        Ok(path)
    }
}

#[async_trait]
impl SymbolSource for FilesystemSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn find(&self, reference: &SymbolRef) -> SourceResult<Option<String>> {
        let path = self.artifact_path(reference)?;
        match fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(Some(format!(
                "{}{}",
                self.public_base_url,
                reference.relative_path()
            ))),
            // A directory at the artifact path is not an artifact
            Ok(_) => Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn health_check(&self) -> SourceResult<()> {
        let meta = fs::metadata(&self.root).await?;
        if meta.is_dir() {
            Ok(())
        } else {
            Err(SourceError::Config(format!(
                "store root {} is not a directory",
                self.root.display()
            )))
        }
    }
}
