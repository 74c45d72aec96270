// crates/cifar-ten/src/source/file.rs
// ============================================================================
// Module: CIFAR-Ten File Source
// Description: File-backed archive source for local mirrors.
// Purpose: Open `file://` archive URLs, optionally confined to a root.
// Dependencies: std, url
// ============================================================================

//! ## Overview
//! [`FileArchiveSource`] resolves `file://` URLs into local file streams. A
//! root directory can be configured to fail closed on path traversal.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::fs::File;
use std::io::ErrorKind;
use std::path::PathBuf;

use url::Url;

use crate::source::ArchiveSource;
use crate::source::SourceError;
use crate::source::SourceStream;

// ============================================================================
// SECTION: File Source
// ============================================================================

/// File-backed archive source.
#[derive(Debug, Clone)]
pub struct FileArchiveSource {
    /// Optional root directory for path traversal protection.
    root: Option<PathBuf>,
}

impl FileArchiveSource {
    /// Creates a file source rooted at the provided directory.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    /// Creates a file source with no root restrictions.
    #[must_use]
    pub const fn unrestricted() -> Self {
        Self {
            root: None,
        }
    }

    /// Resolves a file URL into a local path.
    fn resolve_path(&self, url: &Url) -> Result<PathBuf, SourceError> {
        if url.scheme() != "file" {
            return Err(SourceError::UnsupportedScheme(url.scheme().to_string()));
        }
        let path = url
            .to_file_path()
            .map_err(|()| SourceError::InvalidUri("failed to map file url to path".to_string()))?;

        if let Some(root) = &self.root {
            let root = fs::canonicalize(root).map_err(|err| SourceError::Io(err.to_string()))?;
            let resolved = fs::canonicalize(&path).map_err(|err| map_open_error(&err))?;
            if !resolved.starts_with(&root) {
                return Err(SourceError::Policy("file path escapes configured root".to_string()));
            }
            return Ok(resolved);
        }
        Ok(path)
    }
}

impl ArchiveSource for FileArchiveSource {
    fn open(&self, url: &Url) -> Result<SourceStream, SourceError> {
        let path = self.resolve_path(url)?;
        let file = File::open(&path).map_err(|err| map_open_error(&err))?;
        let content_length = file.metadata().ok().map(|meta| meta.len());
        Ok(SourceStream {
            reader: Box::new(file),
            content_length,
        })
    }
}

/// Maps file open failures onto source errors.
fn map_open_error(err: &std::io::Error) -> SourceError {
    if err.kind() == ErrorKind::NotFound {
        SourceError::NotFound(err.to_string())
    } else {
        SourceError::Io(err.to_string())
    }
}
