// crates/cifar-ten/src/archive.rs
// ============================================================================
// Module: CIFAR-Ten Archive Extraction
// Description: Gzip-compressed tar extraction with entry and size checks.
// Purpose: Unpack the release tarball without trusting its entry metadata.
// Dependencies: flate2, tar, thiserror
// ============================================================================

//! ## Overview
//! [`extract_tar_gz`] unpacks a `.tar.gz` archive into a destination root.
//! Invariants:
//! - Only regular files and directories are unpacked.
//! - Entry paths must be relative and free of `..` components.
//! - Total unpacked bytes never exceed [`ExtractLimits::max_total_bytes`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::fs::File;
use std::path::Component;
use std::path::Path;

use flate2::read::GzDecoder;
use tar::Archive;
use tar::EntryType;
use thiserror::Error;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Default cap on total unpacked bytes (1 GiB).
pub const DEFAULT_MAX_EXTRACT_BYTES: u64 = 1024 * 1024 * 1024;
/// Default cap on the number of archive entries.
pub const DEFAULT_MAX_ENTRIES: u64 = 4_096;

/// Extraction limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractLimits {
    /// Maximum total bytes across all unpacked files.
    pub max_total_bytes: u64,
    /// Maximum number of archive entries.
    pub max_entries: u64,
}

impl Default for ExtractLimits {
    fn default() -> Self {
        Self {
            max_total_bytes: DEFAULT_MAX_EXTRACT_BYTES,
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while extracting an archive.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// I/O or decompression failure.
    #[error("archive io error: {0}")]
    Io(String),
    /// Entry type other than file or directory.
    #[error("archive entry {path} has unsupported type")]
    UnsupportedEntry {
        /// Entry path as stored.
        path: String,
    },
    /// Entry path is absolute or escapes the destination.
    #[error("archive entry path is not a safe relative path: {0}")]
    UnsafePath(String),
    /// Archive exceeded a configured limit.
    #[error("archive exceeds limit: {0}")]
    LimitExceeded(String),
}

// ============================================================================
// SECTION: Extraction
// ============================================================================

/// Unpacks `archive` into `destination` and returns the number of entries.
///
/// # Errors
///
/// Returns [`ArchiveError`] when the archive is unreadable, contains unsafe
/// entries, or exceeds `limits`.
pub fn extract_tar_gz(
    archive: &Path,
    destination: &Path,
    limits: ExtractLimits,
) -> Result<u64, ArchiveError> {
    let file = File::open(archive).map_err(|err| ArchiveError::Io(err.to_string()))?;
    let mut tar = Archive::new(GzDecoder::new(file));
    fs::create_dir_all(destination).map_err(|err| ArchiveError::Io(err.to_string()))?;

    let mut total_bytes = 0u64;
    let mut entries = 0u64;
    for entry in tar.entries().map_err(|err| ArchiveError::Io(err.to_string()))? {
        let mut entry = entry.map_err(|err| ArchiveError::Io(err.to_string()))?;
        entries += 1;
        if entries > limits.max_entries {
            return Err(ArchiveError::LimitExceeded(format!(
                "more than {} entries",
                limits.max_entries
            )));
        }
        let path = entry.path().map_err(|err| ArchiveError::UnsafePath(err.to_string()))?;
        let path = path.into_owned();
        let entry_type = entry.header().entry_type();
        match entry_type {
            EntryType::Directory | EntryType::Regular => {}
            _ => {
                return Err(ArchiveError::UnsupportedEntry {
                    path: path.display().to_string(),
                });
            }
        }
        validate_relative_path(&path)?;
        total_bytes = total_bytes
            .checked_add(entry.size())
            .ok_or_else(|| ArchiveError::LimitExceeded("archive size overflow".to_string()))?;
        if total_bytes > limits.max_total_bytes {
            return Err(ArchiveError::LimitExceeded(format!(
                "more than {} unpacked bytes",
                limits.max_total_bytes
            )));
        }

        let dest_path = destination.join(&path);
        if entry_type == EntryType::Directory {
            fs::create_dir_all(&dest_path).map_err(|err| ArchiveError::Io(err.to_string()))?;
        } else {
            if let Some(parent) = dest_path.parent() {
                fs::create_dir_all(parent).map_err(|err| ArchiveError::Io(err.to_string()))?;
            }
            entry.unpack(&dest_path).map_err(|err| ArchiveError::Io(err.to_string()))?;
        }
    }
    Ok(entries)
}

/// Rejects absolute paths, prefixes, and parent components.
fn validate_relative_path(path: &Path) -> Result<(), ArchiveError> {
    if path.as_os_str().is_empty() {
        return Err(ArchiveError::UnsafePath("empty path".to_string()));
    }
    for component in path.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(ArchiveError::UnsafePath(path.display().to_string()));
            }
        }
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
