// crates/cifar-ten/src/source/mod.rs
// ============================================================================
// Module: CIFAR-Ten Archive Sources
// Description: Source trait, scheme routing, and staged archive downloads.
// Purpose: Fetch the release archive from HTTP(S) or local mirrors safely.
// Dependencies: reqwest, sha2, thiserror, url
// ============================================================================

//! ## Overview
//! An [`ArchiveSource`] opens a byte stream for a URL. [`ArchiveSources`]
//! routes URLs to sources by scheme, and [`download_to_file`] streams the
//! bytes into a staging file before renaming it into place.
//! Invariants:
//! - Downloads never exceed the configured byte cap.
//! - The final archive path only ever holds a complete, verified file.
//! - Unknown URL schemes fail closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::fs::File;
use std::io::BufWriter;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use sha2::Digest;
use sha2::Sha256;
use thiserror::Error;
use url::Url;

use crate::report::ReportEvent;
use crate::report::Reporter;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Default cap on downloaded archive size (512 MiB).
pub const DEFAULT_MAX_DOWNLOAD_BYTES: u64 = 512 * 1024 * 1024;
/// Size of the official binary archive, used when the server omits a length.
pub const EXPECTED_ARCHIVE_BYTES: u64 = 170_052_171;
/// Bytes between progress events.
pub const PROGRESS_STEP_BYTES: u64 = 8 * 1024 * 1024;
/// Read buffer size for streaming copies.
const COPY_BUFFER_BYTES: usize = 64 * 1024;
/// Suffix appended to the archive name while a download is in flight.
const STAGING_SUFFIX: &str = ".part";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised by archive sources and downloads.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum SourceError {
    /// URL failed to parse or lacks required parts.
    #[error("invalid uri: {0}")]
    InvalidUri(String),
    /// No source is registered for the URL scheme.
    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),
    /// Request blocked by the download policy.
    #[error("download policy violation: {0}")]
    Policy(String),
    /// HTTP transport or status failure.
    #[error("http error: {0}")]
    Http(String),
    /// Local source file is missing.
    #[error("source not found: {0}")]
    NotFound(String),
    /// I/O failure while reading or writing.
    #[error("source io error: {0}")]
    Io(String),
    /// Payload exceeded the byte cap.
    #[error("download exceeds size limit ({actual_bytes} > {max_bytes} bytes)")]
    TooLarge {
        /// Configured cap.
        max_bytes: u64,
        /// Observed or declared size.
        actual_bytes: u64,
    },
    /// SHA-256 digest did not match the expected value.
    #[error("archive digest mismatch (expected {expected}, got {actual})")]
    DigestMismatch {
        /// Expected lowercase hex digest.
        expected: String,
        /// Computed lowercase hex digest.
        actual: String,
    },
}

// ============================================================================
// SECTION: Source Trait
// ============================================================================

/// Open byte stream returned by a source.
pub struct SourceStream {
    /// Payload reader.
    pub reader: Box<dyn Read + Send>,
    /// Declared payload length when known.
    pub content_length: Option<u64>,
}

/// Opens archive byte streams for URLs of one or more schemes.
pub trait ArchiveSource: Send + Sync {
    /// Opens a stream for the URL.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] when the URL is rejected or cannot be opened.
    fn open(&self, url: &Url) -> Result<SourceStream, SourceError>;
}

// ============================================================================
// SECTION: Scheme Routing
// ============================================================================

/// Source registry keyed by URL scheme.
///
/// # Invariants
/// - Later registrations for a scheme replace earlier ones.
#[derive(Clone, Default)]
pub struct ArchiveSources {
    /// Sources keyed by lowercase scheme.
    sources: BTreeMap<String, Arc<dyn ArchiveSource>>,
}

impl ArchiveSources {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with HTTP(S) under `policy` and unrestricted `file` URLs.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] when the HTTP client cannot be constructed.
    pub fn with_defaults(policy: DownloadPolicy) -> Result<Self, SourceError> {
        let http = HttpArchiveSource::with_policy(policy)?;
        Ok(Self::new()
            .register("http", http.clone())
            .register("https", http)
            .register("file", FileArchiveSource::unrestricted()))
    }

    /// Registers a source for a scheme.
    #[must_use]
    pub fn register(mut self, scheme: &str, source: impl ArchiveSource + 'static) -> Self {
        self.sources.insert(scheme.to_ascii_lowercase(), Arc::new(source));
        self
    }

    /// Parses the URI and opens it with the matching source.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] when parsing fails, no source matches, or the
    /// source rejects the URL.
    pub fn open(&self, uri: &str) -> Result<(Url, SourceStream), SourceError> {
        let url = Url::parse(uri).map_err(|err| SourceError::InvalidUri(err.to_string()))?;
        let source = self
            .sources
            .get(url.scheme())
            .ok_or_else(|| SourceError::UnsupportedScheme(url.scheme().to_string()))?;
        let stream = source.open(&url)?;
        Ok((url, stream))
    }
}

// ============================================================================
// SECTION: Downloads
// ============================================================================

/// Parameters for a single archive download.
#[derive(Debug, Clone, Copy)]
pub struct DownloadRequest<'a> {
    /// Source URL.
    pub url: &'a str,
    /// Final archive path.
    pub destination: &'a Path,
    /// Byte cap for the payload.
    pub max_bytes: u64,
    /// Optional lowercase hex SHA-256 of the archive.
    pub expected_sha256: Option<&'a str>,
}

/// Streams the URL into `request.destination` and returns the bytes written.
///
/// # Errors
///
/// Returns [`SourceError`] when the source fails, the cap is exceeded, the
/// digest mismatches, or the file cannot be written. The staging file is
/// removed on failure.
pub fn download_to_file(
    sources: &ArchiveSources,
    request: &DownloadRequest<'_>,
    reporter: &dyn Reporter,
) -> Result<u64, SourceError> {
    let (url, stream) = sources.open(request.url)?;
    if let Some(length) = stream.content_length {
        if length > request.max_bytes {
            return Err(SourceError::TooLarge {
                max_bytes: request.max_bytes,
                actual_bytes: length,
            });
        }
    }
    reporter.report(&ReportEvent::DownloadStarted {
        url: url.to_string(),
        destination: request.destination.to_path_buf(),
    });

    let staging = staging_path(request.destination);
    match stream_to_path(stream, &staging, request, reporter) {
        Ok(bytes) => {
            fs::rename(&staging, request.destination)
                .map_err(|err| SourceError::Io(err.to_string()))?;
            reporter.report(&ReportEvent::DownloadFinished {
                path: request.destination.to_path_buf(),
                bytes,
            });
            Ok(bytes)
        }
        Err(err) => {
            let _ = fs::remove_file(&staging);
            Err(err)
        }
    }
}

/// Returns the staging path used while a download is in flight.
#[must_use]
pub fn staging_path(destination: &Path) -> PathBuf {
    let mut name = destination.as_os_str().to_os_string();
    name.push(STAGING_SUFFIX);
    PathBuf::from(name)
}

/// Copies the stream into `path`, enforcing the cap and digest.
fn stream_to_path(
    stream: SourceStream,
    path: &Path,
    request: &DownloadRequest<'_>,
    reporter: &dyn Reporter,
) -> Result<u64, SourceError> {
    let expected_bytes = stream.content_length.or(Some(EXPECTED_ARCHIVE_BYTES));
    let file = File::create(path).map_err(|err| SourceError::Io(err.to_string()))?;
    let mut writer = BufWriter::new(file);
    let mut reader = stream.reader;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; COPY_BUFFER_BYTES];
    let mut total: u64 = 0;
    let mut next_progress = PROGRESS_STEP_BYTES;

    loop {
        let read = reader.read(&mut buffer).map_err(|err| SourceError::Io(err.to_string()))?;
        if read == 0 {
            break;
        }
        total = total.saturating_add(read as u64);
        if total > request.max_bytes {
            return Err(SourceError::TooLarge {
                max_bytes: request.max_bytes,
                actual_bytes: total,
            });
        }
        let chunk = &buffer[..read];
        hasher.update(chunk);
        writer.write_all(chunk).map_err(|err| SourceError::Io(err.to_string()))?;
        if total >= next_progress {
            reporter.report(&ReportEvent::DownloadProgress {
                bytes: total,
                expected_bytes,
            });
            next_progress = next_progress.saturating_add(PROGRESS_STEP_BYTES);
        }
    }
    writer.flush().map_err(|err| SourceError::Io(err.to_string()))?;

    if let Some(expected) = request.expected_sha256 {
        let actual = hex_digest(&hasher.finalize());
        if !actual.eq_ignore_ascii_case(expected.trim()) {
            return Err(SourceError::DigestMismatch {
                expected: expected.trim().to_ascii_lowercase(),
                actual,
            });
        }
    }
    Ok(total)
}

/// Formats digest bytes as lowercase hex.
fn hex_digest(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

/// Computes the lowercase hex SHA-256 of a file.
///
/// # Errors
///
/// Returns [`SourceError::Io`] when the file cannot be read.
pub fn sha256_file(path: &Path) -> Result<String, SourceError> {
    let mut file = File::open(path).map_err(|err| SourceError::Io(err.to_string()))?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; COPY_BUFFER_BYTES];
    loop {
        let read = file.read(&mut buffer).map_err(|err| SourceError::Io(err.to_string()))?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(hex_digest(&hasher.finalize()))
}

// ============================================================================
// SECTION: Implementations
// ============================================================================

pub mod file;
pub mod http;

pub use file::FileArchiveSource;
pub use http::DownloadPolicy;
pub use http::HttpArchiveSource;
