// crates/cifar-ten/src/dataset.rs
// ============================================================================
// Module: CIFAR-Ten Dataset Builder
// Description: Builder that locates, fetches, reads, and decodes CIFAR-10.
// Purpose: Provide the one-call entry point for loading both splits.
// Dependencies: thiserror, std
// ============================================================================

//! ## Overview
//! [`Cifar10`] describes where the binary batches live and how they should be
//! decoded. [`Cifar10::build`] returns `u8` batches; [`Cifar10::build_as_flat_f32`]
//! returns flattened `f32` rows. When `download_and_extract` is set, the
//! release archive is fetched and unpacked first ([`Cifar10::fetch`]).
//! Invariants:
//! - Batch paths resolve to `base_path / cifar_data_path / bin`.
//! - Batch files are read in configured order and concatenated.
//! - An existing archive skips the download; an existing data directory skips
//!   extraction.
//! - Extraction runs in [`EXTRACT_STAGING_DIR`]; the data directory only
//!   appears once every entry has been unpacked.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::fs;
use std::fs::File;
use std::io::ErrorKind;
use std::io::Read;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::archive::ArchiveError;
use crate::archive::ExtractLimits;
use crate::archive::extract_tar_gz;
use crate::layout::IMAGE_BYTES;
use crate::layout::SplitKind;
use crate::layout::TEST_BATCH_FILES;
use crate::layout::TEST_RECORDS;
use crate::layout::TRAIN_BATCH_FILES;
use crate::layout::TRAIN_RECORDS;
use crate::parse::ImageBatch;
use crate::parse::LabelBatch;
use crate::parse::LabelEncoding;
use crate::parse::ParseError;
use crate::parse::decode_records;
use crate::parse::flatten_images;
use crate::parse::flatten_labels;
use crate::preview::PreviewError;
use crate::preview::random_index;
use crate::preview::write_ppm;
use crate::report::NullReporter;
use crate::report::ReportEvent;
use crate::report::Reporter;
use crate::source::ArchiveSources;
use crate::source::DEFAULT_MAX_DOWNLOAD_BYTES;
use crate::source::DownloadPolicy;
use crate::source::DownloadRequest;
use crate::source::SourceError;
use crate::source::download_to_file;

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Official download location of the binary release.
pub const DEFAULT_DOWNLOAD_URL: &str = "https://www.cs.toronto.edu/~kriz/cifar-10-binary.tar.gz";
/// Archive filename stored under the base path.
pub const DEFAULT_ARCHIVE_NAME: &str = "cifar-10-binary.tar.gz";
/// Default base directory.
pub const DEFAULT_BASE_PATH: &str = "data/";
/// Directory the archive unpacks its batches into.
pub const DEFAULT_DATA_DIR: &str = "cifar-10-batches-bin/";
/// Maximum size of a single batch file (256 MiB).
pub const MAX_BATCH_FILE_BYTES: u64 = 256 * 1024 * 1024;
/// Default upscale factor for sample previews.
pub const PREVIEW_SCALE: usize = 8;
/// Directory under the base path that receives archive entries before the
/// data directory is moved into place.
pub const EXTRACT_STAGING_DIR: &str = ".cifar-ten-extract.part";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors returned while building the data set.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum CifarError {
    /// Batch file does not exist.
    #[error("batch file not found: {0}")]
    NotFound(String),
    /// I/O failure outside the fetch step.
    #[error("io error: {0}")]
    Io(String),
    /// Batch file exceeds [`MAX_BATCH_FILE_BYTES`].
    #[error("batch file {path} exceeds {max_bytes} bytes")]
    BatchTooLarge {
        /// Offending file.
        path: String,
        /// Configured cap.
        max_bytes: u64,
    },
    /// Record decoding failed.
    #[error("parse failure: {0}")]
    Parse(#[from] ParseError),
    /// Archive download failed.
    #[error("download failure: {0}")]
    Source(#[from] SourceError),
    /// Archive extraction failed.
    #[error("extract failure: {0}")]
    Archive(#[from] ArchiveError),
    /// Sample preview failed.
    #[error("preview failure: {0}")]
    Preview(#[from] PreviewError),
    /// Array construction rejected the data shape.
    #[error("array shape error: {0}")]
    Shape(String),
}

// ============================================================================
// SECTION: Results
// ============================================================================

/// Images and labels of one split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitData {
    /// Decoded images.
    pub images: ImageBatch,
    /// Decoded labels.
    pub labels: LabelBatch,
}

/// Both decoded splits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CifarDataset {
    /// Training split.
    pub train: SplitData,
    /// Test split.
    pub test: SplitData,
}

impl CifarDataset {
    /// Returns `(train images, train labels, test images, test labels)`.
    #[must_use]
    pub fn into_parts(self) -> (ImageBatch, LabelBatch, ImageBatch, LabelBatch) {
        (self.train.images, self.train.labels, self.test.images, self.test.labels)
    }
}

/// Flattened `f32` rows of one split.
///
/// # Invariants
/// - `data.len() == records * IMAGE_BYTES`.
/// - `labels.len() == records * label_width`.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatSplit {
    /// Number of rows.
    records: usize,
    /// Columns per label row.
    label_width: usize,
    /// Pixel rows scaled by 1/256.
    data: Vec<f32>,
    /// Label rows.
    labels: Vec<f32>,
}

impl FlatSplit {
    /// Flattens a decoded split.
    #[must_use]
    pub fn from_split(split: &SplitData) -> Self {
        Self {
            records: split.images.records(),
            label_width: split.labels.encoding().width(),
            data: flatten_images(&split.images),
            labels: flatten_labels(&split.labels),
        }
    }

    /// Returns the number of rows.
    #[must_use]
    pub const fn records(&self) -> usize {
        self.records
    }

    /// Returns the pixel matrix shape.
    #[must_use]
    pub const fn data_shape(&self) -> [usize; 2] {
        [self.records, IMAGE_BYTES]
    }

    /// Returns the label matrix shape.
    #[must_use]
    pub const fn label_shape(&self) -> [usize; 2] {
        [self.records, self.label_width]
    }

    /// Returns the pixel rows.
    #[must_use]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Returns the label rows.
    #[must_use]
    pub fn labels(&self) -> &[f32] {
        &self.labels
    }

    /// Consumes the split and returns `(data, labels)`.
    #[must_use]
    pub fn into_parts(self) -> (Vec<f32>, Vec<f32>) {
        (self.data, self.labels)
    }
}

/// Both flattened splits.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatDataset {
    /// Training split.
    pub train: FlatSplit,
    /// Test split.
    pub test: FlatSplit,
}

/// Outcome of [`Cifar10::fetch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    /// Archive location.
    pub archive: PathBuf,
    /// Directory holding the batch files.
    pub data_dir: PathBuf,
    /// True when the archive was downloaded by this call.
    pub downloaded: bool,
    /// True when the archive was extracted by this call.
    pub extracted: bool,
}

// ============================================================================
// SECTION: Builder
// ============================================================================

/// Describes where and how the CIFAR-10 binary data is parsed.
#[derive(Clone)]
pub struct Cifar10 {
    /// Root directory for the archive and extracted data.
    base_path: PathBuf,
    /// Batch directory relative to `base_path`.
    cifar_data_path: PathBuf,
    /// Render a random sample per split after parsing.
    show_images: bool,
    /// Upscale factor of sample previews.
    preview_scale: usize,
    /// Emit one-hot label rows instead of class indices.
    encode_one_hot: bool,
    /// Training batch files relative to the data directory.
    training_bin_paths: Vec<PathBuf>,
    /// Test batch files relative to the data directory.
    testing_bin_paths: Vec<PathBuf>,
    /// Records decoded from the training batches.
    num_records_train: usize,
    /// Records decoded from the test batches.
    num_records_test: usize,
    /// Fetch the archive before parsing.
    download_and_extract: bool,
    /// Archive source URL.
    download_url: String,
    /// Archive filename under `base_path`.
    archive_name: String,
    /// Policy for HTTP downloads.
    download_policy: DownloadPolicy,
    /// Explicit source registry overriding the policy-based defaults.
    sources: Option<ArchiveSources>,
    /// Optional expected SHA-256 of the archive.
    expected_sha256: Option<String>,
    /// Byte cap for the archive download.
    max_download_bytes: u64,
    /// Extraction limits.
    extract_limits: ExtractLimits,
    /// Progress sink.
    reporter: Arc<dyn Reporter>,
}

impl Default for Cifar10 {
    /// Looks in `data/cifar-10-batches-bin/` with the release's batch names.
    fn default() -> Self {
        Self {
            base_path: PathBuf::from(DEFAULT_BASE_PATH),
            cifar_data_path: PathBuf::from(DEFAULT_DATA_DIR),
            show_images: false,
            preview_scale: PREVIEW_SCALE,
            encode_one_hot: true,
            training_bin_paths: TRAIN_BATCH_FILES.iter().map(PathBuf::from).collect(),
            testing_bin_paths: TEST_BATCH_FILES.iter().map(PathBuf::from).collect(),
            num_records_train: TRAIN_RECORDS,
            num_records_test: TEST_RECORDS,
            download_and_extract: false,
            download_url: DEFAULT_DOWNLOAD_URL.to_string(),
            archive_name: DEFAULT_ARCHIVE_NAME.to_string(),
            download_policy: DownloadPolicy::default(),
            sources: None,
            expected_sha256: None,
            max_download_bytes: DEFAULT_MAX_DOWNLOAD_BYTES,
            extract_limits: ExtractLimits::default(),
            reporter: Arc::new(NullReporter),
        }
    }
}

impl fmt::Debug for Cifar10 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cifar10")
            .field("base_path", &self.base_path)
            .field("cifar_data_path", &self.cifar_data_path)
            .field("show_images", &self.show_images)
            .field("preview_scale", &self.preview_scale)
            .field("encode_one_hot", &self.encode_one_hot)
            .field("training_bin_paths", &self.training_bin_paths)
            .field("testing_bin_paths", &self.testing_bin_paths)
            .field("num_records_train", &self.num_records_train)
            .field("num_records_test", &self.num_records_test)
            .field("download_and_extract", &self.download_and_extract)
            .field("download_url", &self.download_url)
            .field("archive_name", &self.archive_name)
            .finish_non_exhaustive()
    }
}

impl Cifar10 {
    /// Sets the base path.
    #[must_use]
    pub fn base_path(mut self, base_path: impl Into<PathBuf>) -> Self {
        self.base_path = base_path.into();
        self
    }

    /// Sets the batch directory relative to the base path.
    #[must_use]
    pub fn cifar_data_path(mut self, cifar_data_path: impl Into<PathBuf>) -> Self {
        self.cifar_data_path = cifar_data_path.into();
        self
    }

    /// Downloads and extracts the archive before parsing.
    #[must_use]
    pub const fn download_and_extract(mut self, download_and_extract: bool) -> Self {
        self.download_and_extract = download_and_extract;
        self
    }

    /// Writes a preview of a random sample per split and reports its label.
    #[must_use]
    pub const fn show_images(mut self, show_images: bool) -> Self {
        self.show_images = show_images;
        self
    }

    /// Sets the upscale factor of sample previews (default [`PREVIEW_SCALE`]).
    #[must_use]
    pub const fn preview_scale(mut self, preview_scale: usize) -> Self {
        self.preview_scale = preview_scale;
        self
    }

    /// Chooses one-hot label rows (default) or class-index rows.
    #[must_use]
    pub const fn encode_one_hot(mut self, encode_one_hot: bool) -> Self {
        self.encode_one_hot = encode_one_hot;
        self
    }

    /// Sets the training batch files.
    #[must_use]
    pub fn training_bin_paths<I, P>(mut self, training_bin_paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.training_bin_paths = training_bin_paths.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the test batch files.
    #[must_use]
    pub fn testing_bin_paths<I, P>(mut self, testing_bin_paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.testing_bin_paths = testing_bin_paths.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the number of training records (default 50 000).
    #[must_use]
    pub const fn num_records_train(mut self, num_records_train: usize) -> Self {
        self.num_records_train = num_records_train;
        self
    }

    /// Sets the number of test records (default 10 000).
    #[must_use]
    pub const fn num_records_test(mut self, num_records_test: usize) -> Self {
        self.num_records_test = num_records_test;
        self
    }

    /// Sets the archive source URL.
    #[must_use]
    pub fn download_url(mut self, download_url: impl Into<String>) -> Self {
        self.download_url = download_url.into();
        self
    }

    /// Sets the archive filename stored under the base path.
    #[must_use]
    pub fn archive_name(mut self, archive_name: impl Into<String>) -> Self {
        self.archive_name = archive_name.into();
        self
    }

    /// Sets the HTTP download policy.
    #[must_use]
    pub fn download_policy(mut self, policy: DownloadPolicy) -> Self {
        self.download_policy = policy;
        self
    }

    /// Replaces the scheme-routed archive sources.
    #[must_use]
    pub fn archive_sources(mut self, sources: ArchiveSources) -> Self {
        self.sources = Some(sources);
        self
    }

    /// Requires the archive to match a SHA-256 digest.
    #[must_use]
    pub fn expected_sha256(mut self, digest: impl Into<String>) -> Self {
        self.expected_sha256 = Some(digest.into());
        self
    }

    /// Sets the download byte cap.
    #[must_use]
    pub const fn max_download_bytes(mut self, max_bytes: u64) -> Self {
        self.max_download_bytes = max_bytes;
        self
    }

    /// Sets the extraction limits.
    #[must_use]
    pub const fn extract_limits(mut self, limits: ExtractLimits) -> Self {
        self.extract_limits = limits;
        self
    }

    /// Routes progress events to `reporter`.
    #[must_use]
    pub fn reporter(mut self, reporter: impl Reporter + 'static) -> Self {
        self.reporter = Arc::new(reporter);
        self
    }

    /// Returns the archive location.
    #[must_use]
    pub fn archive_path(&self) -> PathBuf {
        self.base_path.join(&self.archive_name)
    }

    /// Returns the directory holding the batch files.
    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        self.base_path.join(&self.cifar_data_path)
    }

    /// Returns the resolved batch file paths of a split.
    #[must_use]
    pub fn batch_paths(&self, kind: SplitKind) -> Vec<PathBuf> {
        let data_dir = self.data_dir();
        self.bin_paths(kind).iter().map(|bin| data_dir.join(bin)).collect()
    }

    /// Returns the label row layout.
    #[must_use]
    pub const fn label_encoding(&self) -> LabelEncoding {
        if self.encode_one_hot { LabelEncoding::OneHot } else { LabelEncoding::Index }
    }

    /// Returns the preview file path for a split.
    #[must_use]
    pub fn preview_path(&self, kind: SplitKind) -> PathBuf {
        self.base_path.join(format!("preview-{}.ppm", kind.as_str()))
    }

    // ------------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------------

    /// Builds both splits as `u8` batches.
    ///
    /// # Errors
    ///
    /// Returns [`CifarError`] when fetching, reading, or decoding fails.
    pub fn build(self) -> Result<CifarDataset, CifarError> {
        if self.download_and_extract {
            self.fetch()?;
        }
        let train = self.load_split(SplitKind::Train)?;
        let test = self.load_split(SplitKind::Test)?;
        Ok(CifarDataset {
            train,
            test,
        })
    }

    /// Builds both splits as flattened `f32` rows.
    ///
    /// # Errors
    ///
    /// Returns [`CifarError`] when fetching, reading, or decoding fails.
    pub fn build_as_flat_f32(self) -> Result<FlatDataset, CifarError> {
        let dataset = self.build()?;
        Ok(FlatDataset {
            train: FlatSplit::from_split(&dataset.train),
            test: FlatSplit::from_split(&dataset.test),
        })
    }

    /// Downloads and extracts the archive unless already present.
    ///
    /// # Errors
    ///
    /// Returns [`CifarError`] when the base directory cannot be created or the
    /// download or extraction fails.
    pub fn fetch(&self) -> Result<FetchOutcome, CifarError> {
        if !self.base_path.exists() {
            fs::create_dir_all(&self.base_path).map_err(|err| {
                CifarError::Io(format!(
                    "failed to create directory {}: {err}",
                    self.base_path.display()
                ))
            })?;
            self.reporter.report(&ReportEvent::DirectoryCreated {
                path: self.base_path.clone(),
            });
        }

        let archive = self.archive_path();
        let downloaded = if archive.exists() {
            self.reporter.report(&ReportEvent::DownloadSkipped {
                path: archive.clone(),
            });
            false
        } else {
            let sources = match &self.sources {
                Some(sources) => sources.clone(),
                None => ArchiveSources::with_defaults(self.download_policy.clone())?,
            };
            let request = DownloadRequest {
                url: &self.download_url,
                destination: &archive,
                max_bytes: self.max_download_bytes,
                expected_sha256: self.expected_sha256.as_deref(),
            };
            download_to_file(&sources, &request, self.reporter.as_ref())?;
            true
        };

        let data_dir = self.data_dir();
        let extracted = if data_dir.exists() {
            self.reporter.report(&ReportEvent::ExtractSkipped {
                path: data_dir.clone(),
            });
            false
        } else {
            self.reporter.report(&ReportEvent::ExtractStarted {
                archive: archive.clone(),
                destination: self.base_path.clone(),
            });
            let entries = self.extract_staged(&archive, &data_dir)?;
            self.reporter.report(&ReportEvent::ExtractFinished {
                destination: self.base_path.clone(),
                entries,
            });
            true
        };

        Ok(FetchOutcome {
            archive,
            data_dir,
            downloaded,
            extracted,
        })
    }

    /// Reads and decodes one split.
    ///
    /// # Errors
    ///
    /// Returns [`CifarError`] when a batch file is missing, oversized, or
    /// malformed, or when the sample preview cannot be written.
    pub fn load_split(&self, kind: SplitKind) -> Result<SplitData, CifarError> {
        let mut buffer = Vec::new();
        for path in self.batch_paths(kind) {
            let bytes = read_batch_file(&path)?;
            self.reporter.report(&ReportEvent::BatchLoaded {
                split: kind,
                path,
                bytes: bytes.len() as u64,
            });
            buffer.extend_from_slice(&bytes);
        }

        let (images, labels) =
            decode_records(&buffer, self.num_records(kind), self.label_encoding())?;
        self.reporter.report(&ReportEvent::SplitParsed {
            split: kind,
            records: images.records() as u64,
        });

        if self.show_images && images.records() > 0 {
            self.preview_sample(kind, &images, &labels)?;
        }
        Ok(SplitData {
            images,
            labels,
        })
    }

    /// Extracts `archive` into the staging directory, then moves the data
    /// directory into place. The staging directory is removed either way.
    fn extract_staged(&self, archive: &Path, data_dir: &Path) -> Result<u64, CifarError> {
        let staging = self.base_path.join(EXTRACT_STAGING_DIR);
        remove_dir_if_present(&staging)?;
        let result = extract_tar_gz(archive, &staging, self.extract_limits)
            .map_err(CifarError::from)
            .and_then(|entries| self.promote_staged(&staging, data_dir).map(|()| entries));
        let _ = fs::remove_dir_all(&staging);
        result
    }

    /// Renames the staged data directory to `data_dir`, then moves any other
    /// top-level entries that do not already exist under the base path.
    fn promote_staged(&self, staging: &Path, data_dir: &Path) -> Result<(), CifarError> {
        let relative: PathBuf = self.cifar_data_path.components().collect();
        let staged_data = staging.join(&relative);
        if !staged_data.is_dir() {
            return Err(CifarError::Archive(ArchiveError::Io(format!(
                "archive does not contain {}",
                relative.display()
            ))));
        }
        let target: PathBuf = data_dir.components().collect();
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|err| io_error(parent, &err))?;
        }
        fs::rename(&staged_data, &target).map_err(|err| io_error(&target, &err))?;

        let entries = fs::read_dir(staging).map_err(|err| io_error(staging, &err))?;
        for entry in entries {
            let entry = entry.map_err(|err| io_error(staging, &err))?;
            let destination = self.base_path.join(entry.file_name());
            if !destination.exists() {
                fs::rename(entry.path(), &destination)
                    .map_err(|err| io_error(&destination, &err))?;
            }
        }
        Ok(())
    }

    /// Returns the configured batch files of a split.
    fn bin_paths(&self, kind: SplitKind) -> &[PathBuf] {
        match kind {
            SplitKind::Train => &self.training_bin_paths,
            SplitKind::Test => &self.testing_bin_paths,
        }
    }

    /// Returns the configured record count of a split.
    const fn num_records(&self, kind: SplitKind) -> usize {
        match kind {
            SplitKind::Train => self.num_records_train,
            SplitKind::Test => self.num_records_test,
        }
    }

    /// Renders a random sample and reports its label.
    fn preview_sample(
        &self,
        kind: SplitKind,
        images: &ImageBatch,
        labels: &LabelBatch,
    ) -> Result<(), CifarError> {
        let index = random_index(images)?;
        let path = self.preview_path(kind);
        write_ppm(images, index, self.preview_scale, &path)?;
        if let Some(label) = labels.class_of(index) {
            self.reporter.report(&ReportEvent::SamplePreview {
                split: kind,
                index: index as u64,
                label,
                path,
            });
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Formats an I/O failure for `path`.
fn io_error(path: &Path, err: &std::io::Error) -> CifarError {
    CifarError::Io(format!("{}: {err}", path.display()))
}

/// Removes a leftover directory from an interrupted extraction.
fn remove_dir_if_present(path: &Path) -> Result<(), CifarError> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(io_error(path, &err)),
    }
}

/// Reads a batch file with a hard size cap.
fn read_batch_file(path: &Path) -> Result<Vec<u8>, CifarError> {
    let file = File::open(path).map_err(|err| {
        if err.kind() == ErrorKind::NotFound {
            CifarError::NotFound(path.display().to_string())
        } else {
            io_error(path, &err)
        }
    })?;
    let mut limited = file.take(MAX_BATCH_FILE_BYTES + 1);
    let mut bytes = Vec::new();
    limited
        .read_to_end(&mut bytes)
        .map_err(|err| io_error(path, &err))?;
    if bytes.len() as u64 > MAX_BATCH_FILE_BYTES {
        return Err(CifarError::BatchTooLarge {
            path: path.display().to_string(),
            max_bytes: MAX_BATCH_FILE_BYTES,
        });
    }
    Ok(bytes)
}
