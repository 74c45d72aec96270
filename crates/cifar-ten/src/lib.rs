// crates/cifar-ten/src/lib.rs
// ============================================================================
// Module: CIFAR-Ten Library
// Description: CIFAR-10 binary batch parsing, fetching, and array bridges.
// Purpose: Turn the CIFAR-10 binary release into typed image and label batches.
// Dependencies: flate2, rand, reqwest, serde, sha2, tar, thiserror, url
// ============================================================================

//! ## Overview
//! Parses the binary files of the CIFAR-10 data set into image and label
//! batches:
//! - Training data: `[50_000, 3, 32, 32]` images and `[50_000, 10]` labels.
//! - Testing data: `[10_000, 3, 32, 32]` images and `[10_000, 10]` labels.
//!
//! or, through [`Cifar10::build_as_flat_f32`], as flattened `f32` rows in the
//! same arrangement. The `to_ndarray_01x` features convert either form into
//! `ndarray` arrays of the matching release.
//!
//! ```no_run
//! use cifar_ten::Cifar10;
//!
//! # fn main() -> Result<(), cifar_ten::CifarError> {
//! let (train_data, train_labels, test_data, test_labels) = Cifar10::default()
//!     .download_and_extract(true)
//!     .build()?
//!     .into_parts();
//! assert_eq!(train_data.shape(), [50_000, 3, 32, 32]);
//! # let _ = (train_labels, test_data, test_labels);
//! # Ok(())
//! # }
//! ```
//!
//! Invariants:
//! - Batch files are read with a hard size cap ([`MAX_BATCH_FILE_BYTES`]).
//! - Malformed records fail with typed errors; decoding never panics.
//! - Archives are downloaded to a staging file and only renamed into place
//!   after size and digest checks pass.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod archive;
pub mod dataset;
pub mod layout;
pub mod parse;
pub mod preview;
pub mod report;
pub mod source;

#[cfg(feature = "to_ndarray_013")]
pub mod ndarray_013;
#[cfg(feature = "to_ndarray_014")]
pub mod ndarray_014;
#[cfg(feature = "to_ndarray_015")]
pub mod ndarray_015;
#[cfg(feature = "to_ndarray_016")]
pub mod ndarray_016;

#[cfg(any(
    feature = "to_ndarray_013",
    feature = "to_ndarray_014",
    feature = "to_ndarray_015",
    feature = "to_ndarray_016"
))]
mod bridge;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use archive::ArchiveError;
pub use archive::ExtractLimits;
pub use archive::extract_tar_gz;
pub use dataset::Cifar10;
pub use dataset::CifarDataset;
pub use dataset::CifarError;
pub use dataset::DEFAULT_ARCHIVE_NAME;
pub use dataset::DEFAULT_DOWNLOAD_URL;
pub use dataset::FetchOutcome;
pub use dataset::FlatDataset;
pub use dataset::FlatSplit;
pub use dataset::MAX_BATCH_FILE_BYTES;
pub use dataset::SplitData;
pub use layout::Class;
pub use layout::SplitKind;
pub use parse::ImageBatch;
pub use parse::LabelBatch;
pub use parse::LabelEncoding;
pub use parse::ParseError;
pub use parse::decode_records;
pub use preview::PreviewError;
pub use report::LogReporter;
pub use report::NullReporter;
pub use report::ReportEvent;
pub use report::Reporter;
pub use source::ArchiveSource;
pub use source::ArchiveSources;
pub use source::DownloadPolicy;
pub use source::FileArchiveSource;
pub use source::HttpArchiveSource;
pub use source::SourceError;
pub use source::SourceStream;
