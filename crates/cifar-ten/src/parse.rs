// crates/cifar-ten/src/parse.rs
// ============================================================================
// Module: CIFAR-10 Record Decoding
// Description: Decodes concatenated binary batches into image and label batches.
// Purpose: Validate record framing and label bytes before exposing pixel data.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! [`decode_records`] splits a buffer of concatenated CIFAR-10 records into an
//! [`ImageBatch`] and a [`LabelBatch`].
//! Invariants:
//! - Exactly `num_records` records are decoded; trailing bytes are ignored.
//! - Short buffers and out-of-range labels fail with [`ParseError`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::layout::Class;
use crate::layout::IMAGE_BYTES;
use crate::layout::IMAGE_CHANNELS;
use crate::layout::IMAGE_HEIGHT;
use crate::layout::IMAGE_WIDTH;
use crate::layout::NUM_CLASSES;
use crate::layout::RECORD_BYTES;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while decoding batch bytes.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Buffer does not hold the requested number of records.
    #[error("batch data truncated: needed {needed} bytes, found {available}")]
    Truncated {
        /// Bytes required for the requested records.
        needed: usize,
        /// Bytes available in the buffer.
        available: usize,
    },
    /// A label byte is outside the class range.
    #[error("record {record} has label {label}, which is inconsistent with the CIFAR-10 scheme")]
    InvalidLabel {
        /// Zero-based record index.
        record: usize,
        /// Offending label byte.
        label: u8,
    },
    /// Requested record count overflows the addressable size.
    #[error("record count {0} overflows the addressable buffer size")]
    Overflow(usize),
}

// ============================================================================
// SECTION: Label Encoding
// ============================================================================

/// Label row layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LabelEncoding {
    /// Ten columns with a single `1` at the class index.
    #[default]
    OneHot,
    /// One column holding the class index.
    Index,
}

impl LabelEncoding {
    /// Returns the number of columns per label row.
    #[must_use]
    pub const fn width(self) -> usize {
        match self {
            Self::OneHot => NUM_CLASSES,
            Self::Index => 1,
        }
    }
}

// ============================================================================
// SECTION: Batches
// ============================================================================

/// Decoded images in `[records, channels, height, width]` order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBatch {
    /// Number of images.
    records: usize,
    /// Pixel bytes, `records * IMAGE_BYTES` long.
    pixels: Vec<u8>,
}

impl ImageBatch {
    /// Returns the number of images.
    #[must_use]
    pub const fn records(&self) -> usize {
        self.records
    }

    /// Returns the batch shape.
    #[must_use]
    pub const fn shape(&self) -> [usize; 4] {
        [self.records, IMAGE_CHANNELS, IMAGE_HEIGHT, IMAGE_WIDTH]
    }

    /// Returns all pixel bytes.
    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Consumes the batch and returns its pixel bytes.
    #[must_use]
    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    /// Returns the planar pixel bytes of one image.
    #[must_use]
    pub fn image(&self, index: usize) -> Option<&[u8]> {
        let start = index.checked_mul(IMAGE_BYTES)?;
        let end = start.checked_add(IMAGE_BYTES)?;
        self.pixels.get(start..end)
    }
}

/// Decoded labels, one row per record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelBatch {
    /// Number of label rows.
    records: usize,
    /// Row layout.
    encoding: LabelEncoding,
    /// Row-major label values.
    values: Vec<u8>,
}

impl LabelBatch {
    /// Returns the number of label rows.
    #[must_use]
    pub const fn records(&self) -> usize {
        self.records
    }

    /// Returns the row layout.
    #[must_use]
    pub const fn encoding(&self) -> LabelEncoding {
        self.encoding
    }

    /// Returns the label matrix shape.
    #[must_use]
    pub const fn shape(&self) -> [usize; 2] {
        [self.records, self.encoding.width()]
    }

    /// Returns the row-major label values.
    #[must_use]
    pub fn values(&self) -> &[u8] {
        &self.values
    }

    /// Consumes the batch and returns its label values.
    #[must_use]
    pub fn into_values(self) -> Vec<u8> {
        self.values
    }

    /// Returns the class of one record.
    #[must_use]
    pub fn class_of(&self, index: usize) -> Option<Class> {
        let width = self.encoding.width();
        let start = index.checked_mul(width)?;
        let row = self.values.get(start..start.checked_add(width)?)?;
        match self.encoding {
            LabelEncoding::Index => row.first().copied().and_then(Class::from_index),
            LabelEncoding::OneHot => {
                let hot = row.iter().position(|value| *value == 1)?;
                Class::ALL.get(hot).copied()
            }
        }
    }

    /// Returns the number of records per class, indexed by label byte.
    #[must_use]
    pub fn class_counts(&self) -> [usize; NUM_CLASSES] {
        let mut counts = [0usize; NUM_CLASSES];
        for index in 0..self.records {
            if let Some(class) = self.class_of(index) {
                counts[usize::from(class.index())] += 1;
            }
        }
        counts
    }
}

// ============================================================================
// SECTION: Decoding
// ============================================================================

/// Decodes the first `num_records` records of `buffer`.
///
/// # Errors
///
/// Returns [`ParseError`] when the buffer is too short or a label byte is out
/// of range.
pub fn decode_records(
    buffer: &[u8],
    num_records: usize,
    encoding: LabelEncoding,
) -> Result<(ImageBatch, LabelBatch), ParseError> {
    let needed = num_records.checked_mul(RECORD_BYTES).ok_or(ParseError::Overflow(num_records))?;
    if buffer.len() < needed {
        return Err(ParseError::Truncated {
            needed,
            available: buffer.len(),
        });
    }

    let mut pixels = Vec::with_capacity(num_records * IMAGE_BYTES);
    let mut values = vec![0u8; num_records * encoding.width()];
    for (record, chunk) in buffer[..needed].chunks_exact(RECORD_BYTES).enumerate() {
        let label = chunk[0];
        if usize::from(label) >= NUM_CLASSES {
            return Err(ParseError::InvalidLabel {
                record,
                label,
            });
        }
        match encoding {
            LabelEncoding::OneHot => values[record * NUM_CLASSES + usize::from(label)] = 1,
            LabelEncoding::Index => values[record] = label,
        }
        pixels.extend_from_slice(&chunk[1..]);
    }

    Ok((
        ImageBatch {
            records: num_records,
            pixels,
        },
        LabelBatch {
            records: num_records,
            encoding,
            values,
        },
    ))
}

/// Converts an image batch into `[records, IMAGE_BYTES]` rows scaled by 1/256.
#[must_use]
pub fn flatten_images(images: &ImageBatch) -> Vec<f32> {
    images.pixels.iter().map(|value| f32::from(*value) / 256.0).collect()
}

/// Converts label values into `f32` rows.
#[must_use]
pub fn flatten_labels(labels: &LabelBatch) -> Vec<f32> {
    labels.values.iter().map(|value| f32::from(*value)).collect()
}
