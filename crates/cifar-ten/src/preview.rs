// crates/cifar-ten/src/preview.rs
// ============================================================================
// Module: CIFAR-Ten Sample Preview
// Description: Renders decoded images as portable pixmap (PPM) files.
// Purpose: Let users eyeball a sample and its label after parsing.
// Dependencies: rand, thiserror
// ============================================================================

//! ## Overview
//! Images are stored as three colour planes; [`interleave_rgb`] converts one
//! image into packed RGB triples and [`write_ppm`] stores it as a binary PPM
//! (`P6`), optionally upscaled with nearest-neighbour sampling.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::io::BufWriter;
use std::io::Write;
use std::path::Path;

use rand::Rng;
use thiserror::Error;

use crate::layout::IMAGE_BYTES;
use crate::layout::IMAGE_HEIGHT;
use crate::layout::IMAGE_WIDTH;
use crate::layout::PLANE_BYTES;
use crate::parse::ImageBatch;

/// Largest supported upscale factor.
pub const MAX_SCALE: usize = 32;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while rendering previews.
#[derive(Debug, Error)]
pub enum PreviewError {
    /// Batch holds no images.
    #[error("no images available for preview")]
    Empty,
    /// Requested image index is outside the batch.
    #[error("image index {index} out of range for {records} records")]
    OutOfRange {
        /// Requested index.
        index: usize,
        /// Records in the batch.
        records: usize,
    },
    /// Scale factor is zero or too large.
    #[error("preview scale must be between 1 and {MAX_SCALE}, got {0}")]
    InvalidScale(usize),
    /// Writing the preview failed.
    #[error("preview io error: {0}")]
    Io(String),
}

// ============================================================================
// SECTION: Rendering
// ============================================================================

/// Picks a uniformly random image index.
///
/// # Errors
///
/// Returns [`PreviewError::Empty`] when the batch has no images.
pub fn random_index(images: &ImageBatch) -> Result<usize, PreviewError> {
    if images.records() == 0 {
        return Err(PreviewError::Empty);
    }
    Ok(rand::thread_rng().gen_range(0..images.records()))
}

/// Converts one planar image into packed `[r, g, b]` triples, row-major.
///
/// # Errors
///
/// Returns [`PreviewError::OutOfRange`] when `index` is not in the batch.
pub fn interleave_rgb(images: &ImageBatch, index: usize) -> Result<Vec<u8>, PreviewError> {
    let planes = images.image(index).ok_or(PreviewError::OutOfRange {
        index,
        records: images.records(),
    })?;
    let (red, rest) = planes.split_at(PLANE_BYTES);
    let (green, blue) = rest.split_at(PLANE_BYTES);
    let mut packed = Vec::with_capacity(IMAGE_BYTES);
    for ((r, g), b) in red.iter().zip(green).zip(blue) {
        packed.extend_from_slice(&[*r, *g, *b]);
    }
    Ok(packed)
}

/// Writes image `index` to `path` as a binary PPM scaled by `scale`.
///
/// # Errors
///
/// Returns [`PreviewError`] for invalid indices or scales and write failures.
pub fn write_ppm(
    images: &ImageBatch,
    index: usize,
    scale: usize,
    path: &Path,
) -> Result<(), PreviewError> {
    if scale == 0 || scale > MAX_SCALE {
        return Err(PreviewError::InvalidScale(scale));
    }
    let packed = interleave_rgb(images, index)?;
    let file = File::create(path).map_err(|err| PreviewError::Io(err.to_string()))?;
    let mut writer = BufWriter::new(file);
    render_ppm(&packed, scale, &mut writer).map_err(|err| PreviewError::Io(err.to_string()))?;
    writer.flush().map_err(|err| PreviewError::Io(err.to_string()))
}

/// Encodes packed RGB pixels as a scaled `P6` pixmap.
fn render_ppm(packed: &[u8], scale: usize, out: &mut impl Write) -> std::io::Result<()> {
    let width = IMAGE_WIDTH * scale;
    let height = IMAGE_HEIGHT * scale;
    write!(out, "P6\n{width} {height}\n255\n")?;
    let mut row = Vec::with_capacity(width * 3);
    for y in 0..IMAGE_HEIGHT {
        row.clear();
        for x in 0..IMAGE_WIDTH {
            let offset = (y * IMAGE_WIDTH + x) * 3;
            let pixel = &packed[offset..offset + 3];
            for _ in 0..scale {
                row.extend_from_slice(pixel);
            }
        }
        for _ in 0..scale {
            out.write_all(&row)?;
        }
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
