// crates/cifar-ten/src/layout.rs
// ============================================================================
// Module: CIFAR-10 Record Layout
// Description: Fixed record geometry and class catalog for CIFAR-10 batches.
// Purpose: Single source of truth for byte offsets, shapes, and class names.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A CIFAR-10 binary batch is a flat sequence of fixed-size records. Each
//! record is one label byte followed by a 32x32 image stored as three
//! row-major colour planes (red, green, blue).

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Geometry
// ============================================================================

/// Number of colour channels per image.
pub const IMAGE_CHANNELS: usize = 3;
/// Image height in pixels.
pub const IMAGE_HEIGHT: usize = 32;
/// Image width in pixels.
pub const IMAGE_WIDTH: usize = 32;
/// Bytes in a single colour plane.
pub const PLANE_BYTES: usize = IMAGE_HEIGHT * IMAGE_WIDTH;
/// Pixel bytes per image.
pub const IMAGE_BYTES: usize = IMAGE_CHANNELS * PLANE_BYTES;
/// Bytes per record (label byte plus pixels).
pub const RECORD_BYTES: usize = 1 + IMAGE_BYTES;
/// Number of label classes.
pub const NUM_CLASSES: usize = 10;
/// Records in the full training set.
pub const TRAIN_RECORDS: usize = 50_000;
/// Records in the full test set.
pub const TEST_RECORDS: usize = 10_000;

/// Training batch filenames in the order the release ships them.
pub const TRAIN_BATCH_FILES: [&str; 5] = [
    "data_batch_1.bin",
    "data_batch_2.bin",
    "data_batch_3.bin",
    "data_batch_4.bin",
    "data_batch_5.bin",
];
/// Test batch filenames.
pub const TEST_BATCH_FILES: [&str; 1] = ["test_batch.bin"];

// ============================================================================
// SECTION: Classes
// ============================================================================

/// CIFAR-10 label classes in label-byte order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Class {
    /// Label 0.
    Airplane,
    /// Label 1.
    Automobile,
    /// Label 2.
    Bird,
    /// Label 3.
    Cat,
    /// Label 4.
    Deer,
    /// Label 5.
    Dog,
    /// Label 6.
    Frog,
    /// Label 7.
    Horse,
    /// Label 8.
    Ship,
    /// Label 9.
    Truck,
}

impl Class {
    /// All classes ordered by label byte.
    pub const ALL: [Self; NUM_CLASSES] = [
        Self::Airplane,
        Self::Automobile,
        Self::Bird,
        Self::Cat,
        Self::Deer,
        Self::Dog,
        Self::Frog,
        Self::Horse,
        Self::Ship,
        Self::Truck,
    ];

    /// Maps a label byte to its class.
    #[must_use]
    pub const fn from_index(index: u8) -> Option<Self> {
        if (index as usize) < NUM_CLASSES { Some(Self::ALL[index as usize]) } else { None }
    }

    /// Returns the label byte for the class.
    #[must_use]
    pub const fn index(self) -> u8 {
        self as u8
    }

    /// Returns the lowercase class name used by the release metadata.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Airplane => "airplane",
            Self::Automobile => "automobile",
            Self::Bird => "bird",
            Self::Cat => "cat",
            Self::Deer => "deer",
            Self::Dog => "dog",
            Self::Frog => "frog",
            Self::Horse => "horse",
            Self::Ship => "ship",
            Self::Truck => "truck",
        }
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// SECTION: Splits
// ============================================================================

/// Data set partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitKind {
    /// Training batches.
    Train,
    /// Test batch.
    Test,
}

impl SplitKind {
    /// Returns the stable label used in reports and file names.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Train => "train",
            Self::Test => "test",
        }
    }
}

impl fmt::Display for SplitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
