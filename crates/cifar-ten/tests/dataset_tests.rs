// crates/cifar-ten/tests/dataset_tests.rs
// ============================================================================
// Module: Dataset Builder Tests
// Description: End-to-end parsing of synthetic batch directories.
// Purpose: Validate split assembly, label encodings, flattening, and previews.
// Dependencies: cifar-ten, tempfile, serde_json
// ============================================================================

//! ## Overview
//! Exercises [`cifar_ten::Cifar10`] against small on-disk batch sets.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    clippy::float_cmp,
    missing_docs
)]

mod common;

use std::fs;

use cifar_ten::CifarError;
use cifar_ten::Class;
use cifar_ten::LabelEncoding;
use cifar_ten::LogReporter;
use cifar_ten::ParseError;
use cifar_ten::SplitKind;
use tempfile::TempDir;

use crate::common::SharedBuffer;
use crate::common::TEST_LABELS;
use crate::common::TRAIN_LABELS_A;
use crate::common::TRAIN_LABELS_B;
use crate::common::pixel_value;
use crate::common::small_builder;
use crate::common::small_layout;
use crate::common::synthetic_batch;
use crate::common::write_batches;

// ============================================================================
// SECTION: u8 Builds
// ============================================================================

#[test]
fn build_concatenates_training_batches_in_order() {
    let dir = TempDir::new().unwrap();
    let dataset = small_layout(dir.path()).build().unwrap();

    assert_eq!(dataset.train.images.shape(), [5, 3, 32, 32]);
    assert_eq!(dataset.train.labels.shape(), [5, 10]);
    let classes: Vec<u8> = (0..5)
        .map(|index| dataset.train.labels.class_of(index).unwrap().index())
        .collect();
    let expected: Vec<u8> = TRAIN_LABELS_A.iter().chain(TRAIN_LABELS_B.iter()).copied().collect();
    assert_eq!(classes, expected);

    // Record 3 is the first record of the second batch file.
    let image = dataset.train.images.image(3).unwrap();
    assert_eq!(image[0], pixel_value(3, 0, 0));
    assert_eq!(image[1024 + 5], pixel_value(3, 1, 5));
    assert_eq!(image[2048 + 1023], pixel_value(3, 2, 1023));
}

#[test]
fn build_returns_test_split_separately() {
    let dir = TempDir::new().unwrap();
    let (_, _, test_images, test_labels) = small_layout(dir.path()).build().unwrap().into_parts();

    assert_eq!(test_images.records(), TEST_LABELS.len());
    assert_eq!(test_labels.class_of(0), Some(Class::Cat));
    assert_eq!(test_labels.class_of(1), Some(Class::Ship));
    assert_eq!(test_labels.class_counts()[3], 1);
    assert_eq!(test_labels.class_counts().iter().sum::<usize>(), 2);
}

#[test]
fn build_without_one_hot_emits_class_indices() {
    let dir = TempDir::new().unwrap();
    let dataset = small_layout(dir.path()).encode_one_hot(false).build().unwrap();

    assert_eq!(dataset.train.labels.encoding(), LabelEncoding::Index);
    assert_eq!(dataset.train.labels.shape(), [5, 1]);
    assert_eq!(dataset.train.labels.values(), &[0, 1, 2, 9, 5]);
}

#[test]
fn build_accepts_record_subsets() {
    let dir = TempDir::new().unwrap();
    let dataset = small_layout(dir.path()).num_records_train(2).num_records_test(1).build().unwrap();

    assert_eq!(dataset.train.images.records(), 2);
    assert_eq!(dataset.test.labels.records(), 1);
}

// ============================================================================
// SECTION: Flat Builds
// ============================================================================

#[test]
fn flat_build_scales_pixels_by_256() {
    let dir = TempDir::new().unwrap();
    let flat = small_layout(dir.path()).build_as_flat_f32().unwrap();

    assert_eq!(flat.train.data_shape(), [5, 3072]);
    assert_eq!(flat.train.label_shape(), [5, 10]);
    assert_eq!(flat.test.data_shape(), [2, 3072]);
    let row = 4;
    let expected = f32::from(pixel_value(row, 1, 17)) / 256.0;
    assert_eq!(flat.train.data()[row * 3072 + 1024 + 17], expected);
    assert!(flat.train.data().iter().all(|value| (0.0..1.0).contains(value)));
}

#[test]
fn flat_build_keeps_one_hot_rows_as_floats() {
    let dir = TempDir::new().unwrap();
    let flat = small_layout(dir.path()).build_as_flat_f32().unwrap();
    let (_, labels) = flat.test.into_parts();

    assert_eq!(labels.len(), 20);
    assert_eq!(labels[3], 1.0);
    assert_eq!(labels[10 + 8], 1.0);
    assert_eq!(labels.iter().sum::<f32>(), 2.0);
}

// ============================================================================
// SECTION: Failure Paths
// ============================================================================

#[test]
fn missing_batch_file_reports_not_found() {
    let dir = TempDir::new().unwrap();
    let err = small_builder(dir.path()).build().unwrap_err();
    match err {
        CifarError::NotFound(path) => assert!(path.ends_with("data_batch_1.bin")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn short_batches_report_truncation() {
    let dir = TempDir::new().unwrap();
    let builder = small_layout(dir.path()).num_records_test(3);
    let err = builder.build().unwrap_err();
    assert!(matches!(
        err,
        CifarError::Parse(ParseError::Truncated {
            needed: 9219,
            available: 6146
        })
    ));
}

#[test]
fn corrupt_label_reports_record_index() {
    let dir = TempDir::new().unwrap();
    let builder = small_layout(dir.path());
    write_batches(dir.path(), "cifar-10-batches-bin", &[("test_batch.bin", synthetic_batch(&[1, 42]))]);
    let err = builder.load_split(SplitKind::Test).unwrap_err();
    assert!(matches!(
        err,
        CifarError::Parse(ParseError::InvalidLabel {
            record: 1,
            label: 42
        })
    ));
}

// ============================================================================
// SECTION: Reporting and Previews
// ============================================================================

#[test]
fn reporter_receives_batch_and_split_events() {
    let dir = TempDir::new().unwrap();
    let buffer = SharedBuffer::new();
    small_layout(dir.path()).reporter(LogReporter::new(buffer.clone())).build().unwrap();

    assert_eq!(
        buffer.event_names(),
        ["batch_loaded", "batch_loaded", "split_parsed", "batch_loaded", "split_parsed"]
    );
    let records = buffer.records();
    assert_eq!(records[0]["seq"], 1);
    assert_eq!(records[0]["component"], "cifar-ten");
    assert_eq!(records[0]["detail"]["split"], "train");
    assert_eq!(records[0]["detail"]["bytes"], 3 * 3073);
    assert_eq!(records[4]["detail"]["records"], 2);
}

#[test]
fn show_images_writes_previews_and_reports_labels() {
    let dir = TempDir::new().unwrap();
    let buffer = SharedBuffer::new();
    let builder = small_layout(dir.path()).show_images(true).reporter(LogReporter::new(buffer.clone()));
    let train_preview = builder.preview_path(SplitKind::Train);
    let test_preview = builder.preview_path(SplitKind::Test);
    builder.build().unwrap();

    let bytes = fs::read(&test_preview).unwrap();
    assert!(bytes.starts_with(b"P6\n256 256\n255\n"));
    assert!(train_preview.exists());

    let previews: Vec<_> = buffer
        .records()
        .into_iter()
        .filter(|record| record["detail"]["event"] == "sample_preview")
        .collect();
    assert_eq!(previews.len(), 2);
    let test_label = previews[1]["detail"]["label"].as_str().unwrap();
    assert!(["cat", "ship"].contains(&test_label));
}

#[test]
fn preview_scale_controls_sample_preview_size() {
    let dir = TempDir::new().unwrap();
    let builder = small_layout(dir.path()).show_images(true).preview_scale(1);
    let test_preview = builder.preview_path(SplitKind::Test);
    builder.build().unwrap();

    let bytes = fs::read(&test_preview).unwrap();
    assert!(bytes.starts_with(b"P6\n32 32\n255\n"));
    assert_eq!(bytes.len(), b"P6\n32 32\n255\n".len() + 32 * 32 * 3);
}

#[test]
fn invalid_preview_scale_fails_the_build() {
    let dir = TempDir::new().unwrap();
    let err = small_layout(dir.path()).show_images(true).preview_scale(0).build().unwrap_err();
    assert!(matches!(err, CifarError::Preview(_)), "unexpected error: {err}");
}
