// crates/cifar-ten-cli/tests/cli_commands.rs
// ============================================================================
// Module: CLI Command Tests
// Description: End-to-end tests for the cifar-ten binary.
// Purpose: Run each subcommand against synthetic batches in a temp directory.
// Dependencies: cifar-ten-cli binary, flate2, serde_json, tar, tempfile, url
// ============================================================================

//! ## Overview
//! Every test runs the compiled binary with its working directory set to a
//! fresh temp directory so no `cifar-ten.toml` from the host leaks in.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::cast_possible_truncation,
    missing_docs
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::process::Command;
use std::process::Output;

use flate2::Compression;
use flate2::write::GzEncoder;
use serde_json::Value;
use tar::EntryType;
use tar::Header;
use url::Url;

// ============================================================================
// SECTION: Helpers
// ============================================================================

const RECORD_BYTES: usize = 3073;
const TRAIN_LABELS: [u8; 3] = [6, 6, 1];
const TEST_LABELS: [u8; 2] = [3, 8];

fn batch(labels: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(labels.len() * RECORD_BYTES);
    for (record, label) in labels.iter().enumerate() {
        bytes.push(*label);
        bytes.extend((0..RECORD_BYTES - 1).map(|offset| ((record * 13 + offset) % 256) as u8));
    }
    bytes
}

fn batch_files() -> Vec<(&'static str, Vec<u8>)> {
    vec![("train.bin", batch(&TRAIN_LABELS)), ("test.bin", batch(&TEST_LABELS))]
}

fn write_batches(base: &Path) {
    let dir = base.join("cifar-10-batches-bin");
    fs::create_dir_all(&dir).unwrap();
    for (name, bytes) in batch_files() {
        fs::write(dir.join(name), bytes).unwrap();
    }
}

fn write_archive(path: &Path) {
    let encoder = GzEncoder::new(Vec::new(), Compression::fast());
    let mut builder = tar::Builder::new(encoder);
    for (name, bytes) in batch_files() {
        let mut header = Header::new_gnu();
        header.set_size(bytes.len() as u64);
        header.set_mode(0o644);
        header.set_entry_type(EntryType::Regular);
        builder
            .append_data(&mut header, format!("cifar-10-batches-bin/{name}"), bytes.as_slice())
            .unwrap();
    }
    let archive = builder.into_inner().unwrap().finish().unwrap();
    fs::write(path, archive).unwrap();
}

fn toml_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

fn write_config(dir: &Path, base: &Path, extra: &str) -> std::path::PathBuf {
    let config = format!(
        "[dataset]\nbase_path = \"{}\"\ntraining_files = [\"train.bin\"]\n\
         testing_files = [\"test.bin\"]\nnum_records_train = {}\nnum_records_test = {}\n{extra}",
        toml_path(base),
        TRAIN_LABELS.len(),
        TEST_LABELS.len()
    );
    let path = dir.join("cifar-ten.toml");
    fs::write(&path, config).unwrap();
    path
}

fn run(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_cifar-ten"))
        .current_dir(dir)
        .env_remove("CIFAR_TEN_CONFIG")
        .args(args)
        .output()
        .expect("spawn cifar-ten")
}

fn stdout(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).unwrap()
}

fn stderr(output: &Output) -> String {
    String::from_utf8(output.stderr.clone()).unwrap()
}

fn stderr_events(output: &Output) -> Vec<String> {
    stderr(output)
        .lines()
        .filter_map(|line| serde_json::from_str::<Value>(line).ok())
        .filter_map(|record| record["detail"]["event"].as_str().map(str::to_string))
        .collect()
}

// ============================================================================
// SECTION: Config
// ============================================================================

#[test]
fn config_check_accepts_valid_file() {
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path(), &dir.path().join("data"), "");
    let output = run(dir.path(), &["config", "check"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output).trim(), "Config valid.");
}

#[test]
fn config_check_reports_invalid_file() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("cifar-ten.toml"), "[preview]\nscale = 0\n").unwrap();
    let output = run(dir.path(), &["config", "check"]);
    assert!(!output.status.success());
    let message = stderr(&output);
    assert!(message.starts_with("Failed to load config:"), "stderr: {message}");
    assert!(message.contains("preview.scale"), "stderr: {message}");
}

#[test]
fn config_check_requires_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let output = run(dir.path(), &["config", "check"]);
    assert!(!output.status.success());
    assert!(stderr(&output).starts_with("Failed to load config:"));
}

#[test]
fn explicit_config_flag_overrides_working_directory() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("nested");
    fs::create_dir_all(&nested).unwrap();
    let config = write_config(&nested, &dir.path().join("data"), "");
    let output = run(dir.path(), &["config", "check", "--config", &toml_path(&config)]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
}

// ============================================================================
// SECTION: Inspect
// ============================================================================

#[test]
fn inspect_prints_split_summaries() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("data");
    write_batches(&base);
    write_config(dir.path(), &base, "");

    let output = run(dir.path(), &["inspect", "--quiet"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stderr(&output).is_empty());

    let summary: Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(summary["train"]["records"], 3);
    assert_eq!(summary["test"]["records"], 2);
    assert_eq!(summary["train"]["label_encoding"], "one_hot");
    assert_eq!(summary["train"]["image_shape"], serde_json::json!([3, 3, 32, 32]));
    assert_eq!(summary["train"]["class_counts"][6]["class"], "frog");
    assert_eq!(summary["train"]["class_counts"][6]["count"], 2);
    assert_eq!(summary["test"]["class_counts"][8]["class"], "ship");
    assert_eq!(summary["test"]["class_counts"][8]["count"], 1);
}

#[test]
fn inspect_reports_missing_batches() {
    let dir = tempfile::tempdir().unwrap();
    write_config(dir.path(), &dir.path().join("data"), "");
    let output = run(dir.path(), &["inspect", "-q"]);
    assert!(!output.status.success());
    assert!(stderr(&output).starts_with("Failed to load CIFAR-10:"));
    assert!(stdout(&output).is_empty());
}

#[test]
fn inspect_base_path_flag_overrides_config() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("elsewhere");
    write_batches(&base);
    write_config(dir.path(), &dir.path().join("data"), "");
    let output = run(dir.path(), &["inspect", "-q", "--base-path", &toml_path(&base)]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
}

// ============================================================================
// SECTION: Preview
// ============================================================================

#[test]
fn preview_writes_ppm_and_prints_label() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("data");
    write_batches(&base);
    write_config(dir.path(), &base, "");
    let target = dir.path().join("sample.ppm");

    let output = run(
        dir.path(),
        &[
            "preview",
            "-q",
            "--split",
            "train",
            "--index",
            "2",
            "--scale",
            "1",
            "--output",
            &toml_path(&target),
        ],
    );
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).starts_with("train record 2: automobile ("));

    let image = fs::read(&target).unwrap();
    let header = b"P6\n32 32\n255\n";
    assert_eq!(&image[..header.len()], header);
    assert_eq!(image.len(), header.len() + 32 * 32 * 3);
}

#[test]
fn preview_defaults_to_base_path_output() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("data");
    write_batches(&base);
    write_config(dir.path(), &base, "[preview]\nscale = 2\n");

    let output = run(dir.path(), &["preview", "-q"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).starts_with("test record "));
    let image = fs::read(base.join("preview-test.ppm")).unwrap();
    assert!(image.starts_with(b"P6\n64 64\n255\n"));
}

#[test]
fn preview_rejects_out_of_range_index() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("data");
    write_batches(&base);
    write_config(dir.path(), &base, "");

    let output = run(dir.path(), &["preview", "-q", "--index", "2"]);
    assert!(!output.status.success());
    assert_eq!(
        stderr(&output).trim(),
        "Record 2 is out of range for the test split (2 records)."
    );
}

// ============================================================================
// SECTION: Fetch
// ============================================================================

#[test]
fn fetch_downloads_from_file_url_and_reports_progress() {
    let dir = tempfile::tempdir().unwrap();
    let mirror = dir.path().join("mirror.tar.gz");
    write_archive(&mirror);
    let base = dir.path().join("data");
    let url = Url::from_file_path(&mirror).unwrap();
    write_config(dir.path(), &base, &format!("[download]\nurl = \"{url}\"\n"));

    let output = run(dir.path(), &["fetch"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let summary: Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(summary["downloaded"], true);
    assert_eq!(summary["extracted"], true);
    assert!(base.join("cifar-10-batches-bin/train.bin").is_file());
    assert!(base.join("cifar-10-binary.tar.gz").is_file());

    let events = stderr_events(&output);
    assert_eq!(events.first().map(String::as_str), Some("directory_created"));
    assert!(events.contains(&"download_finished".to_string()));
    assert_eq!(events.last().map(String::as_str), Some("extract_finished"));

    let again = run(dir.path(), &["fetch"]);
    assert!(again.status.success(), "stderr: {}", stderr(&again));
    let summary: Value = serde_json::from_str(&stdout(&again)).unwrap();
    assert_eq!(summary["downloaded"], false);
    assert_eq!(summary["extracted"], false);
    assert_eq!(stderr_events(&again), vec!["download_skipped", "extract_skipped"]);
}

#[test]
fn quiet_fetch_emits_no_progress_records() {
    let dir = tempfile::tempdir().unwrap();
    let mirror = dir.path().join("mirror.tar.gz");
    write_archive(&mirror);
    let base = dir.path().join("data");
    let url = Url::from_file_path(&mirror).unwrap();
    write_config(dir.path(), &base, &format!("[download]\nurl = \"{url}\"\n"));

    let output = run(dir.path(), &["--quiet", "fetch"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stderr(&output).is_empty());
}

#[test]
fn inspect_fetch_flag_downloads_first() {
    let dir = tempfile::tempdir().unwrap();
    let mirror = dir.path().join("mirror.tar.gz");
    write_archive(&mirror);
    let base = dir.path().join("data");
    let url = Url::from_file_path(&mirror).unwrap();
    write_config(dir.path(), &base, &format!("[download]\nurl = \"{url}\"\n"));

    let output = run(dir.path(), &["inspect", "-q", "--fetch"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let summary: Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(summary["test"]["records"], 2);
}

// ============================================================================
// SECTION: Misc
// ============================================================================

#[test]
fn version_flag_prints_package_version() {
    let dir = tempfile::tempdir().unwrap();
    let output = run(dir.path(), &["--version"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), format!("cifar-ten {}", env!("CARGO_PKG_VERSION")));
}
