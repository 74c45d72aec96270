// crates/cifar-ten/tests/common/mod.rs
// ============================================================================
// Module: Common Test Utilities
// Description: Shared fixtures for cifar-ten integration tests.
// Purpose: Build synthetic batches, archives, and capture reporter output.
// Dependencies: cifar-ten, flate2, tar, tempfile
// ============================================================================

//! ## Overview
//! Synthetic CIFAR-10 batches use the real record layout with deterministic
//! pixel bytes so tests can assert exact values without the 160 MB release.

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
    clippy::cast_possible_truncation,
    dead_code,
    missing_docs,
    clippy::missing_docs_in_private_items
)]

use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;

use cifar_ten::Cifar10;
use flate2::Compression;
use flate2::write::GzEncoder;
use serde_json::Value;
use tar::EntryType;
use tar::Header;

// ============================================================================
// SECTION: Batch Helpers
// ============================================================================

/// Bytes per record in the binary layout.
pub const RECORD_BYTES: usize = 3073;

/// Pixel byte for a record, channel, and in-plane offset.
pub fn pixel_value(record: usize, channel: usize, offset: usize) -> u8 {
    ((record * 7 + channel * 31 + offset) % 251) as u8
}

/// Builds a batch whose records carry the given labels.
pub fn synthetic_batch(labels: &[u8]) -> Vec<u8> {
    synthetic_batch_from(0, labels)
}

/// Builds a batch whose first record has global index `first_record`.
pub fn synthetic_batch_from(first_record: usize, labels: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(labels.len() * RECORD_BYTES);
    for (offset, label) in labels.iter().enumerate() {
        let record = first_record + offset;
        bytes.push(*label);
        for channel in 0..3 {
            for pixel in 0..1024 {
                bytes.push(pixel_value(record, channel, pixel));
            }
        }
    }
    bytes
}

/// Writes batch files under `root/data_dir`.
pub fn write_batches(root: &Path, data_dir: &str, files: &[(&str, Vec<u8>)]) {
    let dir = root.join(data_dir);
    fs::create_dir_all(&dir).unwrap();
    for (name, bytes) in files {
        fs::write(dir.join(name), bytes).unwrap();
    }
}

/// Labels used by [`small_layout`]: two training files and one test file.
pub const TRAIN_LABELS_A: [u8; 3] = [0, 1, 2];
pub const TRAIN_LABELS_B: [u8; 2] = [9, 5];
pub const TEST_LABELS: [u8; 2] = [3, 8];

/// Returns the small batch set as `(file name, bytes)` pairs.
pub fn small_batch_files() -> Vec<(&'static str, Vec<u8>)> {
    vec![
        ("data_batch_1.bin", synthetic_batch_from(0, &TRAIN_LABELS_A)),
        ("data_batch_2.bin", synthetic_batch_from(TRAIN_LABELS_A.len(), &TRAIN_LABELS_B)),
        ("test_batch.bin", synthetic_batch(&TEST_LABELS)),
    ]
}

/// Writes the small batch set under `root` and returns a matching builder.
pub fn small_layout(root: &Path) -> Cifar10 {
    write_batches(root, "cifar-10-batches-bin", &small_batch_files());
    small_builder(root)
}

/// Builder for the small batch set without writing any files.
pub fn small_builder(root: &Path) -> Cifar10 {
    Cifar10::default()
        .base_path(root)
        .training_bin_paths(["data_batch_1.bin", "data_batch_2.bin"])
        .testing_bin_paths(["test_batch.bin"])
        .num_records_train(TRAIN_LABELS_A.len() + TRAIN_LABELS_B.len())
        .num_records_test(TEST_LABELS.len())
}

// ============================================================================
// SECTION: Archive Helpers
// ============================================================================

/// Builds a gzip-compressed tar archive from `(path, bytes)` entries.
pub fn tar_gz(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let encoder = GzEncoder::new(Vec::new(), Compression::fast());
    let mut builder = tar::Builder::new(encoder);
    for (path, data) in entries {
        let mut header = Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_entry_type(EntryType::Regular);
        builder.append_data(&mut header, path, *data).unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap()
}

/// Builds a release-shaped archive holding the small batch set.
pub fn small_release_archive() -> Vec<u8> {
    let files = small_batch_files();
    let paths: Vec<String> =
        files.iter().map(|(name, _)| format!("cifar-10-batches-bin/{name}")).collect();
    let entries: Vec<(&str, &[u8])> = paths
        .iter()
        .zip(files.iter())
        .map(|(path, (_, bytes))| (path.as_str(), bytes.as_slice()))
        .collect();
    tar_gz(&entries)
}

/// Builds an archive with a single raw header, bypassing path sanitising.
pub fn tar_gz_raw(name: &[u8], entry_type: EntryType, data: &[u8]) -> Vec<u8> {
    let encoder = GzEncoder::new(Vec::new(), Compression::fast());
    let mut builder = tar::Builder::new(encoder);
    let mut header = Header::new_gnu();
    {
        let gnu = header.as_gnu_mut().unwrap();
        gnu.name[..name.len()].copy_from_slice(name);
    }
    header.set_size(data.len() as u64);
    header.set_mode(0o644);
    header.set_entry_type(entry_type);
    header.set_cksum();
    builder.append(&header, data).unwrap();
    builder.into_inner().unwrap().finish().unwrap()
}

// ============================================================================
// SECTION: Shared Buffer for Reporter Output
// ============================================================================

/// A thread-safe buffer for capturing reporter records.
#[derive(Clone, Default)]
pub struct SharedBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    /// Creates a new empty shared buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the contents as a string.
    pub fn to_string_lossy(&self) -> String {
        let guard = self.inner.lock().expect("buffer lock");
        String::from_utf8_lossy(&guard).to_string()
    }

    /// Parses each line as a JSON record.
    pub fn records(&self) -> Vec<Value> {
        self.to_string_lossy()
            .lines()
            .map(|line| serde_json::from_str(line).expect("json record"))
            .collect()
    }

    /// Returns the `detail.event` names in order.
    pub fn event_names(&self) -> Vec<String> {
        self.records()
            .iter()
            .map(|record| record["detail"]["event"].as_str().unwrap_or_default().to_string())
            .collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.inner.lock().expect("buffer lock").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
