// crates/cifar-ten-config/src/config.rs
// ============================================================================
// Module: CIFAR-Ten Configuration
// Description: Configuration loading and validation for cifar-ten.toml.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: cifar-ten, serde, toml, url
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Every section has defaults matching the official CIFAR-10 release, so an
//! empty file is valid. Invalid values fail closed before any download or
//! parse starts.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use cifar_ten::Cifar10;
use cifar_ten::DEFAULT_ARCHIVE_NAME;
use cifar_ten::DEFAULT_DOWNLOAD_URL;
use cifar_ten::DownloadPolicy;
use cifar_ten::MAX_BATCH_FILE_BYTES;
use cifar_ten::dataset::DEFAULT_BASE_PATH;
use cifar_ten::dataset::DEFAULT_DATA_DIR;
use cifar_ten::dataset::PREVIEW_SCALE;
use cifar_ten::layout::RECORD_BYTES;
use cifar_ten::layout::TEST_BATCH_FILES;
use cifar_ten::layout::TEST_RECORDS;
use cifar_ten::layout::TRAIN_BATCH_FILES;
use cifar_ten::layout::TRAIN_RECORDS;
use cifar_ten::preview::MAX_SCALE;
use cifar_ten::source::DEFAULT_MAX_DOWNLOAD_BYTES;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use url::Url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
pub const DEFAULT_CONFIG_NAME: &str = "cifar-ten.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "CIFAR_TEN_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum number of batch files per split.
pub(crate) const MAX_BATCH_FILES: usize = 64;
/// Maximum number of allowlisted download hosts.
pub(crate) const MAX_ALLOWED_HOSTS: usize = 64;
/// Maximum length of an allowlisted host.
pub(crate) const MAX_HOST_LENGTH: usize = 253;
/// Upper bound for the download cap (4 GiB).
pub(crate) const MAX_DOWNLOAD_BYTES_LIMIT: u64 = 4 * 1024 * 1024 * 1024;
/// Default transfer timeout in seconds.
pub(crate) const DEFAULT_TIMEOUT_SECS: u64 = 30 * 60;
/// Maximum transfer timeout in seconds.
pub(crate) const MAX_TIMEOUT_SECS: u64 = 24 * 60 * 60;
/// Length of a hex-encoded SHA-256 digest.
const SHA256_HEX_LENGTH: usize = 64;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// CIFAR-Ten tool configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CifarTenConfig {
    /// Data set location and decoding options.
    #[serde(default)]
    pub dataset: DatasetConfig,
    /// Archive download options.
    #[serde(default)]
    pub download: DownloadConfig,
    /// Sample preview options.
    #[serde(default)]
    pub preview: PreviewConfig,
}

impl CifarTenConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration when a file is present, otherwise returns defaults.
    ///
    /// An explicit `path` or a set [`CONFIG_ENV_VAR`] must exist; only the
    /// implicit default filename may be absent.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        let explicit = path.is_some() || env::var_os(CONFIG_ENV_VAR).is_some();
        if !explicit && !Path::new(DEFAULT_CONFIG_NAME).exists() {
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.dataset.validate()?;
        self.download.validate()?;
        self.preview.validate()?;
        Ok(())
    }

    /// Builds a data set builder from the configuration.
    #[must_use]
    pub fn to_builder(&self) -> Cifar10 {
        let dataset = &self.dataset;
        let download = &self.download;
        let mut builder = Cifar10::default()
            .base_path(&dataset.base_path)
            .cifar_data_path(&dataset.data_dir)
            .training_bin_paths(&dataset.training_files)
            .testing_bin_paths(&dataset.testing_files)
            .num_records_train(dataset.num_records_train)
            .num_records_test(dataset.num_records_test)
            .encode_one_hot(dataset.encode_one_hot)
            .download_and_extract(dataset.download_and_extract)
            .show_images(self.preview.enabled)
            .preview_scale(self.preview.scale)
            .download_url(download.url.as_str())
            .archive_name(download.archive_name.as_str())
            .max_download_bytes(download.max_bytes)
            .download_policy(download.policy());
        if let Some(digest) = &download.expected_sha256 {
            builder = builder.expected_sha256(digest.as_str());
        }
        builder
    }
}

/// Data set location and decoding options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Root directory for the archive and extracted data.
    #[serde(default = "default_base_path")]
    pub base_path: String,
    /// Batch directory relative to `base_path`.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    /// Training batch files relative to the batch directory.
    #[serde(default = "default_training_files")]
    pub training_files: Vec<String>,
    /// Test batch files relative to the batch directory.
    #[serde(default = "default_testing_files")]
    pub testing_files: Vec<String>,
    /// Training records to decode.
    #[serde(default = "default_num_records_train")]
    pub num_records_train: usize,
    /// Test records to decode.
    #[serde(default = "default_num_records_test")]
    pub num_records_test: usize,
    /// Emit one-hot label rows instead of class indices.
    #[serde(default = "default_true")]
    pub encode_one_hot: bool,
    /// Fetch the archive before parsing.
    #[serde(default)]
    pub download_and_extract: bool,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            base_path: default_base_path(),
            data_dir: default_data_dir(),
            training_files: default_training_files(),
            testing_files: default_testing_files(),
            num_records_train: default_num_records_train(),
            num_records_test: default_num_records_test(),
            encode_one_hot: true,
            download_and_extract: false,
        }
    }
}

impl DatasetConfig {
    /// Validates data set paths and record counts.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_path_string("dataset.base_path", &self.base_path)?;
        validate_relative_path("dataset.data_dir", &self.data_dir)?;
        validate_batch_files("dataset.training_files", &self.training_files)?;
        validate_batch_files("dataset.testing_files", &self.testing_files)?;
        validate_record_count(
            "dataset.num_records_train",
            self.num_records_train,
            self.training_files.len(),
        )?;
        validate_record_count(
            "dataset.num_records_test",
            self.num_records_test,
            self.testing_files.len(),
        )?;
        Ok(())
    }

    /// Returns the batch directory joined onto the base path.
    #[must_use]
    pub fn resolved_data_dir(&self) -> PathBuf {
        Path::new(&self.base_path).join(&self.data_dir)
    }
}

/// Archive download options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Archive source URL (`https`, `http`, or `file`).
    #[serde(default = "default_url")]
    pub url: String,
    /// Archive filename stored under the base path.
    #[serde(default = "default_archive_name")]
    pub archive_name: String,
    /// Accept plain `http` URLs.
    #[serde(default)]
    pub allow_http: bool,
    /// Allow private, loopback, and link-local hosts.
    #[serde(default)]
    pub allow_private_networks: bool,
    /// Optional host allowlist; `*.example.org` matches subdomains.
    #[serde(default)]
    pub allowed_hosts: Option<Vec<String>>,
    /// Optional expected SHA-256 of the archive, hex encoded.
    #[serde(default)]
    pub expected_sha256: Option<String>,
    /// Download byte cap.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,
    /// End-to-end transfer timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            archive_name: default_archive_name(),
            allow_http: false,
            allow_private_networks: false,
            allowed_hosts: None,
            expected_sha256: None,
            max_bytes: default_max_bytes(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl DownloadConfig {
    /// Validates the URL, archive name, digest, and limits.
    fn validate(&self) -> Result<(), ConfigError> {
        let url = Url::parse(self.url.trim())
            .map_err(|err| ConfigError::Invalid(format!("download.url is invalid: {err}")))?;
        match url.scheme() {
            "https" | "file" => {}
            "http" if self.allow_http => {}
            "http" => {
                return Err(ConfigError::Invalid(
                    "download.url uses http but download.allow_http is false".to_string(),
                ));
            }
            scheme => {
                return Err(ConfigError::Invalid(format!(
                    "download.url scheme {scheme} is not supported"
                )));
            }
        }
        validate_file_name("download.archive_name", &self.archive_name)?;
        if let Some(hosts) = &self.allowed_hosts {
            if hosts.len() > MAX_ALLOWED_HOSTS {
                return Err(ConfigError::Invalid("too many download.allowed_hosts".to_string()));
            }
            for host in hosts {
                let trimmed = host.trim();
                if trimmed.is_empty() || trimmed.len() > MAX_HOST_LENGTH {
                    return Err(ConfigError::Invalid(
                        "download.allowed_hosts entries must be 1-253 characters".to_string(),
                    ));
                }
            }
        }
        if let Some(digest) = &self.expected_sha256 {
            let digest = digest.trim();
            if digest.len() != SHA256_HEX_LENGTH || !digest.chars().all(|c| c.is_ascii_hexdigit())
            {
                return Err(ConfigError::Invalid(
                    "download.expected_sha256 must be 64 hex characters".to_string(),
                ));
            }
        }
        if self.max_bytes == 0 || self.max_bytes > MAX_DOWNLOAD_BYTES_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "download.max_bytes must be between 1 and {MAX_DOWNLOAD_BYTES_LIMIT}"
            )));
        }
        if self.timeout_secs == 0 || self.timeout_secs > MAX_TIMEOUT_SECS {
            return Err(ConfigError::Invalid(format!(
                "download.timeout_secs must be between 1 and {MAX_TIMEOUT_SECS}"
            )));
        }
        Ok(())
    }

    /// Returns the HTTP download policy for these options.
    #[must_use]
    pub fn policy(&self) -> DownloadPolicy {
        let mut policy = DownloadPolicy::new().timeout(Duration::from_secs(self.timeout_secs));
        if self.allow_http {
            policy = policy.allow_http();
        }
        if self.allow_private_networks {
            policy = policy.allow_private_networks();
        }
        if let Some(hosts) = &self.allowed_hosts {
            policy = policy.allow_hosts(hosts.iter().map(|host| host.trim()));
        }
        policy
    }
}

/// Sample preview options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewConfig {
    /// Write a preview of a random sample per split after parsing.
    #[serde(default)]
    pub enabled: bool,
    /// Upscale factor for sample previews and the CLI `preview` command.
    #[serde(default = "default_preview_scale")]
    pub scale: usize,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            scale: default_preview_scale(),
        }
    }
}

impl PreviewConfig {
    /// Validates the preview scale.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.scale == 0 || self.scale > MAX_SCALE {
            return Err(ConfigError::Invalid(format!(
                "preview.scale must be between 1 and {MAX_SCALE}"
            )));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Default base directory.
fn default_base_path() -> String {
    DEFAULT_BASE_PATH.to_string()
}

/// Default batch directory.
fn default_data_dir() -> String {
    DEFAULT_DATA_DIR.to_string()
}

/// Release training batch names.
fn default_training_files() -> Vec<String> {
    TRAIN_BATCH_FILES.iter().map(ToString::to_string).collect()
}

/// Release test batch names.
fn default_testing_files() -> Vec<String> {
    TEST_BATCH_FILES.iter().map(ToString::to_string).collect()
}

/// Release training record count.
const fn default_num_records_train() -> usize {
    TRAIN_RECORDS
}

/// Release test record count.
const fn default_num_records_test() -> usize {
    TEST_RECORDS
}

/// Serde default helper.
const fn default_true() -> bool {
    true
}

/// Official archive URL.
fn default_url() -> String {
    DEFAULT_DOWNLOAD_URL.to_string()
}

/// Official archive filename.
fn default_archive_name() -> String {
    DEFAULT_ARCHIVE_NAME.to_string()
}

/// Default download cap.
const fn default_max_bytes() -> u64 {
    DEFAULT_MAX_DOWNLOAD_BYTES
}

/// Default transfer timeout.
const fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Default preview scale.
const fn default_preview_scale() -> usize {
    PREVIEW_SCALE
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        if component.as_os_str().to_string_lossy().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates a path that must stay below its parent directory.
fn validate_relative_path(field: &str, value: &str) -> Result<(), ConfigError> {
    validate_path_string(field, value)?;
    for component in Path::new(value.trim()).components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(ConfigError::Invalid(format!("{field} must be a relative path")));
            }
        }
    }
    Ok(())
}

/// Validates a bare file name.
fn validate_file_name(field: &str, value: &str) -> Result<(), ConfigError> {
    validate_relative_path(field, value)?;
    if Path::new(value.trim()).components().count() != 1 {
        return Err(ConfigError::Invalid(format!("{field} must be a file name")));
    }
    Ok(())
}

/// Validates a split's batch file list.
fn validate_batch_files(field: &str, files: &[String]) -> Result<(), ConfigError> {
    if files.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if files.len() > MAX_BATCH_FILES {
        return Err(ConfigError::Invalid(format!("{field} has more than {MAX_BATCH_FILES} entries")));
    }
    for file in files {
        validate_relative_path(field, file)?;
    }
    Ok(())
}

/// Validates that `records` fit in `files` batch files of maximum size.
fn validate_record_count(field: &str, records: usize, files: usize) -> Result<(), ConfigError> {
    let per_file = MAX_BATCH_FILE_BYTES / RECORD_BYTES as u64;
    let capacity = per_file.saturating_mul(files as u64);
    if records as u64 > capacity {
        return Err(ConfigError::Invalid(format!(
            "{field} exceeds the {capacity} records the configured files can hold"
        )));
    }
    Ok(())
}
