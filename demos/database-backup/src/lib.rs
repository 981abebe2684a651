//! Database Backup Example
//!
//! A backup pipeline where compression and encryption are not chain members
//! but decorations around the upload step: they rewrite the payload before
//! the upload sees it.
//!
//! ```text
//! Collection ─► compression(encryption(Upload)) ─► timed(Verification)
//! ```
//!
//! # Usage
//!
//! ```
//! use database_backup::{BackupConfig, BackupRequest, backup_chain};
//! use std::time::Duration;
//!
//! # fn main() -> Result<(), composable_chain_core::ChainError> {
//! let config = BackupConfig::builder()
//!     .collected_size(1000)
//!     .delays(Duration::ZERO)
//!     .build();
//! let execution = backup_chain(&config).run(BackupRequest::new("/var/lib/db"))?;
//!
//! let backup = execution.request.payload();
//! assert!(backup.compressed && backup.encrypted);
//! assert_eq!(backup.compressed_size, 600);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod config;

pub use config::{BackupConfig, BackupConfigBuilder};

use chrono::{DateTime, Utc};
use composable_chain_core::prelude::*;
use std::thread;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

fn simulate(delay: Duration) {
    if !delay.is_zero() {
        thread::sleep(delay);
    }
}

//
// ===== Payload =====
//

/// Facts recorded during a backup run
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BackupFact {
    /// Bytes sent by the upload step
    UploadedBytes,
}

/// One backup run. The result slot carries the verified checksum.
#[derive(Clone, Debug, Default)]
pub struct BackupRequest {
    /// Database directory being backed up
    pub source_path: String,
    /// Collected bytes
    pub data: Vec<u8>,
    /// Size before compression
    pub original_size: u64,
    /// Size after compression, zero until compressed
    pub compressed_size: u64,
    /// Set by the compression step
    pub compressed: bool,
    /// Set by the encryption step
    pub encrypted: bool,
    /// Integrity checksum assigned at collection
    pub checksum: String,
    /// When the data was collected
    pub collected_at: Option<DateTime<Utc>>,
}

impl BackupRequest {
    /// Back up `source_path`
    #[must_use]
    pub fn new(source_path: impl Into<String>) -> Self {
        Self {
            source_path: source_path.into(),
            ..Self::default()
        }
    }

    /// Bytes the upload step sends
    #[must_use]
    pub const fn upload_size(&self) -> u64 {
        if self.compressed {
            self.compressed_size
        } else {
            self.original_size
        }
    }
}

impl Payload for BackupRequest {
    type Outcome = String;
    type Fact = BackupFact;
}

/// Faults that abort a backup
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackupError {
    /// Upload was reached without collected data
    #[error("Nothing collected from {source_path}")]
    NothingCollected {
        /// Source that produced no data
        source_path: String,
    },
}

//
// ===== Handlers =====
//

/// Reads the database files.
#[derive(Debug, Clone)]
pub struct CollectionHandler {
    size: usize,
    delay: Duration,
}

impl CollectionHandler {
    /// Collect `size` bytes
    #[must_use]
    pub const fn new(size: usize, delay: Duration) -> Self {
        Self { size, delay }
    }
}

impl Handler<BackupRequest> for CollectionHandler {
    fn name(&self) -> &str {
        "DatabaseCollection"
    }

    fn process(&self, request: &mut Request<BackupRequest>) -> Result<HandlerResult> {
        let backup = request.payload_mut();
        tracing::info!(source = %backup.source_path, "Collecting data");
        simulate(self.delay);

        backup.data = vec![0; self.size];
        backup.original_size = backup.data.len() as u64;
        backup.collected_at = Some(Utc::now());
        backup.checksum = Uuid::new_v4().simple().to_string();

        tracing::info!(bytes = backup.original_size, "Collected");
        Ok(HandlerResult::Continue)
    }
}

/// Sends the backup to cloud storage.
#[derive(Debug, Clone, Default)]
pub struct UploadHandler {
    delay: Duration,
}

impl UploadHandler {
    /// Upload, taking `delay`
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Handler<BackupRequest> for UploadHandler {
    fn name(&self) -> &str {
        "CloudUpload"
    }

    fn process(&self, request: &mut Request<BackupRequest>) -> Result<HandlerResult> {
        let backup = request.payload();
        if backup.data.is_empty() {
            return Err(ChainError::fault(BackupError::NothingCollected {
                source_path: backup.source_path.clone(),
            }));
        }

        tracing::info!(source = %backup.source_path, "Uploading");
        simulate(self.delay);
        let size = backup.upload_size();
        request.annotate(
            BackupFact::UploadedBytes,
            i64::try_from(size).unwrap_or(i64::MAX),
        );
        tracing::info!(bytes = size, "Uploaded");
        Ok(HandlerResult::Continue)
    }
}

/// Confirms the uploaded backup and publishes its checksum.
#[derive(Debug, Clone, Default)]
pub struct VerificationHandler {
    delay: Duration,
}

impl VerificationHandler {
    /// Verify, taking `delay`
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Handler<BackupRequest> for VerificationHandler {
    fn name(&self) -> &str {
        "Verification"
    }

    fn process(&self, request: &mut Request<BackupRequest>) -> Result<HandlerResult> {
        tracing::info!("Verifying backup integrity");
        simulate(self.delay);
        let checksum = request.payload().checksum.clone();
        tracing::info!(checksum = %checksum, "Verified");
        request.set_result(checksum);
        Ok(HandlerResult::Handled)
    }
}

//
// ===== Payload transforms =====
//

/// Compression applied ahead of the wrapped step. Already compressed
/// payloads are left alone.
pub fn compression(ratio: f64, delay: Duration) -> impl Fn(&mut BackupRequest) + Send + Sync {
    move |backup: &mut BackupRequest| {
        if backup.compressed {
            return;
        }
        tracing::info!("Compressing data");
        simulate(delay);
        backup.compressed_size = scaled(backup.original_size, ratio);
        backup.compressed = true;
        tracing::info!(
            original = backup.original_size,
            compressed = backup.compressed_size,
            "Compression completed"
        );
    }
}

/// Encryption applied ahead of the wrapped step. Only the first eight
/// characters of `key` appear in logs.
pub fn encryption(key: String, delay: Duration) -> impl Fn(&mut BackupRequest) + Send + Sync {
    move |backup: &mut BackupRequest| {
        tracing::info!(algorithm = "AES-256", key = %mask_key(&key), "Encrypting");
        simulate(delay);
        backup.encrypted = true;
        tracing::info!("Encryption completed");
    }
}

/// First eight characters of `key` followed by `***`.
#[must_use]
pub fn mask_key(key: &str) -> String {
    let visible: String = key.chars().take(8).collect();
    format!("{visible}***")
}

#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn scaled(size: u64, ratio: f64) -> u64 {
    (size as f64 * ratio.clamp(0.0, 1.0)) as u64
}

/// The backup pipeline.
#[must_use]
pub fn backup_chain(config: &BackupConfig) -> Chain<BackupRequest> {
    let upload = UploadHandler::new(config.upload_delay)
        .transformed(
            "encryption",
            encryption(config.encryption_key.clone(), config.encryption_delay),
        )
        .transformed(
            "compression",
            compression(config.compression_ratio, config.compression_delay),
        )
        .logged("upload");

    Chain::with_config(ChainConfig::labelled("database-backup"))
        .add_handler(CollectionHandler::new(
            config.collected_size,
            config.collection_delay,
        ))
        .add_handler(upload)
        .add_handler(VerificationHandler::new(config.verification_delay).timed())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collected(size: usize) -> Request<BackupRequest> {
        let mut request = Request::new(BackupRequest::new("/db"));
        CollectionHandler::new(size, Duration::ZERO)
            .handle(&mut request)
            .unwrap();
        request
    }

    #[test]
    fn test_collection_fills_data() {
        let request = collected(2048);
        let backup = request.payload();
        assert_eq!(backup.original_size, 2048);
        assert_eq!(backup.checksum.len(), 32);
        assert!(backup.collected_at.is_some());
    }

    #[test]
    fn test_compression_is_idempotent() {
        let compress = compression(0.5, Duration::ZERO);
        let mut backup = BackupRequest {
            original_size: 1000,
            ..BackupRequest::default()
        };

        compress(&mut backup);
        assert_eq!(backup.compressed_size, 500);

        backup.original_size = 4000;
        compress(&mut backup);
        assert_eq!(backup.compressed_size, 500);
    }

    #[test]
    fn test_mask_key() {
        assert_eq!(mask_key("AES256Key"), "AES256Ke***");
        assert_eq!(mask_key("short"), "short***");
    }

    #[test]
    fn test_upload_reports_compressed_size() {
        let mut request = collected(1000);
        let upload =
            UploadHandler::default().transformed("compression", compression(0.6, Duration::ZERO));

        upload.handle(&mut request).unwrap();

        assert_eq!(
            request
                .fact(BackupFact::UploadedBytes)
                .and_then(MetadataValue::as_count),
            Some(600)
        );
    }

    #[test]
    fn test_upload_without_data_faults() {
        let mut request = Request::new(BackupRequest::new("/empty"));
        let error = UploadHandler::default().handle(&mut request).unwrap_err();
        assert_eq!(error.to_string(), "Nothing collected from /empty");
    }

    #[test]
    fn test_verification_publishes_checksum() {
        let mut request = collected(10);
        let result = VerificationHandler::default().handle(&mut request).unwrap();

        assert_eq!(result, HandlerResult::Handled);
        assert_eq!(request.result().unwrap(), &request.payload().checksum);
    }
}
