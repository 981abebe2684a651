//! Backup configuration.

use std::time::Duration;

/// Settings for the backup pipeline.
///
/// # Default Values
///
/// - `collected_size`: 10 MiB
/// - `compression_ratio`: `0.6`
/// - `encryption_key`: `"AES256Key"`
/// - `collection_delay`: 300ms
/// - `compression_delay`: 300ms
/// - `encryption_delay`: 300ms
/// - `upload_delay`: 1s
/// - `verification_delay`: 200ms
#[derive(Debug, Clone, PartialEq)]
pub struct BackupConfig {
    /// Bytes read from the source
    pub collected_size: usize,
    /// Compressed size as a fraction of the original
    pub compression_ratio: f64,
    /// Key used by the encryption step; only its prefix is ever logged
    pub encryption_key: String,
    /// Simulated read time
    pub collection_delay: Duration,
    /// Simulated compression time
    pub compression_delay: Duration,
    /// Simulated encryption time
    pub encryption_delay: Duration,
    /// Simulated upload time
    pub upload_delay: Duration,
    /// Simulated verification time
    pub verification_delay: Duration,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            collected_size: 10 * 1024 * 1024,
            compression_ratio: 0.6,
            encryption_key: "AES256Key".to_string(),
            collection_delay: Duration::from_millis(300),
            compression_delay: Duration::from_millis(300),
            encryption_delay: Duration::from_millis(300),
            upload_delay: Duration::from_secs(1),
            verification_delay: Duration::from_millis(200),
        }
    }
}

impl BackupConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> BackupConfigBuilder {
        BackupConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`BackupConfig`].
#[derive(Debug, Clone)]
pub struct BackupConfigBuilder {
    config: BackupConfig,
}

impl BackupConfigBuilder {
    /// Set the number of bytes collected.
    #[must_use]
    pub fn collected_size(mut self, bytes: usize) -> Self {
        self.config.collected_size = bytes;
        self
    }

    /// Set the compression ratio, clamped to `0.0..=1.0`.
    #[must_use]
    pub fn compression_ratio(mut self, ratio: f64) -> Self {
        self.config.compression_ratio = ratio.clamp(0.0, 1.0);
        self
    }

    /// Set the encryption key.
    #[must_use]
    pub fn encryption_key(mut self, key: impl Into<String>) -> Self {
        self.config.encryption_key = key.into();
        self
    }

    /// Set every simulated delay at once.
    #[must_use]
    pub fn delays(mut self, delay: Duration) -> Self {
        self.config.collection_delay = delay;
        self.config.compression_delay = delay;
        self.config.encryption_delay = delay;
        self.config.upload_delay = delay;
        self.config.verification_delay = delay;
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> BackupConfig {
        self.config
    }
}
