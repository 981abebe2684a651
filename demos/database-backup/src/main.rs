//! Database backup example binary
//!
//! Runs one backup with compression and encryption applied to the upload,
//! then prints a summary.

use anyhow::Context;
use composable_chain_core::metrics::describe_metrics;
use database_backup::{BackupConfig, BackupFact, BackupRequest, backup_chain, mask_key};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "database_backup=info,composable_chain_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
    describe_metrics();

    println!("=== Database Backup: Decorated Chain ===\n");

    let config = BackupConfig::default();
    let execution = backup_chain(&config)
        .run(BackupRequest::new("/var/lib/postgresql/data"))
        .context("running backup")?;

    let request = &execution.request;
    let backup = request.payload();
    let checksum = request.result().context("backup finished without a checksum")?;

    println!("\n--- BACKUP SUMMARY ---");
    println!("Source:      {}", backup.source_path);
    if let Some(collected_at) = backup.collected_at {
        println!("Collected:   {}", collected_at.to_rfc3339());
    }
    println!("Original:    {} bytes", backup.original_size);
    println!("Compressed:  {} bytes", backup.compressed_size);
    println!("Encrypted:   {} (key {})", backup.encrypted, mask_key(&config.encryption_key));
    if let Some(uploaded) = request
        .fact(BackupFact::UploadedBytes)
        .and_then(|value| value.as_count())
    {
        println!("Uploaded:    {uploaded} bytes");
    }
    println!("Checksum:    {checksum}");
    println!("----------------------");

    Ok(())
}
