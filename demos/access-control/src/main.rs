//! Access control example binary
//!
//! Reads a batch of login attempts from JSON and prints the decision for
//! each.

use access_control::{AccessConfig, AuthRequest, access_chain};
use anyhow::Context;
use composable_chain_core::metrics::describe_metrics;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const ATTEMPTS: &str = r#"[
    { "username": "alice", "password": "secret123", "role": "User", "ipAddress": "203.0.113.7" },
    { "username": "root", "password": "secret123", "role": "Admin", "ipAddress": "10.0.0.1" },
    { "username": "mallory", "password": "secret123", "role": "Admin", "ipAddress": "198.51.100.23" },
    { "username": "guest", "password": "secret123", "role": "Guest", "ipAddress": "203.0.113.8" },
    { "username": "bob", "password": "hunter2", "role": "User", "ipAddress": "203.0.113.9" },
    { "username": "", "role": "User" }
]"#;

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "access_control=info,composable_chain_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
    describe_metrics();

    println!("=== Access Control: Chain of Responsibility ===\n");

    let attempts: Vec<AuthRequest> =
        serde_json::from_str(ATTEMPTS).context("parsing login attempts")?;
    let chain = access_chain(&AccessConfig::default());

    for attempt in attempts {
        let user = if attempt.username.is_empty() {
            "<anonymous>".to_string()
        } else {
            attempt.username.clone()
        };
        let execution = chain
            .run(attempt)
            .with_context(|| format!("checking access for {user}"))?;
        let decision = execution
            .request
            .result()
            .with_context(|| format!("no decision for {user}"))?;
        println!("{user:>12} -> {decision}\n");
    }

    Ok(())
}
