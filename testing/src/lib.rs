//! # Composable Chain Testing
//!
//! Testing utilities and helpers for chains built with `composable-chain-core`.
//!
//! This crate provides:
//! - Test doubles for chain members ([`Recording`], [`Fixed`], [`Faulty`])
//! - A shared visit log ([`Journal`])
//! - A Given-When-Then harness ([`ChainTest`])
//! - Assertion helpers over journals
//! - Tracing setup for tests
//!
//! ## Example
//!
//! ```
//! use composable_chain_core::prelude::*;
//! use composable_chain_testing::{Journal, Recording, assertions};
//!
//! struct Job;
//!
//! impl Payload for Job {
//!     type Outcome = ();
//!     type Fact = NoFacts;
//! }
//!
//! let journal = Journal::new();
//! let chain = Chain::<Job>::new()
//!     .add_handler(Recording::new("skipped", &journal).rejecting())
//!     .add_handler(Recording::new("ran", &journal));
//!
//! chain.run(Job)?;
//! assertions::assert_visited(&journal, &["ran"]);
//! assertions::assert_not_visited(&journal, "skipped");
//! # Ok::<(), ChainError>(())
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

mod handler_mocks;

pub use chain_test::{ChainTest, assertions};
pub use handler_mocks::{Faulty, Fixed, Journal, Recording};

/// Property-based testing utilities using proptest.
pub mod properties {
    use crate::{Journal, Recording};
    use composable_chain_core::{Chain, HandlerResult, Payload};
    use proptest::prelude::*;

    /// Any handler result
    pub fn handler_result() -> impl Strategy<Value = HandlerResult> {
        prop_oneof![
            Just(HandlerResult::Handled),
            Just(HandlerResult::Continue),
            Just(HandlerResult::Skip),
        ]
    }

    /// Results that let traversal advance
    pub fn advancing_result() -> impl Strategy<Value = HandlerResult> {
        prop_oneof![Just(HandlerResult::Continue), Just(HandlerResult::Skip)]
    }

    /// A chain of [`Recording`] handlers named `"0"`, `"1"`, ... returning
    /// `results` in order.
    #[must_use]
    pub fn recording_chain<P: Payload>(journal: &Journal, results: &[HandlerResult]) -> Chain<P> {
        results
            .iter()
            .enumerate()
            .fold(Chain::new(), |chain, (index, &result)| {
                chain.add_handler(Recording::new(index.to_string(), journal).returning(result))
            })
    }
}

/// Install a test-friendly `tracing` subscriber.
///
/// Honours `RUST_LOG` and defaults to `debug`. Output goes through the test
/// writer so it is captured per test. Safe to call from every test; only the
/// first call installs anything.
pub fn init_test_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init()
        .ok();
}
