//! Error types for chain execution.
//!
//! Only programming errors and unexpected faults are errors here. Expected
//! domain failures (a rejected order, a declined card) are data: handlers
//! record them on the payload and return [`HandlerResult::Handled`].
//!
//! [`HandlerResult::Handled`]: crate::handler::HandlerResult::Handled

use thiserror::Error;

/// Errors that can surface from [`Chain::execute`](crate::chain::Chain::execute).
///
/// None of these are retried or recovered by the framework.
#[derive(Error, Debug)]
pub enum ChainError {
    /// The chain (or a sub-chain) has no handlers.
    ///
    /// Executing or building an empty chain is a configuration error.
    #[error("Chain is empty. Add handlers first.")]
    EmptyChain,

    /// The request's result slot was read before any handler wrote it.
    #[error("Result not set.")]
    ResultNotSet,

    /// A handler failed unexpectedly.
    ///
    /// The fault is carried unchanged from the handler to the caller of
    /// `execute`; no later handler runs.
    #[error(transparent)]
    Fault(#[from] anyhow::Error),
}

impl ChainError {
    /// Wrap any error as a handler fault.
    pub fn fault<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Fault(anyhow::Error::new(error))
    }

    /// Build a handler fault from a message.
    pub fn fault_msg(message: impl std::fmt::Display) -> Self {
        Self::Fault(anyhow::anyhow!("{message}"))
    }

    /// Whether this error is a configuration error rather than a fault.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::EmptyChain | Self::ResultNotSet)
    }
}

/// Result type alias using [`ChainError`].
pub type Result<T> = std::result::Result<T, ChainError>;
