//! Test doubles for chain members.
//!
//! All doubles work for any payload type and report their visits to a shared
//! [`Journal`], so a test can assert on traversal order without touching the
//! payload.

use composable_chain_core::{ChainError, Handler, HandlerResult, Payload, Request, Result};
use std::sync::{Arc, Mutex, PoisonError};

/// Shared, ordered log of handler visits.
///
/// Cloning a journal yields another handle onto the same log.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    entries: Arc<Mutex<Vec<String>>>,
}

impl Journal {
    /// Create an empty journal
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry
    pub fn record(&self, entry: impl Into<String>) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry.into());
    }

    /// Snapshot of all entries in order
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether `entry` was recorded at least once
    #[must_use]
    pub fn contains(&self, entry: &str) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|e| e == entry)
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether nothing was recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop all entries
    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

/// Records its name in a journal and returns a configured result.
///
/// # Example
///
/// ```
/// use composable_chain_core::prelude::*;
/// use composable_chain_testing::{Journal, Recording};
///
/// struct Job;
///
/// impl Payload for Job {
///     type Outcome = ();
///     type Fact = NoFacts;
/// }
///
/// let journal = Journal::new();
/// let chain = Chain::<Job>::new()
///     .add_handler(Recording::new("first", &journal))
///     .add_handler(Recording::new("second", &journal).returning(HandlerResult::Handled))
///     .add_handler(Recording::new("third", &journal));
///
/// chain.run(Job)?;
/// assert_eq!(journal.entries(), vec!["first", "second"]);
/// # Ok::<(), ChainError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Recording {
    name: String,
    journal: Journal,
    result: HandlerResult,
    admits: bool,
}

impl Recording {
    /// A recording handler that admits every request and returns `Continue`.
    #[must_use]
    pub fn new(name: impl Into<String>, journal: &Journal) -> Self {
        Self {
            name: name.into(),
            journal: journal.clone(),
            result: HandlerResult::Continue,
            admits: true,
        }
    }

    /// Return `result` from `process`.
    #[must_use]
    pub fn returning(mut self, result: HandlerResult) -> Self {
        self.result = result;
        self
    }

    /// Reject every request at the gate.
    #[must_use]
    pub fn rejecting(mut self) -> Self {
        self.admits = false;
        self
    }
}

impl<P: Payload> Handler<P> for Recording {
    fn name(&self) -> &str {
        &self.name
    }

    fn can_handle(&self, _request: &Request<P>) -> bool {
        self.admits
    }

    fn process(&self, _request: &mut Request<P>) -> Result<HandlerResult> {
        self.journal.record(self.name.clone());
        Ok(self.result)
    }
}

/// Writes a fixed outcome into the result slot and returns a fixed result.
#[derive(Debug, Clone)]
pub struct Fixed<O> {
    outcome: O,
    result: HandlerResult,
}

impl<O> Fixed<O> {
    /// Set `outcome` and return `result`.
    pub const fn new(outcome: O, result: HandlerResult) -> Self {
        Self { outcome, result }
    }
}

impl<P, O> Handler<P> for Fixed<O>
where
    P: Payload<Outcome = O>,
    O: Clone + Send + Sync + 'static,
{
    fn process(&self, request: &mut Request<P>) -> Result<HandlerResult> {
        request.set_result(self.outcome.clone());
        Ok(self.result)
    }
}

/// Fails every visit with an unexpected fault.
#[derive(Debug, Clone)]
pub struct Faulty {
    message: String,
    journal: Option<Journal>,
}

impl Faulty {
    /// Fault with `message`.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            journal: None,
        }
    }

    /// Record the visit as `"faulty"` before failing.
    #[must_use]
    pub fn recorded(mut self, journal: &Journal) -> Self {
        self.journal = Some(journal.clone());
        self
    }
}

impl<P: Payload> Handler<P> for Faulty {
    fn process(&self, _request: &mut Request<P>) -> Result<HandlerResult> {
        if let Some(journal) = &self.journal {
            journal.record("faulty");
        }
        tracing::debug!(message = %self.message, "Injecting fault");
        Err(ChainError::fault_msg(&self.message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use composable_chain_core::NoFacts;

    struct Job;

    impl Payload for Job {
        type Outcome = u8;
        type Fact = NoFacts;
    }

    #[test]
    fn test_journal_shared_between_clones() {
        let journal = Journal::new();
        let other = journal.clone();
        other.record("a");
        journal.record("b");

        assert_eq!(journal.entries(), vec!["a", "b"]);
        assert!(journal.contains("a"));
        assert_eq!(other.len(), 2);

        journal.clear();
        assert!(other.is_empty());
    }

    #[test]
    fn test_recording_gate_and_result() {
        let journal = Journal::new();
        let handler = Recording::new("r", &journal)
            .returning(HandlerResult::Skip)
            .rejecting();
        let mut request = Request::new(Job);

        assert!(!Handler::<Job>::can_handle(&handler, &request));
        assert_eq!(handler.handle(&mut request).unwrap(), HandlerResult::Handled);
        assert!(journal.is_empty());

        assert_eq!(handler.process(&mut request).unwrap(), HandlerResult::Skip);
        assert_eq!(journal.entries(), vec!["r"]);
    }

    #[test]
    fn test_fixed_sets_outcome() {
        let mut request = Request::new(Job);
        let result = Fixed::new(7, HandlerResult::Continue)
            .handle(&mut request)
            .unwrap();

        assert_eq!(result, HandlerResult::Continue);
        assert_eq!(request.result().unwrap(), &7);
    }

    #[test]
    fn test_faulty_fails_and_records() {
        let journal = Journal::new();
        let mut request = Request::new(Job);
        let error = Faulty::new("boom")
            .recorded(&journal)
            .handle(&mut request)
            .unwrap_err();

        assert_eq!(error.to_string(), "boom");
        assert_eq!(journal.entries(), vec!["faulty"]);
    }
}
