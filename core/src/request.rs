//! The unit of work flowing through a chain.
//!
//! A [`Request`] owns the payload, a single typed result slot and a metadata
//! bag keyed by a closed set of facts. It is created per invocation and
//! dropped when the caller is done with it.

use crate::error::{ChainError, Result};
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

/// Key type for request metadata.
///
/// Each pipeline declares its own closed enumeration of facts that handlers
/// may signal to each other within one run. Any `Copy + Eq + Hash` type
/// qualifies; a fieldless enum is the intended shape.
pub trait MetadataKey: Copy + Eq + Hash + Debug + Send + Sync + 'static {}

impl<K> MetadataKey for K where K: Copy + Eq + Hash + Debug + Send + Sync + 'static {}

/// Metadata key type for pipelines that never signal through metadata.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NoFacts {}

/// Associates a payload type with its result slot and metadata key types.
///
/// # Example
///
/// ```
/// use composable_chain_core::request::{Payload, Request};
///
/// #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
/// enum BackupFact {
///     Uploaded,
/// }
///
/// struct Backup {
///     path: String,
/// }
///
/// impl Payload for Backup {
///     type Outcome = String;
///     type Fact = BackupFact;
/// }
///
/// let mut request = Request::new(Backup { path: "/var/db".to_string() });
/// request.mark(BackupFact::Uploaded);
/// assert!(request.is_marked(BackupFact::Uploaded));
/// ```
pub trait Payload: 'static {
    /// Value type of the result slot
    type Outcome: 'static;

    /// Closed set of metadata keys
    type Fact: MetadataKey;
}

/// A metadata value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MetadataValue {
    /// Boolean marker
    Flag(bool),
    /// Integer counter or amount
    Count(i64),
    /// Free-form text
    Text(String),
}

impl MetadataValue {
    /// Returns the flag value, if this is a flag.
    #[must_use]
    pub const fn as_flag(&self) -> Option<bool> {
        match self {
            Self::Flag(flag) => Some(*flag),
            _ => None,
        }
    }

    /// Returns the count value, if this is a count.
    #[must_use]
    pub const fn as_count(&self) -> Option<i64> {
        match self {
            Self::Count(count) => Some(*count),
            _ => None,
        }
    }

    /// Returns the text value, if this is text.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        Self::Count(value)
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Fact-keyed metadata bag. Insertion order is irrelevant.
#[derive(Clone, Debug)]
pub struct Metadata<K: MetadataKey> {
    entries: HashMap<K, MetadataValue>,
}

impl<K: MetadataKey> Default for Metadata<K> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<K: MetadataKey> Metadata<K> {
    /// Create an empty metadata bag
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a value, returning the previous one.
    pub fn insert(&mut self, key: K, value: impl Into<MetadataValue>) -> Option<MetadataValue> {
        self.entries.insert(key, value.into())
    }

    /// Get a value.
    #[must_use]
    pub fn get(&self, key: K) -> Option<&MetadataValue> {
        self.entries.get(&key)
    }

    /// Remove a value, returning it.
    pub fn remove(&mut self, key: K) -> Option<MetadataValue> {
        self.entries.remove(&key)
    }

    /// Whether a value exists for the key.
    #[must_use]
    pub fn contains(&self, key: K) -> bool {
        self.entries.contains_key(&key)
    }

    /// `true` only when the key holds `Flag(true)`.
    #[must_use]
    pub fn flag(&self, key: K) -> bool {
        self.get(key).and_then(MetadataValue::as_flag).unwrap_or(false)
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the bag is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// A request travelling through a chain.
///
/// The result slot is single-valued and last-write-wins. Reading it with
/// [`Request::result`] before any handler set it is a programming error and
/// fails with [`ChainError::ResultNotSet`]; fallback gates that need to peek
/// without failing use [`Request::prior_outcome`].
#[derive(Debug)]
pub struct Request<P: Payload> {
    payload: P,
    outcome: Option<P::Outcome>,
    metadata: Metadata<P::Fact>,
}

impl<P: Payload> Request<P> {
    /// Create a request with an empty result slot and no metadata
    #[must_use]
    pub fn new(payload: P) -> Self {
        Self {
            payload,
            outcome: None,
            metadata: Metadata::new(),
        }
    }

    /// Create a request with pre-populated metadata
    #[must_use]
    pub const fn with_metadata(payload: P, metadata: Metadata<P::Fact>) -> Self {
        Self {
            payload,
            outcome: None,
            metadata,
        }
    }

    /// Borrow the payload
    #[must_use]
    pub const fn payload(&self) -> &P {
        &self.payload
    }

    /// Mutably borrow the payload
    pub fn payload_mut(&mut self) -> &mut P {
        &mut self.payload
    }

    /// Consume the request, returning the payload
    #[must_use]
    pub fn into_payload(self) -> P {
        self.payload
    }

    /// Write the result slot. The last write wins.
    pub fn set_result(&mut self, outcome: P::Outcome) {
        self.outcome = Some(outcome);
    }

    /// Read the result slot.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::ResultNotSet`] if no handler has written it.
    pub fn result(&self) -> Result<&P::Outcome> {
        self.outcome.as_ref().ok_or(ChainError::ResultNotSet)
    }

    /// Peek at the result slot without failing when it is unset.
    #[must_use]
    pub const fn prior_outcome(&self) -> Option<&P::Outcome> {
        self.outcome.as_ref()
    }

    /// Take the result out of the slot, leaving it unset.
    pub fn take_result(&mut self) -> Option<P::Outcome> {
        self.outcome.take()
    }

    /// Whether the result slot has been written
    #[must_use]
    pub const fn has_result(&self) -> bool {
        self.outcome.is_some()
    }

    /// Borrow the metadata bag
    #[must_use]
    pub const fn metadata(&self) -> &Metadata<P::Fact> {
        &self.metadata
    }

    /// Mutably borrow the metadata bag
    pub fn metadata_mut(&mut self) -> &mut Metadata<P::Fact> {
        &mut self.metadata
    }

    /// Record `fact = true`.
    pub fn mark(&mut self, fact: P::Fact) {
        self.metadata.insert(fact, true);
    }

    /// Whether `fact` is recorded as `true`.
    #[must_use]
    pub fn is_marked(&self, fact: P::Fact) -> bool {
        self.metadata.flag(fact)
    }

    /// Record an arbitrary value for `fact`.
    pub fn annotate(&mut self, fact: P::Fact, value: impl Into<MetadataValue>) {
        self.metadata.insert(fact, value);
    }

    /// Read the value recorded for `fact`.
    #[must_use]
    pub fn fact(&self, fact: P::Fact) -> Option<&MetadataValue> {
        self.metadata.get(fact)
    }

    /// Remove whatever is recorded for `fact`.
    pub fn forget(&mut self, fact: P::Fact) -> Option<MetadataValue> {
        self.metadata.remove(fact)
    }
}
