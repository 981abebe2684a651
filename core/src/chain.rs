//! Ordered handler chains and their traversal.
//!
//! A [`Chain`] keeps its members in insertion order. Every mutation rebuilds
//! an immutable snapshot of the member list, and traversal walks that snapshot
//! with an explicit position counter: the successor of position `i` is
//! position `i + 1`, so no handler ever stores a link to another.
//!
//! # Traversal
//!
//! For the handler at the current position:
//!
//! 1. If its gate rejects the request, move to the next position, or return
//!    [`HandlerResult::Handled`] when it is the last one.
//! 2. Otherwise run `process`. `Handled`, or being the last handler, ends the
//!    traversal with that result.
//! 3. `Continue` and `Skip` move to the next position.
//!
//! Errors from `process` end the traversal immediately and reach the caller
//! unchanged.
//!
//! # Example
//!
//! ```
//! use composable_chain_core::prelude::*;
//!
//! struct Ticket {
//!     trail: Vec<&'static str>,
//! }
//!
//! impl Payload for Ticket {
//!     type Outcome = ();
//!     type Fact = NoFacts;
//! }
//!
//! struct Triage;
//! struct Resolve;
//!
//! impl Handler<Ticket> for Triage {
//!     fn process(&self, request: &mut Request<Ticket>) -> Result<HandlerResult> {
//!         request.payload_mut().trail.push("triage");
//!         Ok(HandlerResult::Continue)
//!     }
//! }
//!
//! impl Handler<Ticket> for Resolve {
//!     fn process(&self, request: &mut Request<Ticket>) -> Result<HandlerResult> {
//!         request.payload_mut().trail.push("resolve");
//!         Ok(HandlerResult::Handled)
//!     }
//! }
//!
//! let chain = Chain::new().add_handler(Triage).add_handler(Resolve);
//! let mut request = Request::new(Ticket { trail: Vec::new() });
//! assert_eq!(chain.execute(&mut request).ok(), Some(HandlerResult::Handled));
//! assert_eq!(request.payload().trail, vec!["triage", "resolve"]);
//! ```

use crate::config::ChainConfig;
use crate::error::{ChainError, Result};
use crate::handler::{Handler, HandlerResult};
use crate::metrics;
use crate::request::{Payload, Request};
use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

/// Immutable, shareable view of a chain's members in order.
pub type Links<P> = Arc<[Arc<dyn Handler<P>>]>;

struct Entry<P: Payload> {
    handler: Arc<dyn Handler<P>>,
    kind: TypeId,
}

/// An ordered, mutable sequence of handlers with a single continuation path.
///
/// Configuration methods consume and return the chain so it can be assembled
/// fluently. Ordering is insertion order; there is no prioritisation.
pub struct Chain<P: Payload> {
    entries: Vec<Entry<P>>,
    links: Links<P>,
    config: Arc<ChainConfig>,
}

impl<P: Payload> Default for Chain<P> {
    fn default() -> Self {
        Self::with_config(ChainConfig::default())
    }
}

impl<P: Payload> fmt::Debug for Chain<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain")
            .field("label", &self.config.label)
            .field(
                "handlers",
                &self.links.iter().map(|h| h.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl<P: Payload> Chain<P> {
    /// Create an empty chain with the default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty chain with the given configuration
    #[must_use]
    pub fn with_config(config: ChainConfig) -> Self {
        Self {
            entries: Vec::new(),
            links: Arc::from(Vec::new()),
            config: Arc::new(config),
        }
    }

    /// The chain's configuration
    #[must_use]
    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    /// Append a handler.
    #[must_use]
    pub fn add_handler<H>(self, handler: H) -> Self
    where
        H: Handler<P> + 'static,
    {
        self.add_shared(Arc::new(handler))
    }

    /// Append a handler the caller keeps a reference to.
    ///
    /// Use this for handlers that are also addressed directly, for
    /// compensation or for [`remove_handler`](Self::remove_handler).
    #[must_use]
    pub fn add_shared<H>(mut self, handler: Arc<H>) -> Self
    where
        H: Handler<P> + 'static,
    {
        self.entries.push(Entry {
            handler,
            kind: TypeId::of::<H>(),
        });
        self.relink();
        self
    }

    /// Append several handlers of one type, relinking once.
    #[must_use]
    pub fn add_handlers<H, I>(mut self, handlers: I) -> Self
    where
        H: Handler<P> + 'static,
        I: IntoIterator<Item = H>,
    {
        self.entries
            .extend(handlers.into_iter().map(|handler| Entry {
                handler: Arc::new(handler) as Arc<dyn Handler<P>>,
                kind: TypeId::of::<H>(),
            }));
        self.relink();
        self
    }

    /// Remove the first member that is the very same instance as `handler`.
    #[must_use]
    pub fn remove_handler<H>(mut self, handler: &Arc<H>) -> Self
    where
        H: Handler<P> + ?Sized,
    {
        let target = Arc::as_ptr(handler).cast::<()>();
        if let Some(index) = self
            .entries
            .iter()
            .position(|entry| Arc::as_ptr(&entry.handler).cast::<()>() == target)
        {
            self.entries.remove(index);
        }
        self.relink();
        self
    }

    /// Remove every member whose concrete type is `H` (directly, or behind
    /// an `Arc`/`Box`).
    #[must_use]
    pub fn remove_kind<H>(mut self) -> Self
    where
        H: Handler<P> + 'static,
    {
        let kinds = [
            TypeId::of::<H>(),
            TypeId::of::<Arc<H>>(),
            TypeId::of::<Box<H>>(),
        ];
        self.entries.retain(|entry| !kinds.contains(&entry.kind));
        self.relink();
        self
    }

    /// Drop every member.
    #[must_use]
    pub fn clear(mut self) -> Self {
        self.entries.clear();
        self.relink();
        self
    }

    /// Snapshot of the members in traversal order.
    #[must_use]
    pub fn handlers(&self) -> &[Arc<dyn Handler<P>>] {
        &self.links
    }

    /// Number of members
    #[must_use]
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// Whether the chain has no members
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Materialise the chain as a single handler.
    ///
    /// The returned head traverses the members as they are now; later edits
    /// to this chain do not affect it.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::EmptyChain`] if the chain has no members.
    pub fn build(&self) -> Result<ChainHead<P>> {
        if self.links.is_empty() {
            return Err(ChainError::EmptyChain);
        }
        Ok(ChainHead {
            links: Arc::clone(&self.links),
            config: Arc::clone(&self.config),
        })
    }

    /// Run the request through the chain.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::EmptyChain`] if the chain has no members, or the
    /// first error raised by a handler.
    #[tracing::instrument(
        skip_all,
        name = "chain_execute",
        fields(chain = %self.config.label, handlers = self.links.len())
    )]
    pub fn execute(&self, request: &mut Request<P>) -> Result<HandlerResult> {
        if self.links.is_empty() {
            tracing::warn!("Refusing to execute an empty chain");
            return Err(ChainError::EmptyChain);
        }
        let result = traverse(&self.links, &self.config, request)?;
        tracing::debug!(result = %result, "Chain execution finished");
        if self.config.record_metrics {
            metrics::record_execution(&self.config.label, result);
        }
        Ok(result)
    }

    /// Build a request around `payload`, execute it and hand both back.
    ///
    /// # Errors
    ///
    /// Same as [`execute`](Self::execute).
    pub fn run(&self, payload: P) -> Result<Execution<P>> {
        let mut request = Request::new(payload);
        let result = self.execute(&mut request)?;
        Ok(Execution { result, request })
    }

    fn relink(&mut self) {
        self.links = self
            .entries
            .iter()
            .map(|entry| Arc::clone(&entry.handler))
            .collect();
    }
}

/// The terminal result of a run together with the request it processed.
pub struct Execution<P: Payload> {
    /// Terminal result
    pub result: HandlerResult,
    /// The request after every visited handler mutated it
    pub request: Request<P>,
}

impl<P> fmt::Debug for Execution<P>
where
    P: Payload + fmt::Debug,
    P::Outcome: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Execution")
            .field("result", &self.result)
            .field("request", &self.request)
            .finish()
    }
}

/// A built chain exposed as one handler, for wrapping by decorators or
/// nesting in another chain.
pub struct ChainHead<P: Payload> {
    links: Links<P>,
    config: Arc<ChainConfig>,
}

impl<P: Payload> Clone for ChainHead<P> {
    fn clone(&self) -> Self {
        Self {
            links: Arc::clone(&self.links),
            config: Arc::clone(&self.config),
        }
    }
}

impl<P: Payload> ChainHead<P> {
    /// Members the head traverses
    #[must_use]
    pub fn handlers(&self) -> &[Arc<dyn Handler<P>>] {
        &self.links
    }
}

impl<P: Payload> Handler<P> for ChainHead<P> {
    fn name(&self) -> &str {
        &self.config.label
    }

    fn process(&self, request: &mut Request<P>) -> Result<HandlerResult> {
        traverse(&self.links, &self.config, request)
    }
}

fn traverse<P: Payload>(
    links: &[Arc<dyn Handler<P>>],
    config: &ChainConfig,
    request: &mut Request<P>,
) -> Result<HandlerResult> {
    let mut position = 0;
    while let Some(handler) = links.get(position) {
        let has_next = position + 1 < links.len();

        if !handler.can_handle(request) {
            tracing::trace!(handler = handler.name(), position, "Gate rejected request");
            if config.record_metrics {
                metrics::record_skip(handler.name());
            }
            if has_next {
                position += 1;
                continue;
            }
            return Ok(HandlerResult::Handled);
        }

        let result = handler.process(request)?;
        if config.trace_visits {
            tracing::debug!(handler = handler.name(), position, result = %result, "Handler visited");
        }
        if config.record_metrics {
            metrics::record_visit(handler.name(), result);
        }

        if result.is_terminal() || !has_next {
            return Ok(result);
        }
        position += 1;
    }
    Err(ChainError::EmptyChain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::NoFacts;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct Trail {
        visits: Vec<String>,
        gate_checks: Vec<String>,
    }

    impl Payload for Trail {
        type Outcome = ();
        type Fact = NoFacts;
    }

    struct Step {
        label: &'static str,
        result: HandlerResult,
        admit: bool,
    }

    impl Step {
        fn new(label: &'static str, result: HandlerResult) -> Self {
            Self {
                label,
                result,
                admit: true,
            }
        }

        fn closed(label: &'static str) -> Self {
            Self {
                label,
                result: HandlerResult::Continue,
                admit: false,
            }
        }
    }

    impl Handler<Trail> for Step {
        fn name(&self) -> &str {
            self.label
        }

        fn can_handle(&self, _request: &Request<Trail>) -> bool {
            self.admit
        }

        fn process(&self, request: &mut Request<Trail>) -> Result<HandlerResult> {
            request.payload_mut().visits.push(self.label.to_string());
            Ok(self.result)
        }
    }

    struct CountingGate {
        checks: Mutex<u32>,
    }

    impl Handler<Trail> for CountingGate {
        fn can_handle(&self, request: &Request<Trail>) -> bool {
            if let Ok(mut checks) = self.checks.lock() {
                *checks += 1;
            }
            request.payload().gate_checks.is_empty()
        }

        fn process(&self, request: &mut Request<Trail>) -> Result<HandlerResult> {
            request.payload_mut().gate_checks.push("gate".to_string());
            Ok(HandlerResult::Continue)
        }
    }

    struct Explode;

    impl Handler<Trail> for Explode {
        fn process(&self, _request: &mut Request<Trail>) -> Result<HandlerResult> {
            Err(ChainError::fault_msg("boom"))
        }
    }

    fn visits(request: &Request<Trail>) -> Vec<&str> {
        request.payload().visits.iter().map(String::as_str).collect()
    }

    #[test]
    fn test_visits_in_insertion_order() {
        let chain = Chain::new()
            .add_handler(Step::new("a", HandlerResult::Continue))
            .add_handler(Step::new("b", HandlerResult::Skip))
            .add_handler(Step::new("c", HandlerResult::Continue));

        let mut request = Request::new(Trail::default());
        let result = chain.execute(&mut request);

        assert_eq!(result.ok(), Some(HandlerResult::Continue));
        assert_eq!(visits(&request), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_handled_stops_traversal() {
        let chain = Chain::new()
            .add_handler(Step::new("a", HandlerResult::Continue))
            .add_handler(Step::new("b", HandlerResult::Handled))
            .add_handler(Step::new("c", HandlerResult::Continue));

        let mut request = Request::new(Trail::default());
        let result = chain.execute(&mut request);

        assert_eq!(result.ok(), Some(HandlerResult::Handled));
        assert_eq!(visits(&request), vec!["a", "b"]);
    }

    #[test]
    fn test_rejected_gate_passes_to_next() {
        let chain = Chain::new()
            .add_handler(Step::closed("a"))
            .add_handler(Step::new("b", HandlerResult::Continue));

        let mut request = Request::new(Trail::default());
        let result = chain.execute(&mut request);

        assert_eq!(result.ok(), Some(HandlerResult::Continue));
        assert_eq!(visits(&request), vec!["b"]);
    }

    #[test]
    fn test_rejected_gate_on_last_is_handled() {
        let chain = Chain::new()
            .add_handler(Step::new("a", HandlerResult::Continue))
            .add_handler(Step::closed("b"));

        let mut request = Request::new(Trail::default());
        let result = chain.execute(&mut request);

        assert_eq!(result.ok(), Some(HandlerResult::Handled));
        assert_eq!(visits(&request), vec!["a"]);
    }

    #[test]
    fn test_gate_evaluated_once_per_visit() {
        let gate = Arc::new(CountingGate {
            checks: Mutex::new(0),
        });
        let chain = Chain::new()
            .add_shared(Arc::clone(&gate))
            .add_handler(Step::new("after", HandlerResult::Continue));

        let mut request = Request::new(Trail::default());
        let _ = chain.execute(&mut request);

        assert_eq!(gate.checks.lock().map(|c| *c).unwrap_or(0), 1);
    }

    #[test]
    fn test_empty_chain_fails() {
        let chain: Chain<Trail> = Chain::new();
        let mut request = Request::new(Trail::default());
        assert!(matches!(
            chain.execute(&mut request),
            Err(ChainError::EmptyChain)
        ));
        assert!(matches!(chain.build(), Err(ChainError::EmptyChain)));
    }

    #[test]
    fn test_fault_aborts_pipeline() {
        let chain = Chain::new()
            .add_handler(Step::new("a", HandlerResult::Continue))
            .add_handler(Explode)
            .add_handler(Step::new("c", HandlerResult::Continue));

        let mut request = Request::new(Trail::default());
        let err = chain.execute(&mut request);

        assert!(matches!(err, Err(ChainError::Fault(_))));
        assert_eq!(visits(&request), vec!["a"]);
    }

    #[test]
    fn test_remove_handler_relinks() {
        let middle = Arc::new(Step::new("b", HandlerResult::Handled));
        let chain = Chain::new()
            .add_handler(Step::new("a", HandlerResult::Continue))
            .add_shared(Arc::clone(&middle))
            .add_handler(Step::new("c", HandlerResult::Continue))
            .remove_handler(&middle);

        assert_eq!(chain.len(), 2);
        let mut request = Request::new(Trail::default());
        let _ = chain.execute(&mut request);
        assert_eq!(visits(&request), vec!["a", "c"]);
    }

    #[test]
    fn test_remove_kind() {
        let chain = Chain::new()
            .add_handler(Step::new("a", HandlerResult::Continue))
            .add_handler(Explode)
            .add_shared(Arc::new(Explode))
            .remove_kind::<Explode>();

        let names: Vec<&str> = chain.handlers().iter().map(|h| h.name()).collect();
        assert_eq!(names, vec!["a"]);
    }

    #[test]
    fn test_clear_empties_chain() {
        let chain = Chain::new()
            .add_handler(Step::new("a", HandlerResult::Continue))
            .clear();
        assert!(chain.is_empty());
        let mut request = Request::new(Trail::default());
        assert!(matches!(
            chain.execute(&mut request),
            Err(ChainError::EmptyChain)
        ));
    }

    #[test]
    fn test_built_head_is_a_snapshot() {
        let chain = Chain::with_config(ChainConfig::labelled("ops"))
            .add_handler(Step::new("a", HandlerResult::Continue))
            .add_handler(Step::new("b", HandlerResult::Continue));
        let head = chain.build();
        let chain = chain.clear();
        assert!(chain.is_empty());

        let Ok(head) = head else {
            panic!("build failed");
        };
        assert_eq!(head.name(), "ops");
        assert_eq!(head.handlers().len(), 2);

        let mut request = Request::new(Trail::default());
        let _ = head.handle(&mut request);
        assert_eq!(visits(&request), vec!["a", "b"]);
    }

    #[test]
    fn test_head_nests_in_outer_chain() {
        let inner = Chain::new()
            .add_handler(Step::new("inner-a", HandlerResult::Continue))
            .add_handler(Step::new("inner-b", HandlerResult::Continue))
            .build();
        let Ok(inner) = inner else {
            panic!("build failed");
        };
        let outer = Chain::new()
            .add_handler(Step::new("first", HandlerResult::Continue))
            .add_handler(inner)
            .add_handler(Step::new("last", HandlerResult::Handled));

        let Ok(execution) = outer.run(Trail::default()) else {
            panic!("run failed");
        };
        assert_eq!(execution.result, HandlerResult::Handled);
        assert_eq!(
            visits(&execution.request),
            vec!["first", "inner-a", "inner-b", "last"]
        );
    }

    #[test]
    fn test_add_handlers_in_order() {
        let chain = Chain::new().add_handlers([
            Step::new("a", HandlerResult::Continue),
            Step::new("b", HandlerResult::Continue),
        ]);
        let names: Vec<&str> = chain.handlers().iter().map(|h| h.name()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_execution_debug_shows_result_and_payload() {
        let execution = Chain::<Trail>::new()
            .add_handler(Step::new("only", HandlerResult::Handled))
            .run(Trail::default())
            .unwrap();

        let rendered = format!("{execution:?}");
        assert!(rendered.starts_with("Execution"));
        assert!(rendered.contains("Handled"));
        assert!(rendered.contains("only"));
    }
}
