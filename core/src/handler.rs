//! The processing unit of a chain.
//!
//! A [`Handler`] has a gating predicate ([`Handler::can_handle`]) and a
//! processing operation ([`Handler::process`]). It does not know its
//! successor: continuation belongs to the enclosing
//! [`Chain`](crate::chain::Chain), which walks its members by position.

use crate::error::Result;
use crate::request::{Payload, Request};
use std::fmt;
use std::sync::Arc;

/// Outcome of one handler visit, driving traversal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HandlerResult {
    /// Stop the pipeline
    Handled,
    /// Proceed to the next handler
    Continue,
    /// Proceed to the next handler; reported separately from `Continue`
    Skip,
}

impl HandlerResult {
    /// Whether this result stops traversal
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Handled)
    }

    /// Whether traversal proceeds to the next handler
    #[must_use]
    pub const fn advances(self) -> bool {
        !self.is_terminal()
    }

    /// Stable lowercase label, used for log fields and metric labels
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Handled => "handled",
            Self::Continue => "continue",
            Self::Skip => "skip",
        }
    }
}

impl fmt::Display for HandlerResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Handled => "Handled",
            Self::Continue => "Continue",
            Self::Skip => "Skip",
        };
        f.write_str(label)
    }
}

/// A unit of request processing.
///
/// Implement [`process`](Handler::process); override
/// [`can_handle`](Handler::can_handle) to gate the handler on the request
/// (static payload attributes, the current result slot, metadata).
///
/// Errors returned from `process` are faults: they propagate unchanged to the
/// caller of `execute` and abort the pipeline. Expected domain failures are
/// recorded on the payload and reported with [`HandlerResult::Handled`].
///
/// # Example
///
/// ```
/// use composable_chain_core::handler::{Handler, HandlerResult};
/// use composable_chain_core::request::{NoFacts, Payload, Request};
/// use composable_chain_core::Result;
///
/// struct Greeting {
///     name: String,
/// }
///
/// impl Payload for Greeting {
///     type Outcome = String;
///     type Fact = NoFacts;
/// }
///
/// struct Greet;
///
/// impl Handler<Greeting> for Greet {
///     fn can_handle(&self, request: &Request<Greeting>) -> bool {
///         !request.payload().name.is_empty()
///     }
///
///     fn process(&self, request: &mut Request<Greeting>) -> Result<HandlerResult> {
///         let line = format!("hello {}", request.payload().name);
///         request.set_result(line);
///         Ok(HandlerResult::Handled)
///     }
/// }
///
/// let mut request = Request::new(Greeting { name: "ada".to_string() });
/// assert_eq!(Greet.handle(&mut request).ok(), Some(HandlerResult::Handled));
/// assert_eq!(request.result().ok().map(String::as_str), Some("hello ada"));
/// ```
pub trait Handler<P: Payload>: Send + Sync {
    /// Stable display name, defaulting to the short type name.
    fn name(&self) -> &str {
        short_type_name(std::any::type_name::<Self>())
    }

    /// Gate evaluated exactly once per visit, before `process`.
    fn can_handle(&self, _request: &Request<P>) -> bool {
        true
    }

    /// Do the unit of work.
    ///
    /// # Errors
    ///
    /// Returns an error on an unexpected fault or a programming error such as
    /// reading an unset result slot.
    fn process(&self, request: &mut Request<P>) -> Result<HandlerResult>;

    /// Visit this handler on its own, with no continuation.
    ///
    /// A rejected gate with nothing after it is a terminal pass-through and
    /// yields [`HandlerResult::Handled`].
    ///
    /// # Errors
    ///
    /// Propagates whatever `process` returns.
    fn handle(&self, request: &mut Request<P>) -> Result<HandlerResult> {
        if !self.can_handle(request) {
            tracing::trace!(handler = self.name(), "Gate rejected request, passing through");
            return Ok(HandlerResult::Handled);
        }
        self.process(request)
    }
}

impl<P, H> Handler<P> for Arc<H>
where
    P: Payload,
    H: Handler<P> + ?Sized,
{
    fn name(&self) -> &str {
        (**self).name()
    }

    fn can_handle(&self, request: &Request<P>) -> bool {
        (**self).can_handle(request)
    }

    fn process(&self, request: &mut Request<P>) -> Result<HandlerResult> {
        (**self).process(request)
    }

    fn handle(&self, request: &mut Request<P>) -> Result<HandlerResult> {
        (**self).handle(request)
    }
}

impl<P, H> Handler<P> for Box<H>
where
    P: Payload,
    H: Handler<P> + ?Sized,
{
    fn name(&self) -> &str {
        (**self).name()
    }

    fn can_handle(&self, request: &Request<P>) -> bool {
        (**self).can_handle(request)
    }

    fn process(&self, request: &mut Request<P>) -> Result<HandlerResult> {
        (**self).process(request)
    }

    fn handle(&self, request: &mut Request<P>) -> Result<HandlerResult> {
        (**self).handle(request)
    }
}

/// `a::b::Thing<c::D>` → `Thing`
pub(crate) fn short_type_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChainError;
    use crate::request::NoFacts;

    struct Counter {
        hits: u32,
        enabled: bool,
    }

    impl Payload for Counter {
        type Outcome = u32;
        type Fact = NoFacts;
    }

    struct Bump;

    impl Handler<Counter> for Bump {
        fn can_handle(&self, request: &Request<Counter>) -> bool {
            request.payload().enabled
        }

        fn process(&self, request: &mut Request<Counter>) -> Result<HandlerResult> {
            request.payload_mut().hits += 1;
            Ok(HandlerResult::Continue)
        }
    }

    struct Broken;

    impl Handler<Counter> for Broken {
        fn process(&self, _request: &mut Request<Counter>) -> Result<HandlerResult> {
            Err(ChainError::fault_msg("broken handler"))
        }
    }

    #[test]
    fn test_default_name_is_short_type_name() {
        assert_eq!(Bump.name(), "Bump");
        assert_eq!(short_type_name("a::b::Wrapper<c::Inner>"), "Wrapper");
        assert_eq!(short_type_name("Plain"), "Plain");
    }

    #[test]
    fn test_handle_runs_process_when_admitted() {
        let mut request = Request::new(Counter { hits: 0, enabled: true });
        let result = Bump.handle(&mut request);
        assert_eq!(result.ok(), Some(HandlerResult::Continue));
        assert_eq!(request.payload().hits, 1);
    }

    #[test]
    fn test_rejected_gate_is_terminal_pass_through() {
        let mut request = Request::new(Counter { hits: 0, enabled: false });
        let result = Bump.handle(&mut request);
        assert_eq!(result.ok(), Some(HandlerResult::Handled));
        assert_eq!(request.payload().hits, 0);
    }

    #[test]
    fn test_fault_propagates_from_handle() {
        let mut request = Request::new(Counter { hits: 0, enabled: true });
        let err = Broken.handle(&mut request);
        assert!(matches!(err, Err(ChainError::Fault(_))));
    }

    #[test]
    fn test_smart_pointers_delegate() {
        let shared: Arc<dyn Handler<Counter>> = Arc::new(Bump);
        let boxed: Box<dyn Handler<Counter>> = Box::new(Bump);
        assert_eq!(shared.name(), "Bump");
        assert_eq!(boxed.name(), "Bump");

        let mut request = Request::new(Counter { hits: 0, enabled: true });
        let _ = shared.handle(&mut request);
        let _ = boxed.handle(&mut request);
        assert_eq!(request.payload().hits, 2);
    }

    #[test]
    fn test_result_labels() {
        assert!(HandlerResult::Handled.is_terminal());
        assert!(HandlerResult::Skip.advances());
        assert_eq!(HandlerResult::Continue.as_str(), "continue");
        assert_eq!(HandlerResult::Skip.to_string(), "Skip");
    }
}
