//! Hierarchical composition.
//!
//! A [`SubChain`] owns a private [`Chain`] and exposes it to its owner as one
//! handler. Trees of chains are built by nesting sub-chains.
//!
//! Fallback between members is expressed only through gates: a member that
//! should run when an earlier attempt failed admits on the prior outcome in
//! the result slot. There is no retry primitive.

use crate::chain::Chain;
use crate::config::ChainConfig;
use crate::error::Result;
use crate::handler::{Handler, HandlerResult};
use crate::request::{Payload, Request};
use std::sync::Arc;

type Prepare<P> = Box<dyn Fn(&mut Request<P>) + Send + Sync>;
type Resolve<P> = Box<dyn Fn(&mut Request<P>, HandlerResult) -> Result<HandlerResult> + Send + Sync>;

/// A handler delegating its processing to a private chain.
///
/// # Example
///
/// ```
/// use composable_chain_core::prelude::*;
///
/// struct Charge {
///     method: &'static str,
/// }
///
/// impl Payload for Charge {
///     type Outcome = bool;
///     type Fact = NoFacts;
/// }
///
/// struct Card;
/// struct Wallet;
///
/// impl Handler<Charge> for Card {
///     fn can_handle(&self, request: &Request<Charge>) -> bool {
///         request.payload().method == "card"
///     }
///
///     fn process(&self, request: &mut Request<Charge>) -> Result<HandlerResult> {
///         request.set_result(false);
///         Ok(HandlerResult::Continue)
///     }
/// }
///
/// impl Handler<Charge> for Wallet {
///     fn can_handle(&self, request: &Request<Charge>) -> bool {
///         request.prior_outcome() == Some(&false)
///     }
///
///     fn process(&self, request: &mut Request<Charge>) -> Result<HandlerResult> {
///         request.set_result(true);
///         Ok(HandlerResult::Handled)
///     }
/// }
///
/// let payments = SubChain::new("payments")
///     .with_member(Card)
///     .with_member(Wallet)
///     .resolve_with(|_request, _inner| Ok(HandlerResult::Continue));
///
/// let mut request = Request::new(Charge { method: "card" });
/// assert_eq!(payments.handle(&mut request)?, HandlerResult::Continue);
/// assert_eq!(request.result()?, &true);
/// # Ok::<(), ChainError>(())
/// ```
pub struct SubChain<P: Payload> {
    name: String,
    chain: Chain<P>,
    prepare: Option<Prepare<P>>,
    resolve: Option<Resolve<P>>,
}

impl<P: Payload> SubChain<P> {
    /// Create an empty sub-chain. `name` labels the unit and its inner chain.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            chain: Chain::with_config(ChainConfig::labelled(name.clone())),
            name,
            prepare: None,
            resolve: None,
        }
    }

    /// Create a sub-chain around an already assembled chain.
    #[must_use]
    pub fn from_chain(name: impl Into<String>, chain: Chain<P>) -> Self {
        Self {
            name: name.into(),
            chain,
            prepare: None,
            resolve: None,
        }
    }

    /// Append a member.
    #[must_use]
    pub fn with_member<H>(self, handler: H) -> Self
    where
        H: Handler<P> + 'static,
    {
        Self {
            chain: self.chain.add_handler(handler),
            ..self
        }
    }

    /// Append a member the caller keeps a reference to.
    #[must_use]
    pub fn with_shared<H>(self, handler: Arc<H>) -> Self
    where
        H: Handler<P> + 'static,
    {
        Self {
            chain: self.chain.add_shared(handler),
            ..self
        }
    }

    /// Run `prepare` on the request before the inner chain, e.g. to seed the
    /// result slot.
    #[must_use]
    pub fn prepare_with<F>(self, prepare: F) -> Self
    where
        F: Fn(&mut Request<P>) + Send + Sync + 'static,
    {
        Self {
            prepare: Some(Box::new(prepare)),
            ..self
        }
    }

    /// Map the inner chain's result to this unit's result. Without a
    /// resolver the inner result is returned as is.
    #[must_use]
    pub fn resolve_with<F>(self, resolve: F) -> Self
    where
        F: Fn(&mut Request<P>, HandlerResult) -> Result<HandlerResult> + Send + Sync + 'static,
    {
        Self {
            resolve: Some(Box::new(resolve)),
            ..self
        }
    }

    /// The private chain
    #[must_use]
    pub const fn chain(&self) -> &Chain<P> {
        &self.chain
    }

    /// Members of the private chain in order
    #[must_use]
    pub fn members(&self) -> &[Arc<dyn Handler<P>>] {
        self.chain.handlers()
    }
}

impl<P: Payload> std::fmt::Debug for SubChain<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubChain")
            .field("name", &self.name)
            .field("chain", &self.chain)
            .finish_non_exhaustive()
    }
}

impl<P: Payload> Handler<P> for SubChain<P> {
    fn name(&self) -> &str {
        &self.name
    }

    fn process(&self, request: &mut Request<P>) -> Result<HandlerResult> {
        if let Some(prepare) = &self.prepare {
            prepare(request);
        }
        let inner = self.chain.execute(request)?;
        tracing::debug!(sub_chain = %self.name, inner = %inner, "Sub-chain finished");
        match &self.resolve {
            Some(resolve) => resolve(request, inner),
            None => Ok(inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChainError;
    use crate::request::NoFacts;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Method {
        Primary,
        Secondary,
    }

    struct Payment {
        method: Method,
        primary_declines: bool,
        attempts: Vec<&'static str>,
        failed: bool,
    }

    impl Payment {
        fn new(method: Method, primary_declines: bool) -> Self {
            Self {
                method,
                primary_declines,
                attempts: Vec::new(),
                failed: false,
            }
        }
    }

    impl Payload for Payment {
        type Outcome = bool;
        type Fact = NoFacts;
    }

    struct PrimaryGateway;

    impl Handler<Payment> for PrimaryGateway {
        fn can_handle(&self, request: &Request<Payment>) -> bool {
            request.payload().method == Method::Primary
        }

        fn process(&self, request: &mut Request<Payment>) -> Result<HandlerResult> {
            request.payload_mut().attempts.push("primary");
            if request.payload().primary_declines {
                request.set_result(false);
                return Ok(HandlerResult::Continue);
            }
            request.set_result(true);
            Ok(HandlerResult::Handled)
        }
    }

    struct SecondaryGateway;

    impl Handler<Payment> for SecondaryGateway {
        fn can_handle(&self, request: &Request<Payment>) -> bool {
            request.payload().method == Method::Secondary || request.prior_outcome() == Some(&false)
        }

        fn process(&self, request: &mut Request<Payment>) -> Result<HandlerResult> {
            request.payload_mut().attempts.push("secondary");
            request.set_result(true);
            Ok(HandlerResult::Handled)
        }
    }

    fn payment_stage() -> SubChain<Payment> {
        SubChain::new("payment")
            .with_member(PrimaryGateway)
            .with_member(SecondaryGateway)
            .prepare_with(|request| request.set_result(false))
            .resolve_with(|request, _inner| {
                if *request.result()? {
                    Ok(HandlerResult::Continue)
                } else {
                    request.payload_mut().failed = true;
                    Ok(HandlerResult::Handled)
                }
            })
    }

    #[test]
    fn test_fallback_after_decline() {
        let mut request = Request::new(Payment::new(Method::Primary, true));
        let result = payment_stage().handle(&mut request).unwrap();

        assert_eq!(result, HandlerResult::Continue);
        assert_eq!(request.payload().attempts, vec!["primary", "secondary"]);
        assert_eq!(request.result().unwrap(), &true);
    }

    #[test]
    fn test_primary_success_skips_fallback() {
        let mut request = Request::new(Payment::new(Method::Primary, false));
        let result = payment_stage().handle(&mut request).unwrap();

        assert_eq!(result, HandlerResult::Continue);
        assert_eq!(request.payload().attempts, vec!["primary"]);
    }

    #[test]
    fn test_secondary_as_primary_method() {
        let mut request = Request::new(Payment::new(Method::Secondary, false));
        let result = payment_stage().handle(&mut request).unwrap();

        assert_eq!(result, HandlerResult::Continue);
        assert_eq!(request.payload().attempts, vec!["secondary"]);
    }

    #[test]
    fn test_exhausted_members_resolve_to_failure() {
        let stage = SubChain::new("payment")
            .with_member(PrimaryGateway)
            .prepare_with(|request| request.set_result(false))
            .resolve_with(|request, _inner| {
                if *request.result()? {
                    return Ok(HandlerResult::Continue);
                }
                request.payload_mut().failed = true;
                Ok(HandlerResult::Handled)
            });

        let mut request = Request::new(Payment::new(Method::Primary, true));
        let result = stage.handle(&mut request).unwrap();

        assert_eq!(result, HandlerResult::Handled);
        assert!(request.payload().failed);
    }

    #[test]
    fn test_empty_sub_chain_fails() {
        let stage: SubChain<Payment> = SubChain::new("nothing");
        let mut request = Request::new(Payment::new(Method::Primary, false));
        assert!(matches!(
            stage.handle(&mut request),
            Err(ChainError::EmptyChain)
        ));
    }

    #[test]
    fn test_passes_inner_result_without_resolver() {
        let stage = SubChain::new("plain").with_member(PrimaryGateway);
        let mut request = Request::new(Payment::new(Method::Primary, false));
        assert_eq!(stage.handle(&mut request).unwrap(), HandlerResult::Handled);
        assert_eq!(stage.name(), "plain");
        assert_eq!(stage.members().len(), 1);
    }
}
