//! Decorator composition.
//!
//! A [`Decoration`] describes behaviour placed around one inner handler. A
//! [`Decorated`] pairs a decoration with exactly one inner handler and is
//! itself a [`Handler`], so decorations nest:
//!
//! - **`decorate`**: wrap a handler in any decoration
//! - **[`HandlerExt`]**: fluent `.logged()`, `.timed()`, `.transformed()`,
//!   `.gated()` and `.transactional()` on any handler
//!
//! Nesting is stack-like. Wrapping `H` with `A` and then `B` runs
//! B-before, A-before, H, A-after, B-after.
//!
//! # Examples
//!
//! ```
//! use composable_chain_core::prelude::*;
//!
//! struct Upload {
//!     compressed: bool,
//!     sent_compressed: Option<bool>,
//! }
//!
//! impl Payload for Upload {
//!     type Outcome = ();
//!     type Fact = NoFacts;
//! }
//!
//! struct Ship;
//!
//! impl Handler<Upload> for Ship {
//!     fn process(&self, request: &mut Request<Upload>) -> Result<HandlerResult> {
//!         let compressed = request.payload().compressed;
//!         request.payload_mut().sent_compressed = Some(compressed);
//!         Ok(HandlerResult::Continue)
//!     }
//! }
//!
//! let handler = Ship
//!     .transformed("compression", |upload: &mut Upload| upload.compressed = true)
//!     .logged("upload")
//!     .timed();
//!
//! let mut request = Request::new(Upload { compressed: false, sent_compressed: None });
//! let _ = handler.handle(&mut request);
//! assert_eq!(request.payload().sent_compressed, Some(true));
//! ```

use crate::compensation::{Compensate, Fallible, Transaction};
use crate::decorators::{Gate, Logging, Timing, Transform};
use crate::error::Result;
use crate::handler::{Handler, HandlerResult, short_type_name};
use crate::request::{Payload, Request};
use std::sync::Arc;

/// Behaviour placed around a single inner handler.
///
/// The decorated unit's gate is [`Decoration::admits`], which forwards to the
/// inner handler's gate unless the decoration replaces it. Once admitted,
/// `around` decides what happens before and after delegating to the inner
/// handler's [`Handler::process`], so the gate is evaluated once per visit
/// and a rejection passes control along the enclosing chain exactly as it
/// would for the bare handler.
pub trait Decoration<P: Payload>: Send + Sync {
    /// Display name of the decoration, used in logs
    fn name(&self) -> &str {
        short_type_name(std::any::type_name::<Self>())
    }

    /// Gate of the decorated unit. Defaults to the inner handler's gate.
    fn admits(&self, request: &Request<P>, inner: &dyn Handler<P>) -> bool {
        inner.can_handle(request)
    }

    /// Run the decoration around `inner`, which has already been admitted.
    ///
    /// # Errors
    ///
    /// Propagates errors from the inner handler or from the decoration.
    fn around(&self, request: &mut Request<P>, inner: &dyn Handler<P>) -> Result<HandlerResult>;
}

/// A handler wrapped by exactly one decoration.
///
/// Created by [`decorate`] or the [`HandlerExt`] methods.
#[derive(Debug, Clone)]
pub struct Decorated<D, H> {
    decoration: D,
    inner: H,
}

impl<D, H> Decorated<D, H> {
    /// The wrapped handler
    pub const fn inner(&self) -> &H {
        &self.inner
    }

    /// The decoration
    pub const fn decoration(&self) -> &D {
        &self.decoration
    }

    /// Split into decoration and inner handler
    pub fn into_parts(self) -> (D, H) {
        (self.decoration, self.inner)
    }
}

impl<P, D, H> Handler<P> for Decorated<D, H>
where
    P: Payload,
    D: Decoration<P>,
    H: Handler<P>,
{
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn can_handle(&self, request: &Request<P>) -> bool {
        self.decoration.admits(request, &self.inner)
    }

    fn process(&self, request: &mut Request<P>) -> Result<HandlerResult> {
        self.decoration.around(request, &self.inner)
    }
}

/// Wrap `inner` in `decoration`.
pub const fn decorate<D, H>(decoration: D, inner: H) -> Decorated<D, H> {
    Decorated { decoration, inner }
}

/// Wrap `inner` in a [`Logging`] decoration.
pub fn logged<H>(inner: H, label: impl Into<String>) -> Decorated<Logging, H> {
    decorate(Logging::new(label), inner)
}

/// Wrap `inner` in a [`Timing`] decoration.
pub fn timed<H>(inner: H) -> Decorated<Timing, H> {
    decorate(Timing::default(), inner)
}

/// Wrap `inner` in a [`Transform`] decoration.
pub fn transformed<H, F>(inner: H, label: impl Into<String>, apply: F) -> Decorated<Transform<F>, H> {
    decorate(Transform::new(label, apply), inner)
}

/// Wrap `inner` in a [`Gate`] decoration.
pub const fn gated<H, F>(inner: H, admit: F) -> Decorated<Gate<F>, H> {
    decorate(Gate::new(admit), inner)
}

/// Wrap `inner` in a [`Transaction`] with explicit compensators.
pub fn transactional<P, H, I>(inner: H, compensators: I) -> Decorated<Transaction<P>, H>
where
    P: Payload + Fallible,
    I: IntoIterator<Item = Arc<dyn Compensate<P>>>,
{
    decorate(Transaction::new(compensators), inner)
}

/// Fluent decoration of any handler.
pub trait HandlerExt<P: Payload>: Handler<P> + Sized {
    /// See [`logged`].
    #[must_use]
    fn logged(self, label: impl Into<String>) -> Decorated<Logging, Self> {
        logged(self, label)
    }

    /// See [`timed`].
    #[must_use]
    fn timed(self) -> Decorated<Timing, Self> {
        timed(self)
    }

    /// See [`transformed`].
    #[must_use]
    fn transformed<F>(self, label: impl Into<String>, apply: F) -> Decorated<Transform<F>, Self>
    where
        F: Fn(&mut P) + Send + Sync,
    {
        transformed(self, label, apply)
    }

    /// See [`gated`].
    #[must_use]
    fn gated<F>(self, admit: F) -> Decorated<Gate<F>, Self>
    where
        F: Fn(&Request<P>) -> bool + Send + Sync,
    {
        gated(self, admit)
    }

    /// See [`transactional`].
    #[must_use]
    fn transactional<I>(self, compensators: I) -> Decorated<Transaction<P>, Self>
    where
        P: Fallible,
        I: IntoIterator<Item = Arc<dyn Compensate<P>>>,
    {
        transactional(self, compensators)
    }
}

impl<P: Payload, H: Handler<P>> HandlerExt<P> for H {}
