//! Compensation protocol.
//!
//! Handlers that mutate state visible outside the request (reserving stock,
//! charging a card) can expose a reverse operation through [`Compensate`].
//! A [`Transaction`] decoration is built with direct references to those
//! handlers and calls them when the wrapped unit ends `Handled` with the
//! payload reporting failure.
//!
//! Compensation is applied after the fact at the application level; there is
//! no atomic commit or rollback underneath it.
//!
//! # Example
//!
//! ```
//! use composable_chain_core::prelude::*;
//! use std::sync::{Arc, Mutex};
//!
//! #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
//! enum SeatFact {
//!     Held,
//! }
//!
//! #[derive(Default)]
//! struct Booking {
//!     failed: bool,
//! }
//!
//! impl Payload for Booking {
//!     type Outcome = ();
//!     type Fact = SeatFact;
//! }
//!
//! impl Fallible for Booking {
//!     fn has_failed(&self) -> bool {
//!         self.failed
//!     }
//! }
//!
//! struct HoldSeat {
//!     free: Mutex<u32>,
//! }
//!
//! impl Handler<Booking> for HoldSeat {
//!     fn process(&self, request: &mut Request<Booking>) -> Result<HandlerResult> {
//!         if let Ok(mut free) = self.free.lock() {
//!             *free -= 1;
//!         }
//!         request.mark(SeatFact::Held);
//!         Ok(HandlerResult::Continue)
//!     }
//! }
//!
//! impl Compensate<Booking> for HoldSeat {
//!     fn compensate(&self, request: &mut Request<Booking>) -> Result<()> {
//!         if request.is_marked(SeatFact::Held) {
//!             if let Ok(mut free) = self.free.lock() {
//!                 *free += 1;
//!             }
//!             request.forget(SeatFact::Held);
//!         }
//!         Ok(())
//!     }
//! }
//!
//! struct Charge;
//!
//! impl Handler<Booking> for Charge {
//!     fn process(&self, request: &mut Request<Booking>) -> Result<HandlerResult> {
//!         request.payload_mut().failed = true;
//!         Ok(HandlerResult::Handled)
//!     }
//! }
//!
//! let hold = Arc::new(HoldSeat { free: Mutex::new(3) });
//! let ops = Chain::new().add_shared(Arc::clone(&hold)).add_handler(Charge);
//! let unit = ops
//!     .build()?
//!     .transactional([Arc::clone(&hold) as Arc<dyn Compensate<Booking>>]);
//!
//! let mut request = Request::new(Booking::default());
//! assert_eq!(unit.handle(&mut request)?, HandlerResult::Handled);
//! assert_eq!(*hold.free.lock().map_err(|_| ChainError::fault_msg("poisoned"))?, 3);
//! # Ok::<(), ChainError>(())
//! ```

use crate::composition::Decoration;
use crate::error::Result;
use crate::handler::{Handler, HandlerResult, short_type_name};
use crate::request::{Payload, Request};
use std::sync::Arc;

/// A reverse operation for a handler's externally visible side effect.
///
/// Implementations must check request metadata to see whether the forward
/// mutation actually happened and do nothing otherwise. After undoing, they
/// clear that marker so a repeated call is also a no-op.
pub trait Compensate<P: Payload>: Send + Sync {
    /// Display name, used in logs
    fn name(&self) -> &str {
        short_type_name(std::any::type_name::<Self>())
    }

    /// Undo the forward mutation recorded on `request`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the undo itself faults.
    fn compensate(&self, request: &mut Request<P>) -> Result<()>;
}

impl<P, C> Compensate<P> for Arc<C>
where
    P: Payload,
    C: Compensate<P> + ?Sized,
{
    fn name(&self) -> &str {
        Compensate::name(&**self)
    }

    fn compensate(&self, request: &mut Request<P>) -> Result<()> {
        (**self).compensate(request)
    }
}

/// Payloads carrying a domain failure flag.
pub trait Fallible {
    /// Whether an expected domain failure has been recorded
    fn has_failed(&self) -> bool;
}

/// Commits or compensates the unit it wraps.
///
/// After delegating, a `Handled` result with a failed payload triggers every
/// compensator, last registered first, and the unit reports `Handled`. Any
/// other outcome is a commit and the inner result passes through. Faults
/// from the inner unit propagate without compensation.
pub struct Transaction<P: Payload> {
    compensators: Vec<Arc<dyn Compensate<P>>>,
}

impl<P: Payload> Transaction<P> {
    /// Create a transaction with explicit compensators.
    pub fn new<I>(compensators: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn Compensate<P>>>,
    {
        Self {
            compensators: compensators.into_iter().collect(),
        }
    }

    /// Registered compensators in registration order
    #[must_use]
    pub fn compensators(&self) -> &[Arc<dyn Compensate<P>>] {
        &self.compensators
    }

    fn roll_back(&self, request: &mut Request<P>) -> Result<()> {
        tracing::warn!(
            compensators = self.compensators.len(),
            "Rollback initiated due to handler failure"
        );
        for compensator in self.compensators.iter().rev() {
            tracing::info!(compensator = Compensate::name(&**compensator), "Compensating");
            compensator.compensate(request)?;
        }
        Ok(())
    }
}

impl<P: Payload> std::fmt::Debug for Transaction<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field(
                "compensators",
                &self
                    .compensators
                    .iter()
                    .map(|c| Compensate::name(&**c))
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl<P> Decoration<P> for Transaction<P>
where
    P: Payload + Fallible,
{
    fn around(&self, request: &mut Request<P>, inner: &dyn Handler<P>) -> Result<HandlerResult> {
        tracing::info!(unit = inner.name(), "Begin transaction");
        let result = inner.process(request)?;

        if result.is_terminal() && request.payload().has_failed() {
            self.roll_back(request)?;
            return Ok(HandlerResult::Handled);
        }

        tracing::info!(unit = inner.name(), result = %result, "Commit transaction");
        Ok(result)
    }
}
