//! Built-in decorations for cross-cutting concerns.
//!
//! - [`Logging`]: trace before and after delegation
//! - [`Timing`]: wall-clock duration of the delegated call
//! - [`Transform`]: mutate the payload before delegating
//! - [`Gate`]: replace the inner handler's gate with a predicate
//!
//! The transactional decoration lives in [`compensation`](crate::compensation).

use crate::composition::Decoration;
use crate::error::Result;
use crate::handler::{Handler, HandlerResult};
use crate::metrics;
use crate::request::{Payload, Request};
use std::time::Instant;

/// Emits a trace before and after delegation, tagged with a label and the
/// terminal result.
#[derive(Debug, Clone, Default)]
pub struct Logging {
    label: String,
}

impl Logging {
    /// Create a logging decoration. An empty label is omitted from events.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }

    /// The label attached to events
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl<P: Payload> Decoration<P> for Logging {
    fn around(&self, request: &mut Request<P>, inner: &dyn Handler<P>) -> Result<HandlerResult> {
        tracing::info!(label = %self.label, handler = inner.name(), "Before executing");
        let result = inner.process(request)?;
        tracing::info!(label = %self.label, handler = inner.name(), result = %result, "After executing");
        Ok(result)
    }
}

/// Measures the wall-clock duration of the delegated call.
///
/// The duration is logged and recorded as a histogram under `metric`
/// (default [`HANDLER_DURATION`](crate::metrics::HANDLER_DURATION)). Faults
/// are timed too and then propagated.
#[derive(Debug, Clone)]
pub struct Timing {
    metric: String,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            metric: metrics::HANDLER_DURATION.to_string(),
        }
    }
}

impl Timing {
    /// Record into a custom histogram.
    #[must_use]
    pub fn with_metric(metric: impl Into<String>) -> Self {
        Self {
            metric: metric.into(),
        }
    }
}

impl<P: Payload> Decoration<P> for Timing {
    fn around(&self, request: &mut Request<P>, inner: &dyn Handler<P>) -> Result<HandlerResult> {
        let started = Instant::now();
        let outcome = inner.process(request);
        let elapsed = started.elapsed();

        tracing::info!(
            handler = inner.name(),
            elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            "Executed in {:?}",
            elapsed
        );
        metrics::record_duration(&self.metric, inner.name(), elapsed);
        outcome
    }
}

/// Mutates the payload before delegating, so the inner handler acts on the
/// new state.
pub struct Transform<F> {
    label: String,
    apply: F,
}

impl<F> Transform<F> {
    /// Create a transform; `label` names it in logs.
    pub fn new(label: impl Into<String>, apply: F) -> Self {
        Self {
            label: label.into(),
            apply,
        }
    }
}

impl<F> std::fmt::Debug for Transform<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transform")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

impl<P, F> Decoration<P> for Transform<F>
where
    P: Payload,
    F: Fn(&mut P) + Send + Sync,
{
    fn name(&self) -> &str {
        &self.label
    }

    fn around(&self, request: &mut Request<P>, inner: &dyn Handler<P>) -> Result<HandlerResult> {
        tracing::debug!(transform = %self.label, handler = inner.name(), "Transforming payload");
        (self.apply)(request.payload_mut());
        inner.process(request)
    }
}

/// Replaces the inner handler's gate with a pure predicate over the request.
///
/// The inner gate is not consulted; when the predicate admits, the inner
/// handler's `process` runs directly.
pub struct Gate<F> {
    admit: F,
}

impl<F> Gate<F> {
    /// Create a gate from a predicate
    pub const fn new(admit: F) -> Self {
        Self { admit }
    }
}

impl<F> std::fmt::Debug for Gate<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gate").finish_non_exhaustive()
    }
}

impl<P, F> Decoration<P> for Gate<F>
where
    P: Payload,
    F: Fn(&Request<P>) -> bool + Send + Sync,
{
    fn admits(&self, request: &Request<P>, _inner: &dyn Handler<P>) -> bool {
        (self.admit)(request)
    }

    fn around(&self, request: &mut Request<P>, inner: &dyn Handler<P>) -> Result<HandlerResult> {
        inner.process(request)
    }
}
