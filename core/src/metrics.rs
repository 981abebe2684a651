//! Metric names and recording helpers.
//!
//! Everything goes through the `metrics` facade; nothing is exported unless
//! the application installs a recorder.

use crate::handler::HandlerResult;
use metrics::{Unit, counter, describe_counter, describe_histogram, histogram};
use std::time::Duration;

/// Counter of chain executions, labelled by chain and terminal result
pub const CHAIN_EXECUTIONS: &str = "chain_executions_total";

/// Counter of handler visits that ran `process`, labelled by handler and result
pub const HANDLER_VISITS: &str = "chain_handler_visits_total";

/// Counter of visits where the gate rejected the request
pub const HANDLER_SKIPPED: &str = "chain_handler_skipped_total";

/// Histogram of decorated handler durations
pub const HANDLER_DURATION: &str = "chain_handler_duration_seconds";

/// Register descriptions for every metric this crate emits.
pub fn describe_metrics() {
    describe_counter!(CHAIN_EXECUTIONS, Unit::Count, "Chain executions by terminal result");
    describe_counter!(HANDLER_VISITS, Unit::Count, "Handler visits by result");
    describe_counter!(HANDLER_SKIPPED, Unit::Count, "Handler visits rejected by the gate");
    describe_histogram!(
        HANDLER_DURATION,
        Unit::Seconds,
        "Wall-clock duration of timed handlers"
    );
}

pub(crate) fn record_execution(chain: &str, result: HandlerResult) {
    counter!(CHAIN_EXECUTIONS, "chain" => chain.to_string(), "result" => result.as_str())
        .increment(1);
}

pub(crate) fn record_visit(handler: &str, result: HandlerResult) {
    counter!(HANDLER_VISITS, "handler" => handler.to_string(), "result" => result.as_str())
        .increment(1);
}

pub(crate) fn record_skip(handler: &str) {
    counter!(HANDLER_SKIPPED, "handler" => handler.to_string()).increment(1);
}

pub(crate) fn record_duration(metric: &str, handler: &str, elapsed: Duration) {
    histogram!(metric.to_string(), "handler" => handler.to_string())
        .record(elapsed.as_secs_f64());
}
