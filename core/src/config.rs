//! Chain configuration.

/// Observability settings for a [`Chain`](crate::chain::Chain).
///
/// # Default Values
///
/// - `label`: `"chain"`
/// - `record_metrics`: `true`
/// - `trace_visits`: `true`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainConfig {
    /// Label attached to spans, log events and metric series
    pub label: String,
    /// Whether executions and visits are recorded through the `metrics` facade
    pub record_metrics: bool,
    /// Whether every handler visit emits a `debug` event
    pub trace_visits: bool,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            label: "chain".to_string(),
            record_metrics: true,
            trace_visits: true,
        }
    }
}

impl ChainConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub const fn builder() -> ChainConfigBuilder {
        ChainConfigBuilder {
            label: None,
            record_metrics: None,
            trace_visits: None,
        }
    }

    /// Default configuration with a custom label.
    #[must_use]
    pub fn labelled(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }
}

/// Builder for [`ChainConfig`].
#[derive(Debug, Clone)]
pub struct ChainConfigBuilder {
    label: Option<String>,
    record_metrics: Option<bool>,
    trace_visits: Option<bool>,
}

impl ChainConfigBuilder {
    /// Set the chain label.
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Enable or disable metric recording.
    #[must_use]
    pub const fn record_metrics(mut self, enabled: bool) -> Self {
        self.record_metrics = Some(enabled);
        self
    }

    /// Enable or disable per-visit debug events.
    #[must_use]
    pub const fn trace_visits(mut self, enabled: bool) -> Self {
        self.trace_visits = Some(enabled);
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> ChainConfig {
        let defaults = ChainConfig::default();
        ChainConfig {
            label: self.label.unwrap_or(defaults.label),
            record_metrics: self.record_metrics.unwrap_or(defaults.record_metrics),
            trace_visits: self.trace_visits.unwrap_or(defaults.trace_visits),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        assert_eq!(ChainConfig::builder().build(), ChainConfig::default());
    }

    #[test]
    fn test_builder_overrides() {
        let config = ChainConfig::builder()
            .label("payments")
            .record_metrics(false)
            .build();
        assert_eq!(config.label, "payments");
        assert!(!config.record_metrics);
        assert!(config.trace_visits);
    }

    #[test]
    fn test_labelled() {
        let config = ChainConfig::labelled("orders");
        assert_eq!(config.label, "orders");
        assert!(config.record_metrics);
    }
}
