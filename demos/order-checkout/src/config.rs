//! Checkout configuration.

use std::time::Duration;

/// Settings for the checkout pipeline.
///
/// # Default Values
///
/// - `initial_stock`: `PROD-001` 10, `PROD-002` 50, `PROD-003` 20
/// - `declined_card_prefix`: `"9999"`
/// - `crypto_wallet`: `"BTC-Wallet-Address"`
/// - `card_delay`: 200ms
/// - `paypal_delay`: 250ms
/// - `fulfillment_delay`: 150ms
/// - `notification_delay`: 100ms
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutConfig {
    /// Stock levels the table starts with
    pub initial_stock: Vec<(String, u32)>,
    /// Card numbers starting with this prefix are declined
    pub declined_card_prefix: String,
    /// Merchant wallet crypto payments are sent to
    pub crypto_wallet: String,
    /// Simulated card authorisation time
    pub card_delay: Duration,
    /// Simulated `PayPal` round trip
    pub paypal_delay: Duration,
    /// Simulated shipment booking
    pub fulfillment_delay: Duration,
    /// Simulated email send
    pub notification_delay: Duration,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            initial_stock: vec![
                ("PROD-001".to_string(), 10),
                ("PROD-002".to_string(), 50),
                ("PROD-003".to_string(), 20),
            ],
            declined_card_prefix: "9999".to_string(),
            crypto_wallet: "BTC-Wallet-Address".to_string(),
            card_delay: Duration::from_millis(200),
            paypal_delay: Duration::from_millis(250),
            fulfillment_delay: Duration::from_millis(150),
            notification_delay: Duration::from_millis(100),
        }
    }
}

impl CheckoutConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> CheckoutConfigBuilder {
        CheckoutConfigBuilder {
            config: Self::default(),
        }
    }

    /// Default settings with every simulated delay set to zero.
    #[must_use]
    pub fn without_delays() -> Self {
        Self::builder().delays(Duration::ZERO).build()
    }
}

/// Builder for [`CheckoutConfig`].
#[derive(Debug, Clone)]
pub struct CheckoutConfigBuilder {
    config: CheckoutConfig,
}

impl CheckoutConfigBuilder {
    /// Replace the initial stock levels.
    #[must_use]
    pub fn stock<I, K>(mut self, levels: I) -> Self
    where
        I: IntoIterator<Item = (K, u32)>,
        K: Into<String>,
    {
        self.config.initial_stock = levels
            .into_iter()
            .map(|(product, level)| (product.into(), level))
            .collect();
        self
    }

    /// Set the declined card prefix.
    #[must_use]
    pub fn declined_card_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.declined_card_prefix = prefix.into();
        self
    }

    /// Set the merchant crypto wallet.
    #[must_use]
    pub fn crypto_wallet(mut self, wallet: impl Into<String>) -> Self {
        self.config.crypto_wallet = wallet.into();
        self
    }

    /// Set every simulated delay at once.
    #[must_use]
    pub fn delays(mut self, delay: Duration) -> Self {
        self.config.card_delay = delay;
        self.config.paypal_delay = delay;
        self.config.fulfillment_delay = delay;
        self.config.notification_delay = delay;
        self
    }

    /// Set the fulfillment delay.
    #[must_use]
    pub fn fulfillment_delay(mut self, delay: Duration) -> Self {
        self.config.fulfillment_delay = delay;
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> CheckoutConfig {
        self.config
    }
}
