//! Payment stage: a sub-chain of gateways with fallback.
//!
//! The stage seeds the result slot with `false` before running its gateways.
//! Each gateway's gate looks at the chosen method; `PayPal` also admits as a
//! failover once an earlier gateway declined and left the slot at `false`.
//! When the gateways are done and the slot still reads `false`, the checkout
//! fails.

use crate::config::CheckoutConfig;
use crate::order::{CheckoutFact, Money, OrderContext, PaymentMethod};
use composable_chain_core::prelude::*;
use std::thread;
use std::time::Duration;

/// Failure recorded when no gateway accepted the charge
pub const ALL_GATEWAYS_FAILED: &str = "All payment gateways failed.";

/// An empty payment stage; add gateways with [`SubChain::with_member`].
#[must_use]
pub fn payment_stage() -> SubChain<OrderContext> {
    SubChain::new("PaymentProcessing")
        .prepare_with(|request: &mut Request<OrderContext>| {
            tracing::info!(
                total = %Money(request.payload().order.total_cents()),
                "Starting payment processing"
            );
            request.set_result(false);
        })
        .resolve_with(|request: &mut Request<OrderContext>, _inner| {
            if *request.result()? {
                tracing::info!("Payment successful");
                return Ok(HandlerResult::Continue);
            }
            request.payload_mut().fail(ALL_GATEWAYS_FAILED);
            tracing::warn!("Payment failed");
            Ok(HandlerResult::Handled)
        })
}

/// Payment stage with the card, `PayPal` and crypto gateways, in that order.
#[must_use]
pub fn standard_payment_stage(config: &CheckoutConfig) -> SubChain<OrderContext> {
    payment_stage()
        .with_member(CreditCardGateway::new(
            config.declined_card_prefix.clone(),
            config.card_delay,
        ))
        .with_member(PayPalGateway::new(config.paypal_delay))
        .with_member(CryptoGateway::new(config.crypto_wallet.clone()))
}

fn method(request: &Request<OrderContext>) -> PaymentMethod {
    request.payload().order.payment.method
}

fn charged(request: &mut Request<OrderContext>, gateway: &str) -> HandlerResult {
    request.set_result(true);
    request.annotate(CheckoutFact::ChargedBy, gateway);
    HandlerResult::Handled
}

/// Card gateway; declines card numbers with a configured prefix.
#[derive(Debug, Clone)]
pub struct CreditCardGateway {
    declined_prefix: String,
    delay: Duration,
}

impl CreditCardGateway {
    /// Decline numbers starting with `declined_prefix`
    #[must_use]
    pub fn new(declined_prefix: impl Into<String>, delay: Duration) -> Self {
        Self {
            declined_prefix: declined_prefix.into(),
            delay,
        }
    }
}

impl Handler<OrderContext> for CreditCardGateway {
    fn name(&self) -> &str {
        "CreditCardGateway"
    }

    fn can_handle(&self, request: &Request<OrderContext>) -> bool {
        method(request) == PaymentMethod::CreditCard
    }

    fn process(&self, request: &mut Request<OrderContext>) -> Result<HandlerResult> {
        tracing::info!("Trying credit card");
        let declined = request
            .payload()
            .order
            .payment
            .card_number
            .as_deref()
            .is_none_or(|number| number.starts_with(&self.declined_prefix));

        if declined {
            tracing::warn!("Card declined");
            request.set_result(false);
            request.mark(CheckoutFact::PaymentDeclined);
            return Ok(HandlerResult::Continue);
        }

        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
        tracing::info!("Card payment approved");
        Ok(charged(request, "credit-card"))
    }
}

/// `PayPal` gateway; primary for `PayPal` orders, failover for declined ones.
///
/// Failover needs both a `false` result slot and the
/// [`CheckoutFact::PaymentDeclined`] marker set by the card gateway. A `false`
/// slot alone is not enough: the stage seeds `false` before any gateway runs,
/// so a crypto order that no gateway charged would otherwise be billed
/// through `PayPal`.
#[derive(Debug, Clone, Default)]
pub struct PayPalGateway {
    delay: Duration,
}

impl PayPalGateway {
    /// Charge with `delay` per round trip
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Handler<OrderContext> for PayPalGateway {
    fn name(&self) -> &str {
        "PayPalGateway"
    }

    fn can_handle(&self, request: &Request<OrderContext>) -> bool {
        let primary = method(request) == PaymentMethod::PayPal;
        let failover = request.prior_outcome() == Some(&false)
            && request.is_marked(CheckoutFact::PaymentDeclined);
        primary || failover
    }

    fn process(&self, request: &mut Request<OrderContext>) -> Result<HandlerResult> {
        tracing::info!("Trying PayPal");
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
        tracing::info!("PayPal payment successful");
        Ok(charged(request, "paypal"))
    }
}

/// Crypto gateway; asks the customer to send funds to the merchant wallet.
#[derive(Debug, Clone)]
pub struct CryptoGateway {
    wallet: String,
}

impl CryptoGateway {
    /// Receive payments at `wallet`
    #[must_use]
    pub fn new(wallet: impl Into<String>) -> Self {
        Self {
            wallet: wallet.into(),
        }
    }
}

impl Handler<OrderContext> for CryptoGateway {
    fn name(&self) -> &str {
        "CryptoGateway"
    }

    fn can_handle(&self, request: &Request<OrderContext>) -> bool {
        method(request) == PaymentMethod::Crypto
    }

    fn process(&self, request: &mut Request<OrderContext>) -> Result<HandlerResult> {
        tracing::info!(wallet = %self.wallet, "Trying crypto, awaiting transfer");
        Ok(charged(request, "crypto"))
    }
}
