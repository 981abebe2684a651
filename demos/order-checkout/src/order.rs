//! Orders and the per-checkout context travelling through the pipeline.

use chrono::{DateTime, Utc};
use composable_chain_core::{Fallible, Payload};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Facts handlers signal to each other during one checkout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CheckoutFact {
    /// Stock was decremented for every order line
    InventoryReserved,
    /// A gateway declined the charge; later gateways may fail over
    PaymentDeclined,
    /// Name of the gateway that took the payment
    ChargedBy,
}

/// Customer placing the order
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    /// Display name
    pub name: String,
    /// Contact email, receives the confirmation
    pub email: String,
}

impl Customer {
    /// Create a customer
    #[must_use]
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

/// One order line
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    /// Product identifier, e.g. `PROD-001`
    pub product_id: String,
    /// Units ordered
    pub quantity: u32,
    /// Price per unit in cents
    pub unit_price_cents: u64,
}

impl OrderItem {
    /// Create an order line
    #[must_use]
    pub fn new(product_id: impl Into<String>, quantity: u32, unit_price_cents: u64) -> Self {
        Self {
            product_id: product_id.into(),
            quantity,
            unit_price_cents,
        }
    }

    /// Quantity × unit price, in cents
    #[must_use]
    pub fn line_total_cents(&self) -> u64 {
        u64::from(self.quantity) * self.unit_price_cents
    }
}

/// How the customer pays
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    /// Card payment
    CreditCard,
    /// `PayPal` account
    PayPal,
    /// Crypto wallet transfer
    Crypto,
}

/// Payment details; only the fields of the chosen method are filled in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentInfo {
    /// Chosen method
    pub method: PaymentMethod,
    /// Card number for [`PaymentMethod::CreditCard`]
    pub card_number: Option<String>,
    /// Account email for [`PaymentMethod::PayPal`]
    pub email: Option<String>,
    /// Sending wallet for [`PaymentMethod::Crypto`]
    pub wallet_address: Option<String>,
}

impl PaymentInfo {
    /// Pay by card
    #[must_use]
    pub fn card(number: impl Into<String>) -> Self {
        Self {
            method: PaymentMethod::CreditCard,
            card_number: Some(number.into()),
            email: None,
            wallet_address: None,
        }
    }

    /// Pay with a `PayPal` account
    #[must_use]
    pub fn paypal(email: impl Into<String>) -> Self {
        Self {
            method: PaymentMethod::PayPal,
            card_number: None,
            email: Some(email.into()),
            wallet_address: None,
        }
    }

    /// Pay from a crypto wallet
    #[must_use]
    pub fn crypto(wallet: impl Into<String>) -> Self {
        Self {
            method: PaymentMethod::Crypto,
            card_number: None,
            email: None,
            wallet_address: Some(wallet.into()),
        }
    }
}

/// A customer order
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Order {
    /// `ORD-` followed by 8 upper-case hex characters
    pub id: String,
    /// Missing when the storefront failed to attach one
    pub customer: Option<Customer>,
    /// Order lines
    pub items: Vec<OrderItem>,
    /// Payment details
    pub payment: PaymentInfo,
    /// Assigned by fulfillment
    pub shipment_id: Option<String>,
    /// Creation time
    pub placed_at: DateTime<Utc>,
}

impl Order {
    /// Create an order with a fresh id.
    #[must_use]
    pub fn new(customer: Option<Customer>, items: Vec<OrderItem>, payment: PaymentInfo) -> Self {
        Self {
            id: format!("ORD-{}", short_id(8)),
            customer,
            items,
            payment,
            shipment_id: None,
            placed_at: Utc::now(),
        }
    }

    /// Sum of all line totals, in cents
    #[must_use]
    pub fn total_cents(&self) -> u64 {
        self.items.iter().map(OrderItem::line_total_cents).sum()
    }
}

/// Upper-case hex prefix of a random UUID, at most 32 characters.
pub(crate) fn short_id(len: usize) -> String {
    let mut id = Uuid::new_v4().simple().to_string().to_uppercase();
    id.truncate(len);
    id
}

/// Amount in cents rendered as dollars, e.g. `$1,098.99`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Money(pub u64);

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dollars = (self.0 / 100).to_string();
        let mut grouped = String::with_capacity(dollars.len() + dollars.len() / 3);
        for (index, digit) in dollars.chars().enumerate() {
            if index > 0 && (dollars.len() - index) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(digit);
        }
        write!(f, "${grouped}.{:02}", self.0 % 100)
    }
}

/// The payload of one checkout run.
///
/// The result slot carries the payment outcome (`true` once a gateway
/// accepted the charge).
#[derive(Clone, Debug)]
pub struct OrderContext {
    /// The order being checked out
    pub order: Order,
    /// Cleared by the first recorded failure
    pub successful: bool,
    /// Every domain failure, in the order it was found
    pub errors: Vec<String>,
    /// Recipient of the confirmation, once sent
    pub notified_to: Option<String>,
}

impl OrderContext {
    /// Start a checkout for `order`
    #[must_use]
    pub const fn new(order: Order) -> Self {
        Self {
            order,
            successful: true,
            errors: Vec::new(),
            notified_to: None,
        }
    }

    /// Record a domain failure
    pub fn fail(&mut self, message: impl Into<String>) {
        self.successful = false;
        self.errors.push(message.into());
    }

    /// Summary of the run
    #[must_use]
    pub fn receipt(&self) -> CheckoutReceipt {
        CheckoutReceipt {
            order_id: self.order.id.clone(),
            successful: self.successful,
            total: Money(self.order.total_cents()).to_string(),
            shipment_id: self.order.shipment_id.clone(),
            notified_to: self.notified_to.clone(),
            errors: self.errors.clone(),
        }
    }
}

impl Payload for OrderContext {
    type Outcome = bool;
    type Fact = CheckoutFact;
}

impl Fallible for OrderContext {
    fn has_failed(&self) -> bool {
        !self.successful
    }
}

/// Serializable outcome of a checkout
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutReceipt {
    /// Order id
    pub order_id: String,
    /// Whether every stage succeeded
    pub successful: bool,
    /// Formatted order total
    pub total: String,
    /// Shipment id when fulfilled
    pub shipment_id: Option<String>,
    /// Confirmation recipient when notified
    pub notified_to: Option<String>,
    /// Domain failures
    pub errors: Vec<String>,
}
