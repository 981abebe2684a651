//! Purchase order intake.
//!
//! A two-member pipeline that checks a supplier purchase order against the
//! product catalogue and then registers it under a document code. Problems
//! are recorded on the order and stop the run; they are never raised as
//! errors.

use crate::order::{Money, short_id};
use composable_chain_core::prelude::*;
use std::collections::BTreeSet;

/// One line of a purchase order
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PurchaseOrderLine {
    /// Catalogue name of the product
    pub product_name: String,
    /// Units ordered
    pub quantity: u32,
    /// Price per unit in cents
    pub unit_price_cents: u64,
}

impl PurchaseOrderLine {
    /// Create a line
    pub fn new(product_name: impl Into<String>, quantity: u32, unit_price_cents: u64) -> Self {
        Self {
            product_name: product_name.into(),
            quantity,
            unit_price_cents,
        }
    }
}

/// A purchase order. The result slot carries the assigned document code.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PurchaseOrder {
    /// Document code, blank until registered
    pub doc_code: String,
    /// Ordered lines
    pub lines: Vec<PurchaseOrderLine>,
    /// Problems found during intake
    pub problems: Vec<String>,
}

impl PurchaseOrder {
    /// An unregistered order
    #[must_use]
    pub fn new(lines: Vec<PurchaseOrderLine>) -> Self {
        Self {
            lines,
            ..Self::default()
        }
    }

    /// Sum of every line in cents
    #[must_use]
    pub fn total_cents(&self) -> u64 {
        self.lines
            .iter()
            .map(|line| u64::from(line.quantity).saturating_mul(line.unit_price_cents))
            .fold(0, u64::saturating_add)
    }
}

impl Payload for PurchaseOrder {
    type Outcome = String;
    type Fact = NoFacts;
}

impl Fallible for PurchaseOrder {
    fn has_failed(&self) -> bool {
        !self.problems.is_empty()
    }
}

/// Checks an unregistered order has a positive total and only names
/// catalogue products.
///
/// Orders that already carry a document code end the run untouched.
#[derive(Debug, Clone)]
pub struct PurchaseOrderValidation {
    catalogue: BTreeSet<String>,
}

impl Default for PurchaseOrderValidation {
    fn default() -> Self {
        Self::new(["Prod1", "Prod2", "Prod3"])
    }
}

impl PurchaseOrderValidation {
    /// Validate against the given product names
    pub fn new<I, S>(catalogue: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            catalogue: catalogue.into_iter().map(Into::into).collect(),
        }
    }
}

impl Handler<PurchaseOrder> for PurchaseOrderValidation {
    fn name(&self) -> &str {
        "PurchaseOrderValidation"
    }

    fn process(&self, request: &mut Request<PurchaseOrder>) -> Result<HandlerResult> {
        let order = request.payload_mut();
        if !order.doc_code.trim().is_empty() {
            tracing::info!(doc_code = %order.doc_code, "Purchase order already registered");
            return Ok(HandlerResult::Handled);
        }

        if order.total_cents() == 0 {
            order.problems.push("Purchase order total must be positive.".to_string());
        }
        let unknown: Vec<String> = order
            .lines
            .iter()
            .filter(|line| !self.catalogue.contains(&line.product_name))
            .map(|line| format!("Unknown product: {}", line.product_name))
            .collect();
        order.problems.extend(unknown);

        if order.has_failed() {
            tracing::warn!(problems = order.problems.len(), "Purchase order rejected");
            return Ok(HandlerResult::Handled);
        }
        Ok(HandlerResult::Continue)
    }
}

/// Assigns a `PO-` document code to a validated order.
#[derive(Debug, Clone, Copy, Default)]
pub struct PurchaseOrderRegistration;

impl Handler<PurchaseOrder> for PurchaseOrderRegistration {
    fn name(&self) -> &str {
        "PurchaseOrderRegistration"
    }

    fn process(&self, request: &mut Request<PurchaseOrder>) -> Result<HandlerResult> {
        let code = format!("PO-{}", short_id(8));
        let order = request.payload_mut();
        order.doc_code.clone_from(&code);
        tracing::info!(
            doc_code = %code,
            total = %Money(order.total_cents()),
            "Purchase order registered"
        );
        request.set_result(code);
        Ok(HandlerResult::Handled)
    }
}

/// Validation followed by registration.
#[must_use]
pub fn purchase_order_chain(validation: PurchaseOrderValidation) -> Chain<PurchaseOrder> {
    Chain::with_config(ChainConfig::labelled("purchase-order"))
        .add_handler(validation)
        .add_handler(PurchaseOrderRegistration)
}
