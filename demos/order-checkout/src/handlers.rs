//! Checkout stages.

use crate::order::{CheckoutFact, OrderContext, short_id};
use crate::stock::StockTable;
use composable_chain_core::prelude::*;
use std::thread;
use std::time::Duration;

fn simulate(delay: Duration) {
    if !delay.is_zero() {
        thread::sleep(delay);
    }
}

//
// ===== Validation =====
//

/// Checks the order is complete, collecting every problem before stopping.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationHandler;

impl Handler<OrderContext> for ValidationHandler {
    fn name(&self) -> &str {
        "OrderValidation"
    }

    fn process(&self, request: &mut Request<OrderContext>) -> Result<HandlerResult> {
        let context = request.payload_mut();
        tracing::info!(order_id = %context.order.id, "Validating order");

        let customer_problem = match &context.order.customer {
            None => Some("Customer information is missing.".to_string()),
            Some(customer) if !customer.email.contains('@') => {
                Some(format!("Invalid customer email: {}", customer.email))
            }
            Some(_) => None,
        };
        if let Some(problem) = customer_problem {
            context.fail(problem);
        }
        if context.order.items.is_empty() {
            context.fail("Order must contain at least one item.");
        }

        if !context.successful {
            tracing::warn!(errors = context.errors.len(), "Validation failed");
            return Ok(HandlerResult::Handled);
        }
        tracing::info!("Validation passed");
        Ok(HandlerResult::Continue)
    }
}

//
// ===== Inventory =====
//

/// Reserves stock for every order line; compensable.
#[derive(Debug, Clone)]
pub struct InventoryHandler {
    stock: StockTable,
}

impl InventoryHandler {
    /// Reserve against `stock`
    #[must_use]
    pub const fn new(stock: StockTable) -> Self {
        Self { stock }
    }

    /// The table reservations are made against
    #[must_use]
    pub const fn stock(&self) -> &StockTable {
        &self.stock
    }
}

impl Handler<OrderContext> for InventoryHandler {
    fn name(&self) -> &str {
        "InventoryCheck"
    }

    fn process(&self, request: &mut Request<OrderContext>) -> Result<HandlerResult> {
        tracing::info!("Checking inventory");
        let context = request.payload_mut();

        if let Err(unavailable) = self.stock.reserve(&context.order.items) {
            for product_id in unavailable {
                context.fail(format!(
                    "Product '{product_id}' is out of stock or does not exist."
                ));
            }
            tracing::warn!("Inventory check failed");
            return Ok(HandlerResult::Handled);
        }

        request.mark(CheckoutFact::InventoryReserved);
        tracing::info!("Inventory confirmed and reserved");
        Ok(HandlerResult::Continue)
    }
}

impl Compensate<OrderContext> for InventoryHandler {
    fn name(&self) -> &str {
        "InventoryCheck"
    }

    fn compensate(&self, request: &mut Request<OrderContext>) -> Result<()> {
        if !request.is_marked(CheckoutFact::InventoryReserved) {
            tracing::debug!("No reservation to revert");
            return Ok(());
        }
        tracing::info!("Reverting inventory reservation");
        self.stock.release(&request.payload().order.items);
        request.forget(CheckoutFact::InventoryReserved);
        Ok(())
    }
}

//
// ===== Fulfillment =====
//

/// Books the shipment.
#[derive(Debug, Clone, Default)]
pub struct FulfillmentHandler {
    delay: Duration,
}

impl FulfillmentHandler {
    /// Book shipments, taking `delay` per booking
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Handler<OrderContext> for FulfillmentHandler {
    fn name(&self) -> &str {
        "OrderFulfillment"
    }

    fn process(&self, request: &mut Request<OrderContext>) -> Result<HandlerResult> {
        tracing::info!("Preparing for fulfillment");
        simulate(self.delay);

        let shipment_id = format!("SHP-{}", short_id(12));
        tracing::info!(shipment_id = %shipment_id, "Shipment created");
        request.payload_mut().order.shipment_id = Some(shipment_id);
        Ok(HandlerResult::Continue)
    }
}

//
// ===== Notification =====
//

/// Sends the confirmation email for successful checkouts.
#[derive(Debug, Clone, Default)]
pub struct NotificationHandler {
    delay: Duration,
}

impl NotificationHandler {
    /// Send confirmations, taking `delay` per email
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Handler<OrderContext> for NotificationHandler {
    fn name(&self) -> &str {
        "Notification"
    }

    fn process(&self, request: &mut Request<OrderContext>) -> Result<HandlerResult> {
        let context = request.payload_mut();
        if !context.successful {
            return Ok(HandlerResult::Handled);
        }
        let Some(email) = context.order.customer.as_ref().map(|c| c.email.clone()) else {
            return Ok(HandlerResult::Handled);
        };

        tracing::info!(to = %email, "Sending confirmation");
        simulate(self.delay);
        context.notified_to = Some(email);
        tracing::info!("Notification sent");
        Ok(HandlerResult::Handled)
    }
}
